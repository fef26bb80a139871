//! Log formatting and optional OTLP span export.

use anyhow::{Context, Result, anyhow};
use base64ct::{Base64, Encoding};
use once_cell::sync::OnceCell;
use opentelemetry::{
    KeyValue, global, propagation::TextMapCompositePropagator, trace::TracerProvider as _,
};
use opentelemetry_otlp::{Compression, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::{SdkTracerProvider, Tracer},
};
use std::{env::var, time::Duration};
use tonic::{
    metadata::{Ascii, Binary, MetadataKey, MetadataMap, MetadataValue},
    transport::ClientTlsConfig,
};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};
use ulid::Ulid;

const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Exporter settings read from the standard `OTEL_*` variables.
#[derive(Debug, Default, PartialEq, Eq)]
struct OtlpSettings {
    endpoint: String,
    headers: Vec<(String, String)>,
    instance_id: Option<String>,
}

impl OtlpSettings {
    fn from_env() -> Self {
        if let Ok(protocol) = var("OTEL_EXPORTER_OTLP_PROTOCOL")
            && protocol != "grpc"
        {
            debug!("OTEL_EXPORTER_OTLP_PROTOCOL='{protocol}' ignored, exporting over gRPC");
        }
        Self {
            endpoint: with_scheme(
                var("OTEL_EXPORTER_OTLP_ENDPOINT")
                    .unwrap_or_else(|_| DEFAULT_OTLP_ENDPOINT.to_string()),
            ),
            headers: var("OTEL_EXPORTER_OTLP_HEADERS")
                .map(|raw| header_pairs(&raw))
                .unwrap_or_default(),
            instance_id: var("OTEL_SERVICE_INSTANCE_ID").ok(),
        }
    }

    /// Host to verify when the collector is reached over TLS.
    fn tls_domain(&self) -> Option<&str> {
        let authority = self.endpoint.strip_prefix("https://")?.split('/').next()?;
        authority.split(':').next().filter(|host| !host.is_empty())
    }
}

/// `key=value,key=value`; entries without `=` are skipped.
fn header_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// gRPC metadata; keys ending in `-bin` carry base64 values.
fn metadata(headers: &[(String, String)]) -> Result<MetadataMap> {
    let mut map = MetadataMap::with_capacity(headers.len());
    for (key, value) in headers {
        let key = key.to_ascii_lowercase();
        if key.ends_with("-bin") {
            let bytes = Base64::decode_vec(value)
                .map_err(|e| anyhow!("failed to base64-decode value for key {key}: {e}"))?;
            let name = MetadataKey::<Binary>::from_bytes(key.as_bytes())
                .map_err(|e| anyhow!("invalid binary metadata key {key}: {e}"))?;
            map.insert_bin(name, MetadataValue::from_bytes(&bytes));
        } else {
            let name = MetadataKey::<Ascii>::from_bytes(key.as_bytes())
                .map_err(|e| anyhow!("invalid metadata key {key}: {e}"))?;
            let value: MetadataValue<Ascii> = value
                .parse()
                .map_err(|e| anyhow!("invalid metadata value for key {key}: {e}"))?;
            map.insert(name, value);
        }
    }
    Ok(map)
}

/// Collectors given as bare `host:port` are assumed to speak TLS.
fn with_scheme(endpoint: String) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint
    } else {
        format!("https://{}", endpoint.trim_end_matches('/'))
    }
}

fn init_tracer(settings: &OtlpSettings) -> Result<Tracer> {
    let mut exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.endpoint)
        .with_compression(Compression::Gzip)
        .with_timeout(Duration::from_secs(3));

    if let Some(domain) = settings.tls_domain() {
        exporter = exporter.with_tls_config(
            ClientTlsConfig::new()
                .domain_name(domain.to_string())
                .with_native_roots(),
        );
    }
    if !settings.headers.is_empty() {
        exporter = exporter.with_metadata(metadata(&settings.headers)?);
    }

    let instance_id = settings
        .instance_id
        .clone()
        .unwrap_or_else(|| Ulid::new().to_string());

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter.build().context("Failed to build OTLP exporter")?)
        .with_resource(
            Resource::builder_empty()
                .with_attributes(vec![
                    KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                    KeyValue::new("service.instance.id", instance_id),
                ])
                .build(),
        )
        .build();

    let _ = TRACER_PROVIDER.set(provider.clone());
    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    Ok(provider.tracer(env!("CARGO_PKG_NAME")))
}

/// Install the global subscriber. Spans are exported only when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// # Errors
///
/// Returns an error if tracer or subscriber initialization fails
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .pretty();

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.unwrap_or(Level::ERROR).into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("opentelemetry_sdk=warn".parse()?);

    if var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = init_tracer(&OtlpSettings::from_env())?;
        let subscriber = Registry::default()
            .with(fmt_layer)
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        tracing::subscriber::set_global_default(Registry::default().with(fmt_layer).with(filter))?;
    }

    Ok(())
}

/// Flush and stop the span exporter, if one was started.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        debug!("shutting down tracer provider");
        let _ = provider.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_pairs_skip_malformed_entries() {
        assert!(header_pairs("").is_empty());
        assert_eq!(
            header_pairs("a = 1 ,broken, b=2"),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn metadata_accepts_ascii_and_binary() -> Result<()> {
        let headers = vec![
            ("Authorization".to_string(), "Bearer abc".to_string()),
            ("trace-bin".to_string(), "YmluYXJ5IGRhdGE=".to_string()),
        ];
        assert_eq!(metadata(&headers)?.len(), 2);
        Ok(())
    }

    #[test]
    fn metadata_rejects_bad_base64() {
        let headers = vec![("trace-bin".to_string(), "not base64!!".to_string())];
        let result = metadata(&headers);
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("failed to base64-decode"));
        }
    }

    #[test]
    fn bare_endpoint_defaults_to_https() {
        assert_eq!(with_scheme("otel:4317/".to_string()), "https://otel:4317");
        assert_eq!(
            with_scheme("http://localhost:4317".to_string()),
            "http://localhost:4317"
        );
    }

    #[test]
    fn tls_domain_only_for_https() {
        let mut settings = OtlpSettings {
            endpoint: "https://collector.campus.edu:4317/v1".to_string(),
            ..OtlpSettings::default()
        };
        assert_eq!(settings.tls_domain(), Some("collector.campus.edu"));
        settings.endpoint = DEFAULT_OTLP_ENDPOINT.to_string();
        assert_eq!(settings.tls_domain(), None);
    }

    #[test]
    fn settings_from_env() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", Some("collector:4317")),
                ("OTEL_EXPORTER_OTLP_HEADERS", Some("x-team=campus")),
                ("OTEL_SERVICE_INSTANCE_ID", None),
                ("OTEL_EXPORTER_OTLP_PROTOCOL", None),
            ],
            || {
                let settings = OtlpSettings::from_env();
                assert_eq!(settings.endpoint, "https://collector:4317");
                assert_eq!(
                    settings.headers,
                    vec![("x-team".to_string(), "campus".to_string())]
                );
                assert!(settings.instance_id.is_none());
            },
        );
    }

    #[test]
    fn shutdown_without_provider_is_noop() {
        shutdown_tracer();
    }
}
