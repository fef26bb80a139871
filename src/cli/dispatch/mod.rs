//! Maps validated CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{backend, gateway, google};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let backend_opts = backend::Options::parse(matches)?;
    let gateway_opts = gateway::Options::parse(matches)?;
    let google = google::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        api_url: backend_opts.api_url,
        ws_url: backend_opts.ws_url,
        frontend_base_url: gateway_opts.frontend_base_url,
        pages_dir: gateway_opts.pages_dir,
        request_timeout_seconds: backend_opts.request_timeout_seconds,
        session_ttl_seconds: gateway_opts.session_ttl_seconds,
        max_upload_mb: gateway_opts.max_upload_mb,
        google,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch(vars: [(&str, Option<&str>); 2]) -> Result<Action> {
        temp_env::with_vars(vars, || {
            let matches = crate::cli::commands::new().get_matches_from(vec!["campus-gateway"]);
            handler(&matches)
        })
    }

    #[test]
    fn google_is_optional() -> Result<()> {
        let Action::Server(args) =
            dispatch([("GOOGLE_CLIENT_ID", None), ("GOOGLE_CLIENT_SECRET", None)])?;
        assert!(args.google.is_none());
        assert_eq!(args.port, 8080);
        Ok(())
    }

    #[test]
    fn google_pair_enables_oauth() -> Result<()> {
        let Action::Server(args) = dispatch([
            ("GOOGLE_CLIENT_ID", Some("client")),
            ("GOOGLE_CLIENT_SECRET", Some("secret")),
        ])?;
        assert_eq!(
            args.google.as_ref().map(|google| google.client_id.as_str()),
            Some("client")
        );
        Ok(())
    }

    #[test]
    fn lone_google_client_id_is_rejected() {
        let result = dispatch([
            ("GOOGLE_CLIENT_ID", Some("client")),
            ("GOOGLE_CLIENT_SECRET", None),
        ]);
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(
                err.to_string()
                    .contains("missing required argument: --google-client-secret")
            );
        }
    }

    #[test]
    fn lone_google_client_secret_is_rejected() {
        let result = dispatch([
            ("GOOGLE_CLIENT_ID", None),
            ("GOOGLE_CLIENT_SECRET", Some("secret")),
        ]);
        assert!(result.is_err());
    }
}
