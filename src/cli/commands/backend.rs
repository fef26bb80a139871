use clap::{Arg, ArgMatches, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_WS_URL: &str = "ws-url";
pub const ARG_REQUEST_TIMEOUT_SECONDS: &str = "request-timeout-seconds";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Backend API base URL; the auth root is this URL without its trailing /api")
                .env("CAMPUS_API_URL")
                .default_value("http://127.0.0.1:8000/api"),
        )
        .arg(
            Arg::new(ARG_WS_URL)
                .long(ARG_WS_URL)
                .help("WebSocket base URL published to the portal")
                .env("CAMPUS_WS_URL")
                .default_value("ws://127.0.0.1:8000/ws"),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT_SECONDS)
                .long(ARG_REQUEST_TIMEOUT_SECONDS)
                .help("Timeout for calls to the backend and Google")
                .env("CAMPUS_REQUEST_TIMEOUT_SECONDS")
                .default_value("20")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub api_url: String,
    pub ws_url: String,
    pub request_timeout_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let api_url = matches
            .get_one::<String>(ARG_API_URL)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_API_URL}"))?;
        let ws_url = matches
            .get_one::<String>(ARG_WS_URL)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_WS_URL}"))?;
        let request_timeout_seconds = matches
            .get_one::<u64>(ARG_REQUEST_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(20);
        Ok(Self {
            api_url,
            ws_url,
            request_timeout_seconds,
        })
    }
}
