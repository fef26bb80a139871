use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_PAGES_DIR: &str = "pages-dir";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_MAX_UPLOAD_MB: &str = "max-upload-mb";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Public origin of the portal (CORS, OAuth redirect URI, cookie Secure flag)")
                .env("CAMPUS_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_PAGES_DIR)
                .long(ARG_PAGES_DIR)
                .help("Directory with the built page bundle served behind the route guard")
                .env("CAMPUS_PAGES_DIR")
                .default_value("./public")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("CAMPUS_SESSION_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_MAX_UPLOAD_MB)
                .long(ARG_MAX_UPLOAD_MB)
                .help("Request body limit for multipart upload routes, in MiB")
                .env("CAMPUS_MAX_UPLOAD_MB")
                .default_value("500")
                .value_parser(clap::value_parser!(usize)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub pages_dir: PathBuf,
    pub session_ttl_seconds: i64,
    pub max_upload_mb: usize,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_FRONTEND_BASE_URL}"))?;
        let pages_dir = matches
            .get_one::<PathBuf>(ARG_PAGES_DIR)
            .cloned()
            .unwrap_or_else(|| PathBuf::from("./public"));
        Ok(Self {
            frontend_base_url,
            pages_dir,
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(2_592_000),
            max_upload_mb: matches
                .get_one::<usize>(ARG_MAX_UPLOAD_MB)
                .copied()
                .unwrap_or(500),
        })
    }
}
