pub mod backend;
pub mod gateway;
pub mod google;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("campus-gateway")
        .about("Session gateway for the Campus Genius portal")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("CAMPUS_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = backend::with_args(command);
    let command = gateway::with_args(command);
    let command = google::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "campus-gateway");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Session gateway for the Campus Genius portal".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("CAMPUS_PORT", None::<&str>),
                ("CAMPUS_API_URL", None),
                ("CAMPUS_PAGES_DIR", None),
                ("CAMPUS_MAX_UPLOAD_MB", None),
                ("CAMPUS_SESSION_TTL_SECONDS", None),
            ],
            || {
                let matches = new().get_matches_from(vec!["campus-gateway"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(8080));
                assert_eq!(
                    matches
                        .get_one::<String>(backend::ARG_API_URL)
                        .map(String::as_str),
                    Some("http://127.0.0.1:8000/api")
                );
                assert_eq!(
                    matches.get_one::<PathBuf>(gateway::ARG_PAGES_DIR),
                    Some(&PathBuf::from("./public"))
                );
                assert_eq!(
                    matches.get_one::<usize>(gateway::ARG_MAX_UPLOAD_MB).copied(),
                    Some(500)
                );
                assert_eq!(
                    matches
                        .get_one::<i64>(gateway::ARG_SESSION_TTL_SECONDS)
                        .copied(),
                    Some(2_592_000)
                );
            },
        );
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("CAMPUS_PORT", Some("9090")),
                ("CAMPUS_API_URL", Some("https://api.campus.edu/api")),
            ],
            || {
                let matches = new().get_matches_from(vec!["campus-gateway"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(9090));
                assert_eq!(
                    matches
                        .get_one::<String>(backend::ARG_API_URL)
                        .map(String::as_str),
                    Some("https://api.campus.edu/api")
                );
            },
        );
    }

    #[test]
    fn test_named_log_level() {
        temp_env::with_vars([("CAMPUS_LOG_LEVEL", None::<&str>)], || {
            let matches = new().get_matches_from(vec!["campus-gateway", "-vv"]);
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(2)
            );
        });
    }
}
