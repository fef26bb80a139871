use crate::cli::actions::server::GoogleCredentials;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_GOOGLE_CLIENT_ID: &str = "google-client-id";
pub const ARG_GOOGLE_CLIENT_SECRET: &str = "google-client-secret";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_ID)
                .long(ARG_GOOGLE_CLIENT_ID)
                .help("Google OAuth client id; enables Google sign-in together with the secret")
                .env("GOOGLE_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_SECRET)
                .long(ARG_GOOGLE_CLIENT_SECRET)
                .help("Google OAuth client secret")
                .env("GOOGLE_CLIENT_SECRET")
                .hide_env_values(true),
        )
}

/// Both credentials or neither; a lone id or secret is a configuration error.
///
/// # Errors
/// Returns an error when only one of the pair is set.
pub fn parse(matches: &ArgMatches) -> anyhow::Result<Option<GoogleCredentials>> {
    let id = matches
        .get_one::<String>(ARG_GOOGLE_CLIENT_ID)
        .filter(|value| !value.trim().is_empty());
    let secret = matches
        .get_one::<String>(ARG_GOOGLE_CLIENT_SECRET)
        .filter(|value| !value.trim().is_empty());

    match (id, secret) {
        (Some(client_id), Some(secret)) => Ok(Some(GoogleCredentials {
            client_id: client_id.clone(),
            client_secret: SecretString::from(secret.clone()),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(anyhow::anyhow!(
            "missing required argument: --{ARG_GOOGLE_CLIENT_SECRET} (required with --{ARG_GOOGLE_CLIENT_ID})"
        )),
        (None, Some(_)) => Err(anyhow::anyhow!(
            "missing required argument: --{ARG_GOOGLE_CLIENT_ID} (required with --{ARG_GOOGLE_CLIENT_SECRET})"
        )),
    }
}
