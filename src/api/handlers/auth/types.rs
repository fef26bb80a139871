//! Request/response types for auth endpoints.

use crate::session::Role;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[schema(value_type = String, format = Password)]
    pub password: SecretString,
}

/// Sign-up form as the portal submits it.
#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Option<Role>,
    pub department: Option<String>,
}

/// Registration payload in the backend's field names.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct BackendRegistration {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl RegisterRequest {
    /// Username is the email local part plus a millisecond timestamp; a
    /// single-word name gets the last name `User`.
    #[must_use]
    pub fn into_backend(self, now_ms: i64) -> BackendRegistration {
        let local = self.email.split('@').next().unwrap_or_default().to_string();
        let mut words = self.name.split_whitespace();
        let first_name = words.next().unwrap_or_default().to_string();
        let rest = words.collect::<Vec<_>>().join(" ");
        let last_name = if rest.is_empty() {
            "User".to_string()
        } else {
            rest
        };
        BackendRegistration {
            username: format!("{local}_{now_ms}"),
            email: self.email,
            password1: self.password,
            password2: self.confirm_password,
            first_name,
            last_name,
            role: self.role.unwrap_or(Role::Student),
            department: self.department.filter(|d| !d.trim().is_empty()),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub api_url: String,
    pub ws_url: String,
    pub federated_login: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize, Debug)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn request(name: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: "ada.l@campus.edu".to_string(),
            password: "pw-1".to_string(),
            confirm_password: "pw-1".to_string(),
            role: None,
            department: Some("CS".to_string()),
        }
    }

    #[test]
    fn registration_is_translated_to_backend_fields() -> Result<()> {
        let payload = request("Ada King Lovelace").into_backend(1_700_000_000_000);
        assert_eq!(
            serde_json::to_value(&payload)?,
            json!({
                "username": "ada.l_1700000000000",
                "email": "ada.l@campus.edu",
                "password1": "pw-1",
                "password2": "pw-1",
                "first_name": "Ada",
                "last_name": "King Lovelace",
                "role": "student",
                "department": "CS",
            })
        );
        Ok(())
    }

    #[test]
    fn single_word_name_gets_default_last_name() {
        let payload = request("Ada").into_backend(1);
        assert_eq!(payload.first_name, "Ada");
        assert_eq!(payload.last_name, "User");
    }

    #[test]
    fn register_request_reads_camel_case() -> Result<()> {
        let request: RegisterRequest = serde_json::from_value(json!({
            "name": "Grace Hopper",
            "email": "grace@campus.edu",
            "password": "a",
            "confirmPassword": "a",
            "role": "faculty",
        }))?;
        assert_eq!(request.role, Some(Role::Faculty));
        assert_eq!(request.confirm_password, "a");
        assert!(request.department.is_none());
        Ok(())
    }

    #[test]
    fn public_config_is_camel_case() -> Result<()> {
        let config = PublicConfig {
            api_url: "a".to_string(),
            ws_url: "b".to_string(),
            federated_login: true,
        };
        assert_eq!(
            serde_json::to_value(config)?,
            json!({"apiUrl": "a", "wsUrl": "b", "federatedLogin": true})
        );
        Ok(())
    }
}
