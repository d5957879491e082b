//! OAuth2 token exchange against `/oauth/token`.
//!
//! Both grants are plain form posts without an `Authorization` header; the
//! application credentials travel in the body.

use ctb_core::{ApiConfig, ApiError, Fields, JsonParser, ParsingResult};
use ctb_transport::{Authorization, Request};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TOKEN_PATH: &str = "/oauth/token";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub token_type: String,
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OAuthTokenParser;

impl JsonParser for OAuthTokenParser {
    type Output = OAuthToken;

    fn type_name(&self) -> &'static str {
        "OAuthToken"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<OAuthToken> {
        let mut fields = Fields::new(value);
        let token = OAuthToken {
            access_token: fields.required_string("access_token"),
            token_type: fields.required_string("token_type"),
        };
        fields.finish(token)
    }

    fn fallback(&self) -> OAuthToken {
        OAuthToken {
            access_token: String::new(),
            token_type: String::new(),
        }
    }
}

/// OAuth2 error document (`error`, `error_description`), RFC 6749 §5.2.
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuthErrorParser;

impl JsonParser for OAuthErrorParser {
    type Output = (String, String);

    fn type_name(&self) -> &'static str {
        "OAuthError"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<(String, String)> {
        let mut fields = Fields::new(value);
        let error = (fields.string("error"), fields.string("error_description"));
        fields.finish(error)
    }

    fn fallback(&self) -> (String, String) {
        (String::new(), String::new())
    }
}

/// `ApiError` for a rejected password grant. The OAuth error code becomes the
/// item's code; the description, or else the raw body, its detail.
pub fn login_failed_error(body: &str) -> ApiError {
    match OAuthErrorParser.parse_str(body, None, true) {
        Ok((code, description)) if !code.is_empty() => {
            let detail = if description.is_empty() { code.clone() } else { description };
            ApiError::login_failed(detail).with_code(code)
        }
        _ => ApiError::login_failed(body.trim()),
    }
}

/// Application token request (client-credential grant).
pub fn client_credentials_request(config: &ApiConfig) -> Request {
    Request::post(TOKEN_PATH)
        .with_authorization(Authorization::None)
        .with_field("grant_type", "client_credentials")
        .with_field("client_id", config.app_id.as_str())
        .with_field("client_secret", config.app_secret.as_str())
}

/// User token request (resource-owner password grant).
pub fn password_grant_request(config: &ApiConfig, username: &str, password: &str) -> Request {
    Request::post(TOKEN_PATH)
        .with_authorization(Authorization::None)
        .with_field("grant_type", "password")
        .with_field("client_id", config.app_id.as_str())
        .with_field("client_secret", config.app_secret.as_str())
        .with_field("username", username)
        .with_field("password", password)
}
