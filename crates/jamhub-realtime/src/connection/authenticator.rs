//! WebSocket authentication: resolves the identity a connection acts as.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use jamhub_core::config::AuthConfig;
use jamhub_core::error::AppError;
use jamhub_core::types::Identity;

/// Claims read from a connection token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, used as the identity.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Authenticates WebSocket connections.
///
/// With authentication disabled every connection gets a fresh anonymous
/// identity. Otherwise an HS256 token is required and its `sub` is the identity.
#[derive(Clone)]
pub struct WsAuthenticator {
    /// Whether a token is required.
    enabled: bool,
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator")
            .field("enabled", &self.enabled)
            .field("validation", &self.validation)
            .finish()
    }
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            enabled: config.enabled,
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Whether tokens are required.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve the identity for a new connection.
    pub fn authenticate(&self, token: Option<&str>) -> Result<Identity, AppError> {
        if !self.enabled {
            return Ok(Identity::anonymous());
        }

        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::authentication("Missing access token"))?;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        let subject = token_data.claims.sub.trim();
        if subject.is_empty() {
            return Err(AppError::authentication("Token has no subject"));
        }
        Ok(Identity::new(subject))
    }
}
