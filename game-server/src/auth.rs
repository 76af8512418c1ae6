use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use game_types::PlayerId;

/// Claims carried by a player token. `sub` is the player UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerClaims {
    pub sub: String,
    pub exp: u64,
}

enum AuthMode {
    /// The token is the player UUID itself.
    Dev,
    Jwt {
        key: DecodingKey,
        validation: Validation,
    },
}

/// Resolves the token presented at WebSocket upgrade to a player identity.
pub struct AuthService {
    mode: AuthMode,
}

impl AuthService {
    pub fn new(secret: &str) -> Self {
        Self {
            mode: AuthMode::Jwt {
                key: DecodingKey::from_secret(secret.as_bytes()),
                validation: Validation::new(Algorithm::HS256),
            },
        }
    }

    pub fn new_dev_mode() -> Self {
        Self {
            mode: AuthMode::Dev,
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        matches!(self.mode, AuthMode::Dev)
    }

    pub fn validate_token(&self, token: &str) -> Result<PlayerId, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        match &self.mode {
            AuthMode::Dev => Uuid::parse_str(token).map_err(|_| {
                tracing::debug!("dev token is not a player id");
                AuthError::InvalidSubject
            }),
            AuthMode::Jwt { key, validation } => {
                let data = decode::<PlayerClaims>(token, key, validation).map_err(|err| {
                    tracing::warn!(error = %err, "player token rejected");
                    AuthError::from(err)
                })?;
                Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token subject is not a player id")]
    InvalidSubject,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}
