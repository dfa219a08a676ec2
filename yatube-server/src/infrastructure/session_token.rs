use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum SessionTokenError {
    #[error("session token encode failed")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("session token decode/validation failed")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Claims {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) exp: i64,
}

/// Signs and verifies the HS256 token stored in the session cookie.
pub(crate) struct SessionTokens {
    secret: String,
    ttl_seconds: i64,
}

impl SessionTokens {
    const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;

    pub(crate) fn new(secret: &str, ttl_seconds: i64) -> Self {
        let ttl_seconds = if ttl_seconds > 0 {
            ttl_seconds
        } else {
            Self::DEFAULT_TTL_SECONDS
        };

        SessionTokens {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    pub(crate) fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub(crate) fn issue(&self, user_id: i64, username: &str) -> Result<String, SessionTokenError> {
        let exp = (Utc::now() + Duration::seconds(self.ttl_seconds)).timestamp();

        let claims = Claims {
            user_id,
            username: username.into(),
            exp,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(SessionTokenError::Encode)
    }

    pub(crate) fn verify(&self, token: &str) -> Result<Claims, SessionTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 10;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(SessionTokenError::Decode)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionTokenError, SessionTokens};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let tokens = SessionTokens::new(SECRET, 3600);
        let token = tokens.issue(7, "NoName").expect("token must be issued");

        let claims = tokens.verify(&token).expect("token must verify");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "NoName");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = SessionTokens::new(SECRET, 3600)
            .issue(7, "NoName")
            .expect("token must be issued");

        let other = SessionTokens::new("fedcba9876543210fedcba9876543210", 3600);
        let err = other.verify(&token).expect_err("foreign token must fail");
        assert!(matches!(err, SessionTokenError::Decode(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let tokens = SessionTokens::new(SECRET, 3600);
        assert!(tokens.verify("not-a-token").is_err());
    }

    #[test]
    fn non_positive_ttl_falls_back_to_default() {
        assert_eq!(SessionTokens::new(SECRET, 0).ttl_seconds(), 24 * 60 * 60);
        assert_eq!(SessionTokens::new(SECRET, 60).ttl_seconds(), 60);
    }
}
