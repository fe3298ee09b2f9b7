use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Identity tokens are valid for 24 hours. Not configurable.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claim set carried by an identity token. Unknown claims are rejected.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    pub user_id: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and validates HMAC-signed identity tokens. Stateless: a token is
/// valid as long as its signature checks out and it has not expired.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::Internal("JWT secret must not be empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn issue(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            exp: now + TOKEN_TTL_SECS,
            iat: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verifies signature, algorithm family and expiry, then decodes the
    /// typed claims. Every failure collapses to `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_required_spec_claims(&["exp"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected identity token");
            AppError::Unauthorized
        })?;

        if token_data.claims.user_id.is_empty() {
            return Err(AppError::Unauthorized);
        }

        Ok(token_data.claims)
    }
}
