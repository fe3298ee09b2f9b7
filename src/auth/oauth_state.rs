use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const STATE_TTL_SECS: i64 = 10 * 60;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StateClaims {
    provider: String,
    nonce: String,
    exp: i64,
}

/// Signs and checks the OAuth `state` parameter, so a callback is only
/// accepted for a login this service started, for the same provider,
/// within the last ten minutes.
#[derive(Clone)]
pub struct OAuthStateSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl OAuthStateSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, provider: &str) -> Result<String, AppError> {
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.gen()).collect();

        let claims = StateClaims {
            provider: provider.to_string(),
            nonce: hex::encode(bytes),
            exp: Utc::now().timestamp() + STATE_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign OAuth state: {e}")))
    }

    pub fn verify(&self, state: &str, provider: &str) -> Result<(), AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        let data = decode::<StateClaims>(state, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected OAuth state");
            AppError::InvalidOAuthState
        })?;

        if data.claims.provider != provider {
            return Err(AppError::InvalidOAuthState);
        }
        Ok(())
    }
}
