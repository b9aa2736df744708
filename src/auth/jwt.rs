use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::auth::identity::Identity;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub.clone(),
            display_name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Issues and verifies the signed session tokens handed out at login.
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    /// Revoked raw tokens mapped to their `exp`. A token past `exp` fails
    /// verification on its own, so its entry is pruned on the next revoke.
    revoked: Mutex<HashMap<String, i64>>,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            revoked: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Revoke a token so subsequent guard checks reject it.
    ///
    /// Tokens that no longer verify are already rejected and are not stored.
    pub fn revoke(&self, token: &str) {
        let Ok(claims) = self.verify(token) else {
            return;
        };
        let now = Utc::now().timestamp();
        if let Ok(mut revoked) = self.revoked.lock() {
            revoked.retain(|_, exp| *exp >= now);
            revoked.insert(token.to_string(), claims.exp);
        }
    }

    /// Returns true if the token has been explicitly revoked.
    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked
            .lock()
            .map(|revoked| revoked.contains_key(token))
            .unwrap_or(false)
    }

    /// Issue a token for `identity`, valid for the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.id.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("session token encode error: {e}"))?;
        Ok(token)
    }

    /// Verify a token and return the decoded claims.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("session token verify error: {e}"))?;
        Ok(data.claims)
    }
}
