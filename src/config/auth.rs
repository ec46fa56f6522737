use crate::{config::env_var_or, error::TalabaResult};
use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::{RngCore, rng};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_token_lifetime: Duration,
    pub refresh_token_lifetime: Duration,
    pub token_bytes: usize,
}

impl AuthConfig {
    pub fn from_env() -> TalabaResult<Self> {
        let default = Self::default();

        let access_minutes = env_var_or(
            "TALABA_ACCESS_TOKEN_MINUTES",
            default.access_token_lifetime.num_minutes(),
        )?;
        let refresh_days = env_var_or(
            "TALABA_REFRESH_TOKEN_DAYS",
            default.refresh_token_lifetime.num_days(),
        )?;

        Ok(Self {
            access_token_lifetime: Duration::minutes(access_minutes.max(1)),
            refresh_token_lifetime: Duration::days(refresh_days.max(1)),
            ..default
        })
    }

    ///opaque bearer token, url-safe so it can sit in a header without escaping
    pub fn generate_token(&self) -> String {
        let mut bytes = vec![0_u8; self.token_bytes];
        rng().fill_bytes(&mut bytes);
        BASE64_URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn access_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.access_token_lifetime
    }

    pub fn refresh_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.refresh_token_lifetime
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::minutes(60),
            refresh_token_lifetime: Duration::days(7),
            token_bytes: 32,
        }
    }
}
