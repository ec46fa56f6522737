use crate::{
    config::{auth::AuthConfig, institution::InstitutionConfig},
    error::{BadEnvVarSnafu, ParseEnvIntSnafu, TalabaError, TalabaResult},
};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::{str::FromStr, sync::Arc};

pub mod auth;
pub mod institution;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    auth_config: Arc<AuthConfig>,
    institution_config: Arc<InstitutionConfig>,
}

impl RuntimeConfiguration {
    pub fn new() -> TalabaResult<Self> {
        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            auth_config: Arc::new(AuthConfig::from_env()?),
            institution_config: Arc::new(InstitutionConfig::from_env()?),
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn auth_config(&self) -> Arc<AuthConfig> {
        self.auth_config.clone()
    }

    pub fn institution_config(&self) -> Arc<InstitutionConfig> {
        self.institution_config.clone()
    }
}

#[cfg(test)]
impl RuntimeConfiguration {
    ///defaults everywhere, pointing at a local database that need not exist
    pub fn offline() -> Self {
        Self {
            db_config: Arc::new(DbConfig {
                user: "talaba".to_string(),
                password: SecretString::from("talaba".to_string()),
                path: "localhost".to_string(),
                port: 5432,
                database: "talaba".to_string(),
            }),
            auth_config: Arc::new(AuthConfig::default()),
            institution_config: Arc::new(InstitutionConfig::default()),
        }
    }
}

///reads an optional env var, using `default` if it isn't set
pub fn env_var_or<T>(name: &'static str, default: T) -> TalabaResult<T>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    match var(name) {
        Ok(value) => value.trim().parse().context(ParseEnvIntSnafu { name }),
        Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(default),
        Err(source) => Err(TalabaError::BadEnvVar { source, name }),
    }
}

///reads an optional string env var, using `default` if it isn't set or is blank
pub fn string_env_var_or(name: &'static str, default: &str) -> TalabaResult<String> {
    match var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Ok(_) | Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => {
            Ok(default.to_string())
        }
        Err(source) => Err(TalabaError::BadEnvVar { source, name }),
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> TalabaResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?
                .parse()
                .context(ParseEnvIntSnafu { name: "DB_PORT" })?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}
