use config::ConfigError;

use crate::error::AppError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub redis: RedisSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 3600 for 1 hour)
    pub refresh_token_expiry: i64,  // seconds (e.g., 15552000 for 6 months)
    pub issuer: String,
}

const MIN_SECRET_LENGTH: usize = 32;

impl JwtSettings {
    /// Reject weak signing configuration at startup.
    ///
    /// HMAC-SHA256 keys shorter than the digest size are brute-forceable;
    /// the process must not come up with one.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::Config(crate::error::ConfigError::InvalidValue(
                format!(
                    "jwt.secret must be at least {} bytes, got {}",
                    MIN_SECRET_LENGTH,
                    self.secret.len()
                ),
            )));
        }
        if self.access_token_expiry <= 0 {
            return Err(AppError::Config(crate::error::ConfigError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            )));
        }
        if self.refresh_token_expiry <= 0 {
            return Err(AppError::Config(crate::error::ConfigError::InvalidValue(
                "jwt.refresh_token_expiry must be positive".to_string(),
            )));
        }
        Ok(())
    }
}

/// Response cache settings
#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    pub enabled: bool,
    pub connection_string: String,
    pub operation_timeout_ms: u64,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .build()?;
    settings.try_deserialize::<Settings>()
}
