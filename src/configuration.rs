use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub profile: ProfileSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Token signing settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    /// HMAC signing key, must come from the environment or a secret file
    pub secret: String,
    pub access_token_expiry: i64,  // seconds (3600 = 60 minutes)
    pub refresh_token_expiry: i64, // seconds (259200 = 72 hours)
}

/// Remote profile service; the in-memory store is used when `base_url` is unset
#[derive(serde::Deserialize, Clone)]
#[serde(default)]
pub struct ProfileSettings {
    pub base_url: Option<String>,
    pub timeout_milliseconds: u64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_milliseconds: 2000,
        }
    }
}

impl ProfileSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Load settings from `configuration.{yaml,json,toml}` and `APP_*` env vars
///
/// Environment wins, e.g. `APP_JWT__SECRET`, `APP_APPLICATION__PORT`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8089)?
        .set_default("jwt.access_token_expiry", 3600)?
        .set_default("jwt.refresh_token_expiry", 259200)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
