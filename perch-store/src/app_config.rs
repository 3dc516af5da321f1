use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub hold_rules: HoldRules,
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// "memory" or "redis".
    pub backend: String,
    pub redis_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HoldRules {
    pub hold_ttl_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_sweep_interval() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    /// How many days of slot inventory to seed from today.
    pub days: u32,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `PERCH__HOLD_RULES__HOLD_TTL_SECONDS=120`
            .add_source(config::Environment::with_prefix("PERCH").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
