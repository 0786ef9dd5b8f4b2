use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{Intent, ModeWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_acquire_timeout_secs() -> u64 { 5 }
fn default_idle_timeout_secs() -> u64 { 600 }

/// Profile cache in front of the user directory
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Shared L2 tier; L1 only when absent
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: None,
            ttl_secs: default_ttl_secs(),
            l1_cache_size: default_l1_cache_size(),
        }
    }
}

fn default_true() -> bool { true }
fn default_ttl_secs() -> u64 { 60 }
fn default_l1_cache_size() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    /// Upper bound on candidates ranked per feed request
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_pool_size() -> usize { 200 }
fn default_max_limit() -> u32 { 100 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: ModeWeights,
}

/// Outbound notification dispatcher; notifications are dropped when no endpoint is set
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierSettings {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_notifier_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_notifier_timeout_secs(),
        }
    }
}

fn default_notifier_timeout_secs() -> u64 { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with WAYFARER_), `.env` included
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_layered(Path::new("config"), database_url_from_env())
    }

    fn load_layered(config_dir: &Path, database_url: Option<String>) -> Result<Self, ConfigError> {
        let default_file = config_dir.join("default");
        let local_file = config_dir.join("local");

        let settings = Config::builder()
            .add_source(File::with_name(&default_file.to_string_lossy()).required(false))
            .add_source(File::with_name(&local_file.to_string_lossy()).required(false))
            // e.g., WAYFARER__MATCHING__POOL_SIZE -> matching.pool_size
            .add_source(
                Environment::with_prefix("WAYFARER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_database_url(settings, database_url)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("WAYFARER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject weight vectors that do not sum to 1.0 and empty pools
    pub fn validate(&self) -> Result<(), ConfigError> {
        for mode in [Intent::Dating, Intent::Friends, Intent::Both] {
            let sum = self.scoring.weights.for_mode(mode).sum();
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(ConfigError::Message(format!(
                    "scoring weights for {} mode sum to {}, expected 1.0",
                    mode, sum
                )));
            }
        }

        if self.matching.pool_size == 0 {
            return Err(ConfigError::Message("matching.pool_size must be positive".to_string()));
        }
        if self.matching.max_limit == 0 {
            return Err(ConfigError::Message("matching.max_limit must be positive".to_string()));
        }

        Ok(())
    }
}

fn database_url_from_env() -> Option<String> {
    std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("WAYFARER__DATABASE__URL"))
        .ok()
}

/// `DATABASE_URL` wins over every file and prefixed variable; without it the files decide
fn apply_database_url(settings: Config, database_url: Option<String>) -> Result<Config, ConfigError> {
    let Some(database_url) = database_url else {
        return Ok(settings);
    };

    Config::builder()
        .add_source(settings)
        .set_override("database.url", database_url)?
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoringWeights;

    fn create_test_settings() -> Settings {
        Settings {
            database: DatabaseSettings {
                url: "postgres://localhost/test".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                acquire_timeout_secs: default_acquire_timeout_secs(),
                idle_timeout_secs: default_idle_timeout_secs(),
            },
            cache: CacheSettings::default(),
            matching: MatchingSettings::default(),
            scoring: ScoringSettings::default(),
            notifier: NotifierSettings::default(),
            logging: LoggingSettings::default(),
        }
    }

    #[test]
    fn test_default_weights() {
        let weights = ModeWeights::default();
        assert_eq!(weights.dating.trust, 0.30);
        assert_eq!(weights.friends.hobby_match, 0.35);
        assert_eq!(weights.both.rig_compatibility, 0.10);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_default_pool_size() {
        assert_eq!(MatchingSettings::default().pool_size, 200);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(create_test_settings().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unbalanced_weights() {
        let mut settings = create_test_settings();
        settings.scoring.weights.friends = ScoringWeights {
            hobby_match: 0.9,
            ..ScoringWeights::FRIENDS
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config = Config::builder()
            .set_override("database.url", "postgres://localhost/test")
            .unwrap()
            .set_override("matching.pool_size", 50)
            .unwrap()
            .build()
            .unwrap();

        let settings: Settings = config.try_deserialize().unwrap();
        assert_eq!(settings.matching.pool_size, 50);
        assert_eq!(settings.matching.max_limit, 100);
        assert_eq!(settings.scoring.weights, ModeWeights::default());
        assert!(settings.cache.redis_url.is_none());
    }

    fn create_config_dir(files: &[(&str, &str)]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("wayfarer-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, contents) in files {
            std::fs::write(dir.join(name), contents).unwrap();
        }
        dir
    }

    #[test]
    fn test_local_file_database_url_survives_without_env() {
        let dir = create_config_dir(&[
            ("default.toml", "[database]\nurl = \"postgres://localhost:5432/wayfarer\"\n"),
            ("local.toml", "[database]\nurl = \"postgres://prod-db:5432/wayfarer\"\n"),
        ]);

        let settings = Settings::load_layered(&dir, None).unwrap();
        assert_eq!(settings.database.url, "postgres://prod-db:5432/wayfarer");

        let overridden =
            Settings::load_layered(&dir, Some("postgres://env-db:5432/wayfarer".to_string())).unwrap();
        assert_eq!(overridden.database.url, "postgres://env-db:5432/wayfarer");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
