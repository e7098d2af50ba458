//! Configuration types for controlling resolution and test case generation.

use std::cell::RefCell;

use tracing::warn;

/// Environment variable holding the run seed
pub const SEED_ENV: &str = "AUTOPARAMS_SEED";
/// Environment variable holding the default repeat count
pub const REPEAT_ENV: &str = "AUTOPARAMS_REPEAT";
/// Environment variable enabling per-resolution logging
pub const LOG_RESOLUTION_ENV: &str = "AUTOPARAMS_LOG_RESOLUTION";

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid collection size (must be > 0)
    InvalidCollectionSize(usize),
    /// Invalid recursion depth (must be > 0)
    InvalidRecursionDepth(usize),
    /// Invalid repeat count (must be > 0)
    InvalidRepeat(usize),
    /// Invalid worker count (must be > 0)
    InvalidParallelism(usize),
    /// Integer bounds where min is greater than max
    InvalidBounds { min: i128, max: i128 },
    /// An environment variable held an unparsable value
    InvalidEnvironment { variable: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidCollectionSize(n) => {
                write!(f, "Invalid collection size: {} (must be > 0)", n)
            }
            ConfigError::InvalidRecursionDepth(n) => {
                write!(f, "Invalid recursion depth: {} (must be > 0)", n)
            }
            ConfigError::InvalidRepeat(n) => {
                write!(f, "Invalid repeat count: {} (must be > 0)", n)
            }
            ConfigError::InvalidParallelism(n) => {
                write!(f, "Invalid parallelism: {} (must be > 0)", n)
            }
            ConfigError::InvalidBounds { min, max } => {
                write!(f, "Invalid bounds: min {} is greater than max {}", min, max)
            }
            ConfigError::InvalidEnvironment { variable, value } => {
                write!(f, "Invalid value '{}' for {}", value, variable)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration used by one resolution context and its test case generator
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionConfig {
    /// Optional seed for reproducible generation
    pub seed: Option<u64>,
    /// Number of elements generated for collection types
    pub collection_size: usize,
    /// How many times one type may appear on the resolution stack
    pub max_recursion_depth: usize,
    /// Number of invocations generated when no literal source is attached
    pub repeat: usize,
    /// Log every resolution at info level instead of debug
    pub log_resolution: bool,
    /// Worker count for parallel generation, all cores when unset
    pub parallelism: Option<usize>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            collection_size: 3,
            max_recursion_depth: 8,
            repeat: 1,
            log_resolution: false,
            parallelism: None,
        }
    }
}

impl ResolutionConfig {
    /// Create a new resolution configuration with validation
    pub fn new(
        seed: Option<u64>,
        collection_size: usize,
        max_recursion_depth: usize,
        repeat: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            seed,
            collection_size,
            max_recursion_depth,
            repeat,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the resolution configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_size == 0 {
            return Err(ConfigError::InvalidCollectionSize(self.collection_size));
        }
        if self.max_recursion_depth == 0 {
            return Err(ConfigError::InvalidRecursionDepth(self.max_recursion_depth));
        }
        if self.repeat == 0 {
            return Err(ConfigError::InvalidRepeat(self.repeat));
        }
        if let Some(0) = self.parallelism {
            return Err(ConfigError::InvalidParallelism(0));
        }
        Ok(())
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the repeat count
    pub fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the collection size
    pub fn with_collection_size(mut self, collection_size: usize) -> Self {
        self.collection_size = collection_size;
        self
    }

    /// Set the maximum recursion depth
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Enable or disable info-level resolution logging
    pub fn with_log_resolution(mut self, enabled: bool) -> Self {
        self.log_resolution = enabled;
        self
    }

    /// Set the worker count for parallel generation
    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = Some(workers);
        self
    }

    /// Number of workers used by parallel generation
    pub fn worker_count(&self) -> usize {
        self.parallelism.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Create a resolution configuration from global defaults
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            seed: global.default_seed,
            collection_size: global.collection_size,
            max_recursion_depth: global.max_recursion_depth,
            repeat: global.default_repeat,
            log_resolution: global.log_resolution,
            parallelism: None,
        }
    }
}

/// Process-wide defaults for resolution
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    /// Default seed for reproducible generation
    pub default_seed: Option<u64>,
    /// Default number of generated invocations
    pub default_repeat: usize,
    /// Default collection size
    pub collection_size: usize,
    /// Default maximum recursion depth
    pub max_recursion_depth: usize,
    /// Default resolution logging level switch
    pub log_resolution: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        let defaults = ResolutionConfig::default();
        Self {
            default_seed: None,
            default_repeat: defaults.repeat,
            collection_size: defaults.collection_size,
            max_recursion_depth: defaults.max_recursion_depth,
            log_resolution: defaults.log_resolution,
        }
    }
}

impl GlobalConfig {
    /// Check that the defaults form a usable resolution configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        ResolutionConfig::from_global(self).validate()
    }

    /// Apply `AUTOPARAMS_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, keyed by environment variable name
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SEED_ENV) {
            let seed = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidEnvironment {
                    variable: SEED_ENV,
                    value: value.clone(),
                })?;
            self.default_seed = Some(seed);
        }

        if let Some(value) = lookup(REPEAT_ENV) {
            let repeat = value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidEnvironment {
                    variable: REPEAT_ENV,
                    value: value.clone(),
                })?;
            self.default_repeat = repeat;
        }

        if let Some(value) = lookup(LOG_RESOLUTION_ENV) {
            self.log_resolution = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidEnvironment {
                        variable: LOG_RESOLUTION_ENV,
                        value,
                    });
                }
            };
        }

        self.validate()?;
        Ok(self)
    }
}

/// Owns the global defaults that new resolution configurations inherit
pub struct ConfigManager {
    global_config: GlobalConfig,
}

impl ConfigManager {
    /// Create a configuration manager seeded from defaults and the environment
    pub fn new() -> Self {
        let global_config = match GlobalConfig::default().with_env_overrides() {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "ignoring invalid autoparams environment configuration");
                GlobalConfig::default()
            }
        };
        Self { global_config }
    }

    /// Manager over explicit defaults
    pub fn with_global_config(global_config: GlobalConfig) -> Result<Self, ConfigError> {
        global_config.validate()?;
        Ok(Self { global_config })
    }

    /// The current defaults
    pub fn global_config(&self) -> &GlobalConfig {
        &self.global_config
    }

    /// Replace the defaults after validating them
    pub fn set_global_config(&mut self, global_config: GlobalConfig) -> Result<(), ConfigError> {
        global_config.validate()?;
        self.global_config = global_config;
        Ok(())
    }

    /// Create a resolution configuration that inherits from global defaults
    pub fn create_resolution_config(&self) -> ResolutionConfig {
        ResolutionConfig::from_global(&self.global_config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    // One manager per thread, so tests that change the globals stay isolated.
    static CONFIG_MANAGER: RefCell<ConfigManager> = RefCell::new(ConfigManager::new());
}

/// The calling thread's global configuration
pub fn get_global_config() -> GlobalConfig {
    CONFIG_MANAGER.with(|manager| manager.borrow().global_config().clone())
}

/// Replace the calling thread's global configuration
pub fn set_global_config(config: GlobalConfig) -> Result<(), ConfigError> {
    CONFIG_MANAGER.with(|manager| manager.borrow_mut().set_global_config(config))
}

/// A resolution configuration inheriting the calling thread's globals
pub fn create_resolution_config() -> ResolutionConfig {
    CONFIG_MANAGER.with(|manager| manager.borrow().create_resolution_config())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let table: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| table.get(name).cloned()
    }

    #[test]
    fn test_resolution_config_validation() {
        assert!(ResolutionConfig::new(None, 3, 8, 1).is_ok());

        assert!(matches!(
            ResolutionConfig::new(None, 0, 8, 1),
            Err(ConfigError::InvalidCollectionSize(0))
        ));
        assert!(matches!(
            ResolutionConfig::new(None, 3, 0, 1),
            Err(ConfigError::InvalidRecursionDepth(0))
        ));
        assert!(matches!(
            ResolutionConfig::new(None, 3, 8, 0),
            Err(ConfigError::InvalidRepeat(0))
        ));

        let config = ResolutionConfig::default().with_parallelism(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidParallelism(0)));
    }

    #[test]
    fn test_worker_count_is_positive() {
        assert!(ResolutionConfig::default().worker_count() >= 1);
        assert_eq!(
            ResolutionConfig::default().with_parallelism(4).worker_count(),
            4
        );
    }

    #[test]
    fn test_from_global_copies_defaults() {
        let global = GlobalConfig {
            default_seed: Some(123),
            default_repeat: 5,
            collection_size: 2,
            ..GlobalConfig::default()
        };

        let config = ResolutionConfig::from_global(&global);
        assert_eq!(config.seed, Some(123));
        assert_eq!(config.repeat, 5);
        assert_eq!(config.collection_size, 2);
        assert_eq!(config.parallelism, None);
    }

    #[test]
    fn test_environment_overrides() {
        let config = GlobalConfig::default()
            .with_overrides(lookup(&[
                (SEED_ENV, "42"),
                (REPEAT_ENV, " 7 "),
                (LOG_RESOLUTION_ENV, "true"),
            ]))
            .unwrap();

        assert_eq!(config.default_seed, Some(42));
        assert_eq!(config.default_repeat, 7);
        assert!(config.log_resolution);
    }

    #[test]
    fn test_invalid_environment_values() {
        let error = GlobalConfig::default()
            .with_overrides(lookup(&[(SEED_ENV, "forty-two")]))
            .unwrap_err();
        assert_eq!(
            error,
            ConfigError::InvalidEnvironment {
                variable: SEED_ENV,
                value: "forty-two".to_string(),
            }
        );

        let error = GlobalConfig::default()
            .with_overrides(lookup(&[(REPEAT_ENV, "0")]))
            .unwrap_err();
        assert_eq!(error, ConfigError::InvalidRepeat(0));

        assert!(
            GlobalConfig::default()
                .with_overrides(lookup(&[(LOG_RESOLUTION_ENV, "maybe")]))
                .is_err()
        );
    }

    #[test]
    fn test_config_manager() {
        let mut manager = ConfigManager::with_global_config(GlobalConfig::default()).unwrap();
        assert_eq!(manager.create_resolution_config().repeat, 1);

        let new_global = GlobalConfig {
            default_repeat: 4,
            default_seed: Some(789),
            ..GlobalConfig::default()
        };
        manager.set_global_config(new_global).unwrap();

        let config = manager.create_resolution_config();
        assert_eq!(config.repeat, 4);
        assert_eq!(config.seed, Some(789));

        let invalid = GlobalConfig {
            collection_size: 0,
            ..GlobalConfig::default()
        };
        assert!(manager.set_global_config(invalid).is_err());
    }

    #[test]
    fn test_thread_local_config_functions() {
        let new_global = GlobalConfig {
            default_repeat: 6,
            default_seed: Some(555),
            ..GlobalConfig::default()
        };
        set_global_config(new_global.clone()).unwrap();

        assert_eq!(get_global_config(), new_global);

        let config = create_resolution_config();
        assert_eq!(config.repeat, 6);
        assert_eq!(config.seed, Some(555));
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::InvalidRepeat(0).to_string(),
            "Invalid repeat count: 0 (must be > 0)"
        );
        assert_eq!(
            ConfigError::InvalidBounds { min: 5, max: 1 }.to_string(),
            "Invalid bounds: min 5 is greater than max 1"
        );
    }
}
