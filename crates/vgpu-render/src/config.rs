use std::env;

/// Runtime knobs for the host-side render layer.
///
/// Every field can be overridden from the environment; see [`HostConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Name given to the post worker thread.
    ///
    /// Environment variable: `VGPU_POST_THREAD_NAME`.
    pub post_thread_name: String,

    /// Number of `(format, width, height)` transfer layouts kept by the staging cache.
    ///
    /// Environment variable: `VGPU_STAGING_CACHE_CAPACITY`. Must be > 0.
    pub staging_cache_capacity: usize,

    /// Byte threshold at which host mapping runs are split; 0 disables batching.
    ///
    /// Environment variable: `VGPU_MAPPING_BATCH_BYTES`.
    pub mapping_batch_bytes: u64,
}

pub const DEFAULT_POST_THREAD_NAME: &str = "vgpu-post";
pub const DEFAULT_STAGING_CACHE_CAPACITY: usize = 64;

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            post_thread_name: DEFAULT_POST_THREAD_NAME.to_string(),
            staging_cache_capacity: DEFAULT_STAGING_CACHE_CAPACITY,
            mapping_batch_bytes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

impl HostConfig {
    /// Defaults overridden by whichever `VGPU_*` variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(name) = lookup("VGPU_POST_THREAD_NAME") {
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid("VGPU_POST_THREAD_NAME", name));
            }
            config.post_thread_name = name.to_string();
        }

        if let Some(value) = lookup("VGPU_STAGING_CACHE_CAPACITY") {
            config.staging_cache_capacity = match value.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => return Err(invalid("VGPU_STAGING_CACHE_CAPACITY", &value)),
            };
        }

        if let Some(value) = lookup("VGPU_MAPPING_BATCH_BYTES") {
            config.mapping_batch_bytes = value
                .trim()
                .parse()
                .map_err(|_| invalid("VGPU_MAPPING_BATCH_BYTES", &value))?;
        }

        Ok(config)
    }
}

fn invalid(var: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
    }
}
