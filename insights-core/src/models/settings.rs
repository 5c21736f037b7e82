use serde::{Deserialize, Serialize};

/// Server-side settings edited on the settings page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemSettings {
    #[serde(default = "default_deployment")]
    pub analyst_deployment: String,
    #[serde(default = "default_deployment")]
    pub insight_deployment: String,
    #[serde(default = "default_cache_duration")]
    pub cache_duration: u32,
    #[serde(default = "default_memcache_size")]
    pub memcache_size: u32,
}

fn default_deployment() -> String {
    "gpt-4".to_string()
}

fn default_cache_duration() -> u32 {
    7
}

fn default_memcache_size() -> u32 {
    100
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            analyst_deployment: default_deployment(),
            insight_deployment: default_deployment(),
            cache_duration: default_cache_duration(),
            memcache_size: default_memcache_size(),
        }
    }
}
