//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::agent::{PatternCategory, PatternRegistry};
use crate::http::middleware::GuardPolicy;
use crate::ip::{AddressResolver, DEFAULT_TRUSTED_HEADERS};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Which headers may carry the client address.
    pub resolver: ResolverConfig,

    /// User-Agent policy applied to every request.
    pub guard: GuardPolicy,

    /// Additions to and removals from the built-in pattern lists.
    pub patterns: PatternsConfig,

    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Address resolver configuration.
///
/// Only list a header when the edge in front of the service sets it and
/// strips any client-supplied copy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Header names, highest precedence first. Empty means peer address only.
    pub trusted_headers: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            trusted_headers: DEFAULT_TRUSTED_HEADERS
                .iter()
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }
}

impl ResolverConfig {
    pub fn build(&self) -> AddressResolver {
        AddressResolver::from_names(&self.trusted_headers)
    }
}

/// Edits applied to one built-in pattern list at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternOverrides {
    /// Patterns appended to the list.
    pub add: Vec<String>,
    /// Patterns removed from the list (first exact match each).
    pub remove: Vec<String>,
}

/// Pattern list edits per category.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternsConfig {
    pub automation: PatternOverrides,
    pub crawler: PatternOverrides,
    pub browser: PatternOverrides,
}

impl PatternsConfig {
    pub fn overrides(&self, category: PatternCategory) -> &PatternOverrides {
        match category {
            PatternCategory::Automation => &self.automation,
            PatternCategory::Crawler => &self.crawler,
            PatternCategory::Browser => &self.browser,
        }
    }

    /// Built-in registry with these edits applied.
    pub fn build(&self) -> PatternRegistry {
        let registry = PatternRegistry::with_defaults();
        for category in PatternCategory::ALL {
            let overrides = self.overrides(category);
            for pattern in &overrides.remove {
                if !registry.remove(category, &pattern.to_lowercase()) {
                    tracing::warn!(
                        category = %category,
                        pattern = %pattern,
                        "Configured removal matched no pattern"
                    );
                }
            }
            for pattern in &overrides.add {
                let _ = registry.add(category, pattern);
            }
        }
        registry
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

pub const ADMIN_KEY_PLACEHOLDER: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: ADMIN_KEY_PLACEHOLDER.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::patterns;

    #[test]
    fn test_default_config() {
        let config = IdentityConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.guard, GuardPolicy::block_bots(true));
        assert_eq!(config.resolver.trusted_headers.len(), DEFAULT_TRUSTED_HEADERS.len());
        assert_eq!(config.resolver.build(), AddressResolver::default());
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_minimal_toml() {
        let config: IdentityConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [guard]
            mode = "browser_only"

            [resolver]
            trusted_headers = ["X-Real-IP"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.guard, GuardPolicy::browser_only());
        assert_eq!(config.resolver.trusted_headers, vec!["X-Real-IP"]);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_pattern_overrides() {
        let config: PatternsConfig = toml::from_str(
            r#"
            [automation]
            add = ["MyScanner"]
            remove = ["curl", "Java/"]

            [crawler]
            add = ["petalbot"]
            "#,
        )
        .unwrap();

        let registry = config.build();
        let automation = registry.snapshot(PatternCategory::Automation);
        assert!(!automation.contains(&"curl".to_string()));
        assert!(!automation.contains(&"java/".to_string()));
        assert_eq!(automation.last().map(String::as_str), Some("myscanner"));
        assert_eq!(automation.len(), patterns::AUTOMATION.len() - 1);
        assert!(registry.matches(PatternCategory::Crawler, "PetalBot"));
        assert_eq!(registry.len(PatternCategory::Browser), patterns::BROWSER.len());
    }

    #[test]
    fn test_config_serialization() {
        let config = IdentityConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: IdentityConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.guard, config.guard);
        assert_eq!(parsed.resolver.trusted_headers, config.resolver.trusted_headers);
    }
}
