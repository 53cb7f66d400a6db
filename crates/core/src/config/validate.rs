use std::collections::HashSet;

use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde)
/// - Server port is not 0
/// - `api_key` auth has at least one key, and no key is empty or shared
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey && config.auth.api_keys.is_empty() {
        return Err(ConfigError::ValidationError(
            "auth.api_keys must not be empty when auth.method is api_key".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in &config.auth.api_keys {
        if entry.user.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.api_keys entries need a user".to_string(),
            ));
        }
        if entry.key.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "auth.api_keys entry for {} has an empty key",
                entry.user
            )));
        }
        if !seen.insert(entry.key.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "auth.api_keys entry for {} reuses another user's key",
                entry.user
            )));
        }
    }

    Ok(())
}
