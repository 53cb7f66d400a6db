//! Request authentication.

mod api_key;
mod authenticator;
mod identity;

pub use api_key::ApiKeyAuthenticator;
pub use authenticator::{AuthError, Authenticator, NoneAuthenticator};
pub use identity::{AuthRequest, Identity};

use crate::config::AuthConfig;

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    use crate::config::AuthMethod;

    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::ApiKey => {
            if config.api_keys.is_empty() {
                return Err(AuthError::ConfigurationError(
                    "api_keys must be set when using ApiKey auth method".to_string(),
                ));
            }
            Ok(Box::new(ApiKeyAuthenticator::new(&config.api_keys)))
        }
    }
}
