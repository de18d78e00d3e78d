//! Secret management for provider API keys
//!
//! Lookup order:
//! 1. The environment variable named in the provider's config section
//!    (a `.env` file in the working directory is loaded at startup)
//! 2. The OS keychain entry `<provider>_api_key` under the manager's service
//!
//! Secrets are stored in:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (libsecret)
//!
//! A missing key is reported as `EngineError::MissingApiKey` rather than
//! prompted for, so non-interactive hosts fail cleanly.

use keyring::Entry;
use tutor_sdk::errors::EngineError;

/// Keychain service the CLI stores provider keys under
pub const KEYCHAIN_SERVICE: &str = "stem-tutor";

/// Providers that authenticate with an API key
pub const KEYED_PROVIDERS: [&str; 2] = ["openai", "groq"];

/// SecretManager resolves provider API keys.
pub struct SecretManager {
    service_name: String,
}

impl SecretManager {
    /// Creates a new SecretManager with the given keychain service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Keychain key used for a provider's API key
    pub fn key_for(provider: &str) -> String {
        format!("{}_api_key", provider)
    }

    /// Resolve the API key for `provider`, checking `env_var` first.
    ///
    /// # Errors
    /// - `EngineError::MissingApiKey` if neither source has a value
    /// - `EngineError::KeyringError` if keychain access fails
    pub fn api_key(&self, provider: &str, env_var: &str) -> Result<String, EngineError> {
        if let Some(value) = read_env(env_var) {
            tracing::debug!("Using API key for '{}' from ${}", provider, env_var);
            return Ok(value);
        }

        match self.get_secret(&Self::key_for(provider))? {
            Some(value) => Ok(value),
            None => Err(EngineError::MissingApiKey(provider.to_string())),
        }
    }

    /// Checks whether an API key is available without failing.
    pub fn has_api_key(&self, provider: &str, env_var: &str) -> bool {
        read_env(env_var).is_some()
            || matches!(self.get_secret(&Self::key_for(provider)), Ok(Some(_)))
    }

    /// Retrieves a secret from the OS keychain, `None` when absent.
    pub fn get_secret(&self, key: &str) -> Result<Option<String>, EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        match entry.get_password() {
            Ok(secret) => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(EngineError::KeyringError(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    /// Stores a secret in the OS keychain.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), EngineError> {
        if value.trim().is_empty() {
            return Err(EngineError::KeyringError(
                "Refusing to store an empty secret".to_string(),
            ));
        }

        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        entry.set_password(value.trim()).map_err(|e| {
            EngineError::KeyringError(format!("Failed to store secret '{}': {}", key, e))
        })?;

        tracing::info!("Stored secret '{}' in keychain", key);
        Ok(())
    }
}

/// Non-empty value of an environment variable
fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_naming() {
        assert_eq!(SecretManager::key_for("groq"), "groq_api_key");
        assert_eq!(SecretManager::key_for("openai"), "openai_api_key");
    }

    #[test]
    fn test_env_var_takes_precedence() {
        let var = "STEM_TUTOR_TEST_KEY_PRECEDENCE";
        std::env::set_var(var, "  gsk_from_env  ");

        let manager = SecretManager::new("stem-tutor-test");
        let key = manager.api_key("groq", var).unwrap();
        assert_eq!(key, "gsk_from_env");
        assert!(manager.has_api_key("groq", var));

        std::env::remove_var(var);
    }

    #[test]
    fn test_blank_env_var_is_ignored() {
        let var = "STEM_TUTOR_TEST_KEY_BLANK";
        std::env::set_var(var, "   ");
        assert_eq!(read_env(var), None);
        std::env::remove_var(var);
    }

    #[test]
    fn test_set_secret_rejects_empty_value() {
        let manager = SecretManager::new("stem-tutor-test");
        let err = manager.set_secret("groq_api_key", "  ").unwrap_err();
        assert!(matches!(err, EngineError::KeyringError(_)));
    }
}
