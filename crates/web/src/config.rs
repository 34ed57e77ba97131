//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHALKBOARD_BASE_URL` - Public URL for the server
//! - `CHALKBOARD_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `FIREBASE_PROJECT_ID` - Firebase project ID
//! - `FIREBASE_WEB_API_KEY` - Identity Toolkit web API key
//! - `FIREBASE_STORAGE_BUCKET` - Cloud Storage bucket (e.g., my-project.appspot.com)
//!
//! ## Optional
//! - `CHALKBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `CHALKBOARD_PORT` - Listen port (default: 3000)
//! - `FIREBASE_IDENTITY_HOST` - Identity Toolkit base URL
//!   (default: <https://identitytoolkit.googleapis.com>)
//! - `FIREBASE_FIRESTORE_HOST` - Firestore base URL
//!   (default: <https://firestore.googleapis.com>)
//! - `FIREBASE_STORAGE_HOST` - Cloud Storage base URL
//!   (default: <https://firebasestorage.googleapis.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//!
//! The `*_HOST` overrides exist for the Firebase emulator suite and for the
//! in-process fake backend the integration tests run against.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the server
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Firebase project configuration
    pub firebase: FirebaseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Firebase project configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Firebase project ID
    pub project_id: String,
    /// Identity Toolkit web API key
    pub web_api_key: SecretString,
    /// Cloud Storage bucket (e.g., my-project.appspot.com)
    pub storage_bucket: String,
    /// Identity Toolkit base URL
    pub identity_host: String,
    /// Firestore base URL
    pub firestore_host: String,
    /// Cloud Storage base URL
    pub storage_host: String,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("web_api_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .field("identity_host", &self.identity_host)
            .field("firestore_host", &self.firestore_host)
            .field("storage_host", &self.storage_host)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("CHALKBOARD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CHALKBOARD_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("CHALKBOARD_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CHALKBOARD_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("CHALKBOARD_BASE_URL")?;
        let session_secret = get_validated_secret("CHALKBOARD_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "CHALKBOARD_SESSION_SECRET")?;

        let firebase = FirebaseConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            firebase,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl FirebaseConfig {
    /// Load just the Firebase settings from the environment.
    ///
    /// Used by the CLI, which talks to the project without running a server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or the API
    /// key fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("FIREBASE_PROJECT_ID")?,
            web_api_key: get_validated_secret("FIREBASE_WEB_API_KEY")?,
            storage_bucket: get_required_env("FIREBASE_STORAGE_BUCKET")?,
            identity_host: get_env_or_default(
                "FIREBASE_IDENTITY_HOST",
                "https://identitytoolkit.googleapis.com",
            ),
            firestore_host: get_env_or_default(
                "FIREBASE_FIRESTORE_HOST",
                "https://firestore.googleapis.com",
            ),
            storage_host: get_env_or_default(
                "FIREBASE_STORAGE_HOST",
                "https://firebasestorage.googleapis.com",
            ),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            firebase: FirebaseConfig {
                project_id: "chalkboard-test".to_string(),
                web_api_key: SecretString::from("AIzaTestKey123"),
                storage_bucket: "chalkboard-test.appspot.com".to_string(),
                identity_host: "https://identitytoolkit.googleapis.com".to_string(),
                firestore_host: "https://firestore.googleapis.com".to_string(),
                storage_host: "https://firebasestorage.googleapis.com".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_firebase_config_debug_redacts_api_key() {
        let config = FirebaseConfig {
            project_id: "chalkboard-test".to_string(),
            web_api_key: SecretString::from("AIzaSuperSecretKey"),
            storage_bucket: "chalkboard-test.appspot.com".to_string(),
            identity_host: "https://identitytoolkit.googleapis.com".to_string(),
            firestore_host: "https://firestore.googleapis.com".to_string(),
            storage_host: "https://firebasestorage.googleapis.com".to_string(),
        };

        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("chalkboard-test"));
        assert!(debug_output.contains("appspot.com"));

        // The API key should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaSuperSecretKey"));
    }
}
