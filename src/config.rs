//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub paystack: PaystackConfig,
    pub vtpass: VtpassConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mounts the mock payment-confirmation route. Never enable in production:
    /// it force-marks transactions PAID without gateway verification.
    pub enable_mock_payments: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64, // seconds
    pub idle_timeout: Option<u64>, // seconds
}

/// Paystack gateway configuration
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub base_url: String,
    pub callback_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Which VTpass deployment the service talks to.
///
/// Sandbox enables the soft-failure bypass codes in the dispatch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorEnvironment {
    Sandbox,
    Live,
}

/// VTpass vendor configuration
#[derive(Debug, Clone)]
pub struct VtpassConfig {
    pub base_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub public_key: String,
    pub environment: VendorEnvironment,
    pub pay_timeout_secs: u64,
    pub catalog_timeout_secs: u64,
    pub max_retries: u32,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            paystack: PaystackConfig::from_env()?,
            vtpass: VtpassConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.paystack.validate()?;
        self.vtpass.validate()?;

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".to_string()))?,
            enable_mock_payments: env::var("ENABLE_MOCK_PAYMENTS")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(
                "SERVER_PORT cannot be 0".to_string(),
            ));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingVariable("DATABASE_URL".to_string()))?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MIN_CONNECTIONS".to_string()))?,
            connection_timeout: env::var("DB_CONNECTION_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_CONNECTION_TIMEOUT".to_string()))?,
            idle_timeout: env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|val| val.parse().ok()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::InvalidValue("DATABASE_URL".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                "DB_MIN_CONNECTIONS must be <= DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(())
    }
}

impl PaystackConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(PaystackConfig {
            secret_key: env::var("PAYSTACK_SECRET_KEY")
                .map_err(|_| ConfigError::MissingVariable("PAYSTACK_SECRET_KEY".to_string()))?,
            base_url: env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
            callback_url: env::var("PAYSTACK_CALLBACK_URL")
                .unwrap_or_else(|_| "https://standard.paystack.co/close".to_string()),
            timeout_secs: env::var("PAYSTACK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAYSTACK_TIMEOUT_SECS".to_string()))?,
            max_retries: env::var("PAYSTACK_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAYSTACK_MAX_RETRIES".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue("PAYSTACK_SECRET_KEY".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PAYSTACK_BASE_URL must be a valid URL".to_string(),
            ));
        }

        Ok(())
    }
}

impl VtpassConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("VTPASS_BASE_URL")
            .unwrap_or_else(|_| "https://sandbox.vtpass.com/api".to_string());

        // Explicit flag wins; otherwise infer from the base URL. The sandbox
        // bypass codes must never activate against a live deployment.
        let environment = match env::var("VTPASS_ENVIRONMENT") {
            Ok(value) => match value.to_lowercase().as_str() {
                "sandbox" => VendorEnvironment::Sandbox,
                "live" | "production" => VendorEnvironment::Live,
                _ => return Err(ConfigError::InvalidValue("VTPASS_ENVIRONMENT".to_string())),
            },
            Err(_) => {
                if base_url.contains("sandbox") {
                    VendorEnvironment::Sandbox
                } else {
                    VendorEnvironment::Live
                }
            }
        };

        Ok(VtpassConfig {
            base_url,
            api_key: env::var("VTPASS_API_KEY")
                .map_err(|_| ConfigError::MissingVariable("VTPASS_API_KEY".to_string()))?,
            secret_key: env::var("VTPASS_SECRET_KEY")
                .map_err(|_| ConfigError::MissingVariable("VTPASS_SECRET_KEY".to_string()))?,
            public_key: env::var("VTPASS_PUBLIC_KEY")
                .map_err(|_| ConfigError::MissingVariable("VTPASS_PUBLIC_KEY".to_string()))?,
            environment,
            pay_timeout_secs: env::var("VTPASS_PAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("VTPASS_PAY_TIMEOUT_SECS".to_string()))?,
            catalog_timeout_secs: env::var("VTPASS_CATALOG_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("VTPASS_CATALOG_TIMEOUT_SECS".to_string())
                })?,
            max_retries: env::var("VTPASS_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("VTPASS_MAX_RETRIES".to_string()))?,
        })
    }

    pub fn is_sandbox(&self) -> bool {
        self.environment == VendorEnvironment::Sandbox
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "VTPASS_BASE_URL must be a valid URL".to_string(),
            ));
        }

        if self.api_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue("VTPASS_API_KEY".to_string()));
        }

        if self.environment == VendorEnvironment::Live && self.base_url.contains("sandbox") {
            return Err(ConfigError::ValidationFailed(
                "VTPASS_ENVIRONMENT=live contradicts a sandbox VTPASS_BASE_URL".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
