use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use validator::Validate;

use crate::invoice::short_reference;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_API_BASE_URL: &str = "https://grilmelt-burger.onrender.com/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CURRENCY: &str = "LKR";
const DEFAULT_STORAGE_DIR: &str = ".storefront";
const CONFIG_DIR: &str = "config";

/// Flat delivery fee added to every order, in the storefront currency.
/// A client-side constant, not derived from the server.
const DEFAULT_DELIVERY_FEE_CENTS: i64 = 35000;

/// Bank transfer details shown to the customer after a deposit order.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DepositInstructions {
    pub bank_name: String,
    pub branch: String,
    pub account_name: String,
    #[validate(length(min = 1))]
    pub account_number: String,
}

impl Default for DepositInstructions {
    fn default() -> Self {
        Self {
            bank_name: "Commercial Bank".to_string(),
            branch: "Main Branch".to_string(),
            account_name: "BurgerShop (Pvt) Ltd".to_string(),
            account_number: "1000 1234 5678".to_string(),
        }
    }
}

impl DepositInstructions {
    /// Clipboard-ready transfer summary for the deposit dialog. The payment
    /// reference is the order id tail the kitchen reconciles against.
    pub fn transfer_summary(&self, order_id: &str, total: Decimal, currency: &str) -> String {
        format!(
            "Bank: {}\nBranch: {}\nAccount: {}\nNumber: {}\nAmount: {} {:.2}\nReference: {}",
            self.bank_name,
            self.branch,
            self.account_name,
            self.account_number,
            currency,
            total,
            short_reference(order_id)
        )
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the storefront order API
    #[serde(default = "default_api_base_url")]
    #[validate(url)]
    pub api_base_url: String,

    /// Timeout for remote authority requests, in seconds (1s - 5min)
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Flat delivery fee added to every order
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: Decimal,

    /// Currency code used for display and invoices
    #[serde(default = "default_currency")]
    #[validate(length(min = 3, max = 3))]
    pub currency: String,

    /// Directory holding the durable cart mirror
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Bank transfer details for deposit payments
    #[serde(default)]
    #[validate]
    pub deposit: DepositInstructions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            delivery_fee: default_delivery_fee(),
            currency: default_currency(),
            storage_dir: default_storage_dir(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            deposit: DepositInstructions::default(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_delivery_fee() -> Decimal {
    Decimal::new(DEFAULT_DELIVERY_FEE_CENTS, 2)
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_storage_dir() -> String {
    DEFAULT_STORAGE_DIR.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Loads configuration from layered sources: `config/default`, an optional
/// environment-specific file, then `APP__`-prefixed environment variables.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let settings = Config::builder()
        .add_source(File::from(Path::new(CONFIG_DIR).join("default")).required(false))
        .add_source(File::from(Path::new(CONFIG_DIR).join(&environment)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

    Ok(app_config)
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured
/// level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("storefront_checkout={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter =
        EnvFilter::try_new(filter_directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
            .ok();
    }
}
