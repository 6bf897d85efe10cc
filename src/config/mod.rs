use crate::error::{AppError, AppResult};
use crate::models::DEFAULT_MINIMUM_AMOUNT;
use crate::utils::normalize_currency_code;

const ENV_PREFIX: &str = "PAY";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub invoicing: InvoicingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoicingConfig {
    pub minimum_amount: f64,
    pub default_currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: Option<String>,
}

impl Default for InvoicingConfig {
    fn default() -> Self {
        Self {
            minimum_amount: DEFAULT_MINIMUM_AMOUNT,
            default_currency: "USD".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `PAY_*` environment variables, e.g.
    /// `PAY_INVOICING__MINIMUM_AMOUNT=1.00` or `PAY_LOGGING__FORMAT=pretty`.
    pub fn from_env() -> AppResult<Self> {
        Self::from_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source<S>(source: S) -> AppResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Config::default();

        let config = config::Config::builder()
            .set_default("invoicing.minimum_amount", defaults.invoicing.minimum_amount)?
            .set_default("invoicing.default_currency", defaults.invoicing.default_currency)?
            .set_default("logging.format", "json")?
            .add_source(source)
            .build()?;

        let format = match config.get_string("logging.format")?.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(AppError::Config(format!(
                    "Unknown logging format: {} (expected json or pretty)",
                    other
                )))
            }
        };

        Ok(Config {
            invoicing: InvoicingConfig {
                minimum_amount: config.get_float("invoicing.minimum_amount")?,
                default_currency: normalize_currency_code(
                    &config.get_string("invoicing.default_currency")?,
                )?,
            },
            logging: LoggingConfig {
                format,
                filter: config.get_string("logging.filter").ok(),
            },
        })
    }
}
