//! Configuration loading and management
//!
//! Everything comes from the environment; there is no config file. The
//! rule for optional subsystems (payment gateways, SMS, email) is
//! degrade-not-crash: when a subsystem's anchor variable is unset the
//! subsystem is simply absent and the rest of the app runs without it.
//! Errors only fire for values that are *present* but unusable, or for an
//! anchor whose required companions are missing.

use crate::core::error::ConfigError;
use crate::payments::SignatureScheme;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_DATABASE_FILE: &str = "data/app.db";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub branding: BrandingConfig,

    /// Hosted-redirect wallet gateway; absent when not configured.
    pub jazzcash: Option<JazzCashConfig>,

    /// In-app wallet gateway; absent when not configured.
    pub easypaisa: Option<EasyPaisaConfig>,

    /// SMS transport; absent when not configured.
    pub twilio: Option<TwilioConfig>,

    /// Email transport; absent when not configured.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Port to bind on (`PORT`).
    pub port: u16,

    /// Externally reachable base URL (`PUBLIC_URL`), used for gateway
    /// return URLs.
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// SQLite database file (`DATABASE_FILE`). Parent directories are
    /// created on open.
    pub database_file: PathBuf,
}

/// Receipt and notification branding (`RESTAURANT_NAME`,
/// `RESTAURANT_TAGLINE`).
#[derive(Debug, Clone)]
pub struct BrandingConfig {
    pub name: String,
    pub tagline: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            name: "Fatima's Kitchen".to_string(),
            tagline: "Home-style meals | 423 Street 2, Block D, Lahore".to_string(),
        }
    }
}

/// JazzCash hosted-checkout credentials (`JAZZCASH_*`).
#[derive(Debug, Clone)]
pub struct JazzCashConfig {
    pub merchant_id: String,
    pub password: String,
    pub integrity_salt: String,
    pub signature_scheme: SignatureScheme,
}

/// EasyPaisa in-app wallet credentials (`EASYPAISA_*`).
#[derive(Debug, Clone)]
pub struct EasyPaisaConfig {
    pub store_id: String,
    pub shared_secret: String,
    pub signature_scheme: SignatureScheme,
}

/// Twilio-style SMS credentials (`TWILIO_*`).
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// SMTP credentials (`SMTP_*`). `from_address` falls back to the
/// username.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|name| std::env::var(name).ok())
    }

    /// Load from any variable source. Tests pass a map so they never
    /// mutate the process environment.
    pub fn from_lookup(
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", DEFAULT_PORT)?;
        let public_url = get("PUBLIC_URL").unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string());
        let database_file = PathBuf::from(
            get("DATABASE_FILE").unwrap_or_else(|| DEFAULT_DATABASE_FILE.to_string()),
        );

        let defaults = BrandingConfig::default();
        let branding = BrandingConfig {
            name: get("RESTAURANT_NAME").unwrap_or(defaults.name),
            tagline: get("RESTAURANT_TAGLINE").unwrap_or(defaults.tagline),
        };

        let jazzcash = match get("JAZZCASH_MERCHANT_ID") {
            Some(merchant_id) => Some(JazzCashConfig {
                merchant_id,
                password: companion(&get, "JAZZCASH_MERCHANT_ID", "JAZZCASH_PASSWORD")?,
                integrity_salt: companion(
                    &get,
                    "JAZZCASH_MERCHANT_ID",
                    "JAZZCASH_INTEGRITY_SALT",
                )?,
                signature_scheme: parse_scheme(&get, "JAZZCASH_SIGNATURE_SCHEME")?,
            }),
            None => None,
        };

        let easypaisa = match get("EASYPAISA_STORE_ID") {
            Some(store_id) => Some(EasyPaisaConfig {
                store_id,
                shared_secret: companion(&get, "EASYPAISA_STORE_ID", "EASYPAISA_SHARED_SECRET")?,
                signature_scheme: parse_scheme(&get, "EASYPAISA_SIGNATURE_SCHEME")?,
            }),
            None => None,
        };

        let twilio = match get("TWILIO_SID") {
            Some(account_sid) => Some(TwilioConfig {
                account_sid,
                auth_token: companion(&get, "TWILIO_SID", "TWILIO_TOKEN")?,
                from_number: companion(&get, "TWILIO_SID", "TWILIO_FROM")?,
            }),
            None => None,
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => {
                let username = companion(&get, "SMTP_HOST", "SMTP_USER")?;
                Some(SmtpConfig {
                    host,
                    port: parse_or(&get, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                    password: companion(&get, "SMTP_HOST", "SMTP_PASS")?,
                    from_address: get("SMTP_FROM").unwrap_or_else(|| username.clone()),
                    username,
                })
            }
            None => None,
        };

        Ok(Self {
            http: HttpConfig { port, public_url },
            storage: StorageConfig { database_file },
            branding,
            jazzcash,
            easypaisa,
            twilio,
            smtp,
        })
    }
}

fn parse_or<G>(get: &G, var: &str, default: u16) -> Result<u16, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
            message: "expected a port number".to_string(),
        }),
    }
}

fn parse_scheme<G>(get: &G, var: &str) -> Result<SignatureScheme, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(SignatureScheme::default()),
        Some(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
            message,
        }),
    }
}

fn companion<G>(get: &G, anchor: &str, var: &str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(var).ok_or_else(|| ConfigError::MissingCompanion {
        present: anchor.to_string(),
        missing: var.to_string(),
    })
}
