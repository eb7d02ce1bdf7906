//! Configuration management for Momenta.
//!
//! Loads configuration from environment variables with sensible defaults. Binaries
//! call `dotenvy::dotenv()` first so a local `.env` file works in development.

use crate::aggregates::inventory::ConsumePolicy;
use crate::pricing::PriceTable;
use crate::types::{Money, PaymentMethod};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server
    pub server: ServerConfig,
    /// Durable storage
    pub database: DatabaseConfig,
    /// Booking rules
    pub booking: BookingConfig,
    /// Customer email
    pub email: EmailConfig,
    /// Where customers send money
    pub payments: PaymentDestinations,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info,momenta=debug".to_string(),
        }
    }
}

/// `PostgreSQL` connection. Without a URL the state lives in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` connection string
    pub url: Option<String>,
    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

/// Pricing, quantity cap and oversell handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Price per seat by tier
    pub prices: PriceTable,
    /// Largest quantity a single booking may hold
    pub max_tickets_per_booking: u32,
    /// What approval does when a tier has fewer seats than the booking
    pub consume_policy: ConsumePolicy,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            prices: PriceTable::default(),
            max_tickets_per_booking: 10,
            consume_policy: ConsumePolicy::Clamp,
        }
    }
}

/// Sender identity and support contacts used in customer emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// `From:` header
    pub from_address: String,
    /// Prepended to every subject
    pub subject_prefix: String,
    /// Support address quoted in bodies
    pub support_email: String,
    /// Support phone quoted in bodies
    pub support_phone: String,
    /// Brand name used in greetings and signatures
    pub brand: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: "Momenta <tickets@example.com>".to_string(),
            subject_prefix: "[Momenta] ".to_string(),
            support_email: "support@example.com".to_string(),
            support_phone: "0970000000".to_string(),
            brand: "Momenta".to_string(),
        }
    }
}

/// Mobile-money numbers and bank account shown on the payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDestinations {
    /// MTN Mobile Money number
    pub mtn_number: String,
    /// Airtel Money number
    pub airtel_number: String,
    /// Zamtel Money number
    pub zamtel_number: String,
    /// Bank name
    pub bank_name: String,
    /// Bank account number
    pub bank_account_number: String,
    /// Bank account holder
    pub bank_account_name: String,
}

impl Default for PaymentDestinations {
    fn default() -> Self {
        Self {
            mtn_number: "0760000000".to_string(),
            airtel_number: "0970000001".to_string(),
            zamtel_number: "0950000000".to_string(),
            bank_name: "Example Bank".to_string(),
            bank_account_number: "0000000000000".to_string(),
            bank_account_name: "Momenta Events Ltd".to_string(),
        }
    }
}

impl PaymentDestinations {
    /// Mobile number for a mobile-money method, `None` for bank transfer
    #[must_use]
    pub fn mobile_number(&self, method: PaymentMethod) -> Option<&str> {
        match method {
            PaymentMethod::Mtn => Some(&self.mtn_number),
            PaymentMethod::Airtel => Some(&self.airtel_number),
            PaymentMethod::Zamtel => Some(&self.zamtel_number),
            PaymentMethod::Bank => None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults. Unparsable values are logged and
    /// replaced by the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        Self {
            server: ServerConfig {
                host: text("HOST", defaults.server.host),
                port: parsed(&lookup, "PORT", defaults.server.port),
                log_level: text("RUST_LOG", defaults.server.log_level),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
                max_connections: parsed(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
            },
            booking: BookingConfig {
                prices: PriceTable::new(
                    Money::new(parsed(&lookup, "PRICE_VIP", defaults.booking.prices.vip.amount())),
                    Money::new(parsed(&lookup, "PRICE_GOLD", defaults.booking.prices.gold.amount())),
                    Money::new(parsed(
                        &lookup,
                        "PRICE_STANDARD",
                        defaults.booking.prices.standard.amount(),
                    )),
                ),
                max_tickets_per_booking: parsed(
                    &lookup,
                    "MAX_TICKETS_PER_BOOKING",
                    defaults.booking.max_tickets_per_booking,
                ),
                consume_policy: parsed(
                    &lookup,
                    "INVENTORY_CONSUME_POLICY",
                    defaults.booking.consume_policy,
                ),
            },
            email: EmailConfig {
                from_address: text("DEFAULT_FROM_EMAIL", defaults.email.from_address),
                subject_prefix: text("EMAIL_SUBJECT_PREFIX", defaults.email.subject_prefix),
                support_email: text("SUPPORT_EMAIL", defaults.email.support_email),
                support_phone: text("SUPPORT_PHONE", defaults.email.support_phone),
                brand: text("BRAND_NAME", defaults.email.brand),
            },
            payments: PaymentDestinations {
                mtn_number: text("MTN_NUMBER", defaults.payments.mtn_number),
                airtel_number: text("AIRTEL_NUMBER", defaults.payments.airtel_number),
                zamtel_number: text("ZAMTEL_NUMBER", defaults.payments.zamtel_number),
                bank_name: text("BANK_NAME", defaults.payments.bank_name),
                bank_account_number: text(
                    "BANK_ACCOUNT_NUMBER",
                    defaults.payments.bank_account_number,
                ),
                bank_account_name: text("BANK_ACCOUNT_NAME", defaults.payments.bank_account_name),
            },
        }
    }

    /// Socket address string for the HTTP listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|error| {
            tracing::warn!(key, value = %raw, %error, "Ignoring invalid configuration value");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_published_prices() {
        let config = config_from(&[]);
        assert_eq!(config.booking.prices, PriceTable::default());
        assert_eq!(config.booking.max_tickets_per_booking, 10);
        assert_eq!(config.booking.consume_policy, ConsumePolicy::Clamp);
        assert_eq!(config.email.subject_prefix, "[Momenta] ");
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn database_url_enables_postgres() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://momenta@localhost/momenta"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ]);
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://momenta@localhost/momenta")
        );
        assert_eq!(config.database.max_connections, 4);

        assert_eq!(config_from(&[("DATABASE_URL", "  ")]).database.url, None);
    }

    #[test]
    fn default_contacts_are_placeholders() {
        let config = config_from(&[]);
        for address in [&config.email.from_address, &config.email.support_email] {
            assert!(address.contains("@example.com"), "{address}");
        }
        assert!(config.payments.bank_account_number.chars().all(|c| c == '0'));
        for method in [PaymentMethod::Mtn, PaymentMethod::Airtel, PaymentMethod::Zamtel] {
            let number = config.payments.mobile_number(method).unwrap_or_default();
            assert!(number.ends_with("000000") || number.ends_with("000001"), "{number}");
        }
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("PRICE_VIP", "2000"),
            ("MAX_TICKETS_PER_BOOKING", "4"),
            ("INVENTORY_CONSUME_POLICY", "strict"),
            ("MTN_NUMBER", "0761234567"),
        ]);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.booking.prices.vip, Money::new(2000));
        assert_eq!(config.booking.prices.gold, Money::new(850));
        assert_eq!(config.booking.max_tickets_per_booking, 4);
        assert_eq!(config.booking.consume_policy, ConsumePolicy::Strict);
        assert_eq!(
            config.payments.mobile_number(PaymentMethod::Mtn),
            Some("0761234567")
        );
        assert_eq!(config.payments.mobile_number(PaymentMethod::Bank), None);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "eighty"), ("INVENTORY_CONSUME_POLICY", "hold")]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.booking.consume_policy, ConsumePolicy::Clamp);
    }
}
