use std::{env, net::IpAddr};

use chrono::Duration;
use cpg_common::helpers::parse_boolean_flag;
use log::*;
use paystack_tools::PaystackConfig as PaystackApiConfig;

const DEFAULT_CPG_HOST: &str = "127.0.0.1";
const DEFAULT_CPG_PORT: u16 = 8360;
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(48);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The time before a pending, unpaid order is cancelled by the expiry worker.
    pub unpaid_order_timeout: Duration,
    /// Paystack gateway configuration
    pub paystack_config: PaystackConfig,
}

#[derive(Clone, Debug, Default)]
pub struct PaystackConfig {
    /// Connection settings for the outbound Paystack client (API URL and secret key). Paystack signs webhook
    /// deliveries with the same secret key.
    pub api_config: PaystackApiConfig,
    /// When false, webhook signature verification is skipped. Local development only.
    pub signature_checks: bool,
    /// If supplied, requests against /paystack endpoints will be checked against a whitelist of gateway IP
    /// addresses. To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CPG_HOST.to_string(),
            port: DEFAULT_CPG_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
            paystack_config: PaystackConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CPG_HOST").ok().unwrap_or_else(|| DEFAULT_CPG_HOST.into());
        let port = env::var("CPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CPG_PORT. {e} Using the default, {DEFAULT_CPG_PORT}, instead."
                    );
                    DEFAULT_CPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CPG_PORT);
        let database_url = env::var("CPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_DATABASE_URL is not set. Please set it to the URL for the CPG database.");
            String::default()
        });
        let paystack_config = PaystackConfig::from_env_or_defaults();
        let use_x_forwarded_for = parse_boolean_flag(env::var("CPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("CPG_USE_FORWARDED").ok(), false);
        let unpaid_order_timeout = configure_unpaid_order_timeout();
        Self { host, port, database_url, use_x_forwarded_for, use_forwarded, unpaid_order_timeout, paystack_config }
    }
}

impl PaystackConfig {
    pub fn from_env_or_defaults() -> Self {
        let api_config = PaystackApiConfig::new_from_env_or_default();
        let signature_checks = parse_boolean_flag(env::var("CPG_PAYSTACK_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️ Webhook signature checks are DISABLED. Anyone who can reach this server can mark orders as \
                 paid. Do not run a production instance like this."
            );
        }
        let whitelist = env::var("CPG_PAYSTACK_IP_WHITELIST").ok().and_then(|s| {
            if ["none", "false", "0"].contains(&s.to_lowercase().as_str()) {
                info!(
                    "🪛️ Paystack IP whitelist is disabled. If this is not what you want, set \
                     CPG_PAYSTACK_IP_WHITELIST to a comma-separated list of IP addresses to enable it."
                );
                return None;
            }
            let ip_addrs = s
                .split(',')
                .filter_map(|s| {
                    s.trim()
                        .parse()
                        .map_err(|e| {
                            warn!("🪛️ Ignoring invalid IP address ({s}) in CPG_PAYSTACK_IP_WHITELIST: {e}");
                            None::<IpAddr>
                        })
                        .ok()
                })
                .collect::<Vec<IpAddr>>();
            Some(ip_addrs)
        });
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The Paystack IP whitelist was configured, but is empty. The server will run, but won't \
                     accept any webhook deliveries."
                );
            },
            None => {
                info!("🪛️ No Paystack IP whitelist is set. Only webhook signature validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Paystack IP whitelist: {addrs}");
            },
        }
        Self { api_config, signature_checks, whitelist }
    }
}

fn configure_unpaid_order_timeout() -> Duration {
    env::var("CPG_UNPAID_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ CPG_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for CPG_UNPAID_ORDER_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT)
}
