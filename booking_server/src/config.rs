use std::{env, net::IpAddr, time::Duration};

use booking_engine::{OptionalColumnPolicy, PollSchedule};
use log::*;
use stripe_tools::{webhook::DEFAULT_TOLERANCE_SECS, StripeConfig};
use tbp_common::{env_duration_ms, env_flag, env_or_default, Secret};

const DEFAULT_TBP_HOST: &str = "127.0.0.1";
const DEFAULT_TBP_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/booking_store.db";
const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAIL_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAIL_FROM: &str = "bookings@localhost";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Apply the embedded schema migrations at startup
    pub run_migrations: bool,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The payment gateway REST API
    pub gateway: StripeConfig,
    /// If supplied, requests against /webhook endpoints will be checked against a whitelist of gateway IP addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub gateway_whitelist: Option<Vec<IpAddr>>,
    /// How far the signed timestamp of a webhook may drift from the local clock, in seconds.
    pub webhook_tolerance_secs: i64,
    pub sequence_rpc: SequenceRpcConfig,
    pub mail: MailConfig,
    /// The bounded wait used by the confirmation endpoint
    pub confirm_schedule: PollSchedule,
    /// Whether the server may start against a reservations table without the optional columns
    pub column_policy: OptionalColumnPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TBP_HOST.to_string(),
            port: DEFAULT_TBP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            run_migrations: true,
            use_x_forwarded_for: false,
            use_forwarded: false,
            gateway: StripeConfig::default(),
            gateway_whitelist: None,
            webhook_tolerance_secs: DEFAULT_TOLERANCE_SECS,
            sequence_rpc: SequenceRpcConfig::default(),
            mail: MailConfig::default(),
            confirm_schedule: PollSchedule::default(),
            column_policy: OptionalColumnPolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TBP_HOST").ok().unwrap_or_else(|| DEFAULT_TBP_HOST.into());
        let port = env_or_default("TBP_PORT", DEFAULT_TBP_PORT);
        let database_url = env::var("TBP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ TBP_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let run_migrations = env_flag("TBP_RUN_MIGRATIONS", true);
        let use_x_forwarded_for = env_flag("TBP_USE_X_FORWARDED_FOR", false);
        let use_forwarded = env_flag("TBP_USE_FORWARDED", false);
        let gateway = StripeConfig::new_from_env_or_default();
        if gateway.secret_key.is_empty() {
            error!("🪛️ TBP_GATEWAY_API_KEY is not set. Payments cannot be verified, so no reservations will be made.");
        }
        let gateway_whitelist = parse_whitelist(env::var("TBP_GATEWAY_IP_WHITELIST").ok());
        let webhook_tolerance_secs = env_or_default("TBP_WEBHOOK_TOLERANCE_SECS", DEFAULT_TOLERANCE_SECS);
        let sequence_rpc = SequenceRpcConfig::from_env_or_default();
        let mail = MailConfig::from_env_or_default();
        let confirm_schedule = poll_schedule_from_env();
        let column_policy = OptionalColumnPolicy {
            allow_missing_phone: env_flag("TBP_ALLOW_MISSING_PHONE_COLUMN", false),
            allow_missing_pickup: env_flag("TBP_ALLOW_MISSING_PICKUP_COLUMNS", false),
        };
        Self {
            host,
            port,
            database_url,
            run_migrations,
            use_x_forwarded_for,
            use_forwarded,
            gateway,
            gateway_whitelist,
            webhook_tolerance_secs,
            sequence_rpc,
            mail,
            confirm_schedule,
            column_policy,
        }
    }
}

fn poll_schedule_from_env() -> PollSchedule {
    let default = PollSchedule::default();
    let schedule = PollSchedule {
        initial_delay: env_duration_ms("TBP_CONFIRM_INITIAL_DELAY_MS", default.initial_delay),
        interval: env_duration_ms("TBP_CONFIRM_POLL_INTERVAL_MS", default.interval),
        max_checks: env_or_default("TBP_CONFIRM_MAX_CHECKS", default.max_checks),
        deadline: env_duration_ms("TBP_CONFIRM_DEADLINE_MS", default.deadline),
    };
    info!(
        "🪛️ Confirmation wait: first re-check after {:?}, then every {:?}, at most {} re-checks, {:?} in total",
        schedule.initial_delay, schedule.interval, schedule.max_checks, schedule.deadline
    );
    schedule
}

/// Parses a comma-separated list of IP addresses. `None` means "no whitelist", whereas an empty list locks everyone
/// out.
pub fn parse_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
            info!(
                "🪛️ Gateway IP whitelist is disabled. If this is not what you want, set TBP_GATEWAY_IP_WHITELIST to \
                 a comma-separated list of IP addresses to enable it."
            );
            return None;
        }
        let ip_addrs = s
            .split(',')
            .map(str::trim)
            .filter_map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in TBP_GATEWAY_IP_WHITELIST: {e}"))
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The gateway IP whitelist was configured, but is empty. The server will run, but won't authorise \
                 any incoming webhooks."
            );
        },
        None => {
            info!("🪛️ No gateway IP whitelist is set. Only signature checks will be used.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Gateway IP whitelist: {addrs}");
        },
    }
    whitelist
}

//-------------------------------------------------  SequenceRpcConfig  ------------------------------------------------
/// The remote reservation number service. When no URL is configured, every number comes from the local counter.
#[derive(Clone, Debug)]
pub struct SequenceRpcConfig {
    pub url: Option<String>,
    pub api_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for SequenceRpcConfig {
    fn default() -> Self {
        Self { url: None, api_key: Secret::default(), timeout: DEFAULT_RPC_TIMEOUT }
    }
}

impl SequenceRpcConfig {
    pub fn from_env_or_default() -> Self {
        let url = env::var("TBP_SEQUENCE_RPC_URL").ok().filter(|s| !s.trim().is_empty());
        if url.is_none() {
            info!("🪛️ TBP_SEQUENCE_RPC_URL is not set. Reservation numbers will come from the local counters.");
        }
        let api_key = Secret::new(env::var("TBP_SEQUENCE_RPC_KEY").unwrap_or_default());
        let timeout = env_duration_ms("TBP_SEQUENCE_RPC_TIMEOUT_MS", DEFAULT_RPC_TIMEOUT);
        Self { url, api_key, timeout }
    }
}

//-------------------------------------------------  MailConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct MailConfig {
    /// The mail service endpoint that accepts templated messages
    pub api_url: Option<String>,
    pub api_key: Secret<String>,
    pub from: String,
    /// When false, notifications are logged instead of sent
    pub enabled: bool,
    pub timeout: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: Secret::default(),
            from: DEFAULT_MAIL_FROM.to_string(),
            enabled: false,
            timeout: DEFAULT_MAIL_TIMEOUT,
        }
    }
}

impl MailConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("TBP_MAIL_API_URL").ok().filter(|s| !s.trim().is_empty());
        let api_key = Secret::new(env::var("TBP_MAIL_API_KEY").unwrap_or_default());
        let from = env::var("TBP_MAIL_FROM").ok().unwrap_or_else(|| {
            warn!("🪛️ TBP_MAIL_FROM is not set. Using {DEFAULT_MAIL_FROM}.");
            DEFAULT_MAIL_FROM.into()
        });
        let enabled = env_flag("TBP_NOTIFICATIONS_ENABLED", true) && api_url.is_some();
        if !enabled {
            warn!("🪛️ Notifications are disabled. Set TBP_MAIL_API_URL and TBP_NOTIFICATIONS_ENABLED to send them.");
        }
        Self { api_url, api_key, from, enabled, timeout: DEFAULT_MAIL_TIMEOUT }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that request handlers need. Generally we try to keep this as small as
/// possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub webhook_tolerance_secs: i64,
    pub confirm_schedule: PollSchedule,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            webhook_tolerance_secs: config.webhook_tolerance_secs,
            confirm_schedule: config.confirm_schedule,
        }
    }
}
