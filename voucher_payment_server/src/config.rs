use std::env;

use log::*;
use momo_gateway::MomoConfig;
use vpg_common::{helpers::parse_boolean_flag, Secret};

const DEFAULT_VPG_HOST: &str = "127.0.0.1";
const DEFAULT_VPG_PORT: u16 = 8460;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, IPN signature checks are skipped entirely. Debugging aid only. **DANGER**
    pub skip_signature_check: bool,
    /// The bookkeeping sheet webhook that receives each completed order exactly once.
    pub sheet_webhook_url: String,
    pub mail: MailConfig,
    pub momo: MomoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_VPG_HOST.to_string(),
            port: DEFAULT_VPG_PORT,
            database_url: String::default(),
            skip_signature_check: false,
            sheet_webhook_url: String::default(),
            mail: MailConfig::default(),
            momo: MomoConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("VPG_HOST").ok().unwrap_or_else(|| DEFAULT_VPG_HOST.into());
        let port = env::var("VPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for VPG_PORT. {e} Using the default, {DEFAULT_VPG_PORT}, instead."
                    );
                    DEFAULT_VPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_VPG_PORT);
        let database_url = env::var("VPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ VPG_DATABASE_URL is not set. Please set it to the URL for the order database.");
            String::default()
        });
        let skip_signature_check = parse_boolean_flag(env::var("VPG_SKIP_SIGNATURE_CHECK").ok(), false);
        if skip_signature_check {
            warn!(
                "🚨️🚨️🚨️ IPN signature checks are DISABLED (VPG_SKIP_SIGNATURE_CHECK). Anyone can mark orders as \
                 paid. Do not run production like this. 🚨️🚨️🚨️"
            );
        }
        let sheet_webhook_url = env::var("VPG_SHEET_WEBHOOK_URL").ok().unwrap_or_else(|| {
            error!("🪛️ VPG_SHEET_WEBHOOK_URL is not set. Completed orders cannot be forwarded to bookkeeping.");
            String::default()
        });
        let mail = MailConfig::from_env_or_default();
        let momo = MomoConfig::new_from_env_or_default();
        Self { host, port, database_url, skip_signature_check, sheet_webhook_url, mail, momo }
    }
}

//-------------------------------------------------  MailConfig  ------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct MailConfig {
    /// The mail relay endpoint that accepts `{from, to, subject, text}` posts.
    pub endpoint: String,
    pub api_key: Secret<String>,
    /// The from-address on notification mails.
    pub sender: String,
}

impl MailConfig {
    pub fn from_env_or_default() -> Self {
        let endpoint = env::var("VPG_MAIL_ENDPOINT").ok().unwrap_or_else(|| {
            warn!("🪛️ VPG_MAIL_ENDPOINT is not set. Notification emails will not be sent.");
            String::default()
        });
        let api_key = Secret::new(env::var("VPG_MAIL_API_KEY").ok().unwrap_or_else(|| {
            warn!("🪛️ VPG_MAIL_API_KEY is not set. The mail relay will likely reject our calls.");
            String::default()
        }));
        let sender = env::var("VPG_MAIL_SENDER").ok().unwrap_or_else(|| {
            warn!("🪛️ VPG_MAIL_SENDER is not set, using a placeholder from-address.");
            "no-reply@localhost".to_string()
        });
        Self { endpoint, api_key, sender }
    }
}

//-------------------------------------------------  GatewayAuth  -----------------------------------------------------
/// The subset of configuration the IPN handler needs to verify callback signatures. Kept small so
/// secrets are not passed around with the rest of the server configuration.
#[derive(Clone, Debug)]
pub struct GatewayAuth {
    pub access_key: String,
    pub secret_key: Secret<String>,
    pub skip_signature_check: bool,
}

impl GatewayAuth {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            access_key: config.momo.access_key.clone(),
            secret_key: config.momo.secret_key.clone(),
            skip_signature_check: config.skip_signature_check,
        }
    }
}
