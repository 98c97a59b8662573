use log::*;
use vpg_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct MomoConfig {
    /// Base URL of the gateway, e.g. "https://payment.momo.vn"
    pub endpoint: String,
    pub partner_code: String,
    pub access_key: String,
    pub secret_key: Secret<String>,
    /// Where the gateway redirects the buyer's browser after payment.
    pub redirect_url: String,
    /// Where the gateway posts the asynchronous IPN callback.
    pub ipn_url: String,
}

impl MomoConfig {
    pub fn new_from_env_or_default() -> Self {
        let endpoint = std::env::var("VPG_MOMO_ENDPOINT").unwrap_or_else(|_| {
            warn!("💳️ VPG_MOMO_ENDPOINT not set, using the production gateway URL as default");
            "https://payment.momo.vn".to_string()
        });
        let partner_code = std::env::var("VPG_MOMO_PARTNER_CODE").unwrap_or_else(|_| {
            error!("💳️ VPG_MOMO_PARTNER_CODE is not set. Gateway calls will be rejected.");
            String::default()
        });
        let access_key = std::env::var("VPG_MOMO_ACCESS_KEY").unwrap_or_else(|_| {
            error!("💳️ VPG_MOMO_ACCESS_KEY is not set. Gateway calls will be rejected.");
            String::default()
        });
        let secret_key = Secret::new(std::env::var("VPG_MOMO_SECRET_KEY").unwrap_or_else(|_| {
            error!("💳️ VPG_MOMO_SECRET_KEY is not set. Signatures will not validate.");
            String::default()
        }));
        let redirect_url = std::env::var("VPG_MOMO_REDIRECT_URL").unwrap_or_else(|_| {
            warn!("💳️ VPG_MOMO_REDIRECT_URL not set, using (probably useless) default");
            "http://localhost/payment/result".to_string()
        });
        let ipn_url = std::env::var("VPG_MOMO_IPN_URL").unwrap_or_else(|_| {
            warn!("💳️ VPG_MOMO_IPN_URL not set, using (probably useless) default");
            "http://localhost/payment/ipn".to_string()
        });
        Self { endpoint, partner_code, access_key, secret_key, redirect_url, ipn_url }
    }
}
