//! HMAC-SHA256 signatures over canonically ordered field lists.
//!
//! The gateway signs every request and callback over a query-string rendering of a fixed,
//! channel-specific subset of the fields, joined as `key=value&key=value`. The field order differs
//! per channel and must be reproduced exactly; absent optional fields are rendered as empty
//! strings rather than omitted so that the canonical order never shifts. Numeric fields are
//! rendered in plain decimal with no grouping or currency formatting.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use vpg_common::Secret;

type HmacSha256 = Hmac<Sha256>;

/// Render the canonical string and return the lowercase hex HMAC-SHA256 over it.
pub fn sign(secret: &Secret<String>, fields: &[(&str, &str)]) -> String {
    let raw = canonical_string(fields);
    let mut mac = HmacSha256::new_from_slice(secret.reveal().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(raw.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a candidate signature against the canonical rendering of `fields`.
///
/// The comparison is constant-time ([`Mac::verify_slice`]). A candidate that is not valid hex
/// fails verification rather than erroring.
pub fn verify(secret: &Secret<String>, fields: &[(&str, &str)], candidate: &str) -> bool {
    let expected = match hex::decode(candidate) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let raw = canonical_string(fields);
    let mut mac = HmacSha256::new_from_slice(secret.reveal().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(raw.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn canonical_string(fields: &[(&str, &str)]) -> String {
    fields.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
}

/// Canonical field order for the create-payment request.
pub fn create_fields<'a>(
    access_key: &'a str,
    amount: &'a str,
    extra_data: &'a str,
    ipn_url: &'a str,
    order_id: &'a str,
    order_info: &'a str,
    partner_code: &'a str,
    redirect_url: &'a str,
    request_id: &'a str,
    request_type: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("accessKey", access_key),
        ("amount", amount),
        ("extraData", extra_data),
        ("ipnUrl", ipn_url),
        ("orderId", order_id),
        ("orderInfo", order_info),
        ("partnerCode", partner_code),
        ("redirectUrl", redirect_url),
        ("requestId", request_id),
        ("requestType", request_type),
    ]
}

/// Canonical field order for the IPN callback body. This is the larger of the two orders and
/// includes the settlement result fields.
#[allow(clippy::too_many_arguments)]
pub fn ipn_fields<'a>(
    access_key: &'a str,
    amount: &'a str,
    extra_data: &'a str,
    message: &'a str,
    order_id: &'a str,
    order_info: &'a str,
    order_type: &'a str,
    partner_code: &'a str,
    pay_type: &'a str,
    request_id: &'a str,
    response_time: &'a str,
    result_code: &'a str,
    trans_id: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("accessKey", access_key),
        ("amount", amount),
        ("extraData", extra_data),
        ("message", message),
        ("orderId", order_id),
        ("orderInfo", order_info),
        ("orderType", order_type),
        ("partnerCode", partner_code),
        ("payType", pay_type),
        ("requestId", request_id),
        ("responseTime", response_time),
        ("resultCode", result_code),
        ("transId", trans_id),
    ]
}

/// Canonical field order for the query-status request.
pub fn query_fields<'a>(
    access_key: &'a str,
    order_id: &'a str,
    partner_code: &'a str,
    request_id: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("accessKey", access_key),
        ("orderId", order_id),
        ("partnerCode", partner_code),
        ("requestId", request_id),
    ]
}

/// Canonical field order for the refund request.
pub fn refund_fields<'a>(
    access_key: &'a str,
    amount: &'a str,
    description: &'a str,
    order_id: &'a str,
    partner_code: &'a str,
    request_id: &'a str,
    trans_id: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("accessKey", access_key),
        ("amount", amount),
        ("description", description),
        ("orderId", order_id),
        ("partnerCode", partner_code),
        ("requestId", request_id),
        ("transId", trans_id),
    ]
}
