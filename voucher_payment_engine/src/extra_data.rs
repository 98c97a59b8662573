//! The extra-data token: an opaque, gateway-echoed carrier for the buyer fields the gateway does
//! not store.
//!
//! The token is base64 over a short-keyed JSON object. The carrier channel enforces a hard byte
//! ceiling on the underlying JSON, so [`encode`] greedily truncates the trimmable fields in a
//! fixed priority order (message first, then emails, then names, then the service name) until the
//! payload fits, dropping a field entirely once nothing of it remains. Truncation is lossy by
//! design; the token is best-effort metadata, never a required input, and [`decode`] returns
//! "no data" for anything it cannot read.

use serde::{Deserialize, Serialize};

use crate::db_types::FormData;

/// Hard ceiling on the JSON payload carried inside the token.
pub const MAX_PAYLOAD_BYTES: usize = 180;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct TokenPayload {
    #[serde(rename = "sn", skip_serializing_if = "Option::is_none")]
    sender_name: Option<String>,
    #[serde(rename = "sp", skip_serializing_if = "Option::is_none")]
    sender_phone: Option<String>,
    #[serde(rename = "se", skip_serializing_if = "Option::is_none")]
    sender_email: Option<String>,
    #[serde(rename = "rn", skip_serializing_if = "Option::is_none")]
    recipient_name: Option<String>,
    #[serde(rename = "rp", skip_serializing_if = "Option::is_none")]
    recipient_phone: Option<String>,
    #[serde(rename = "re", skip_serializing_if = "Option::is_none")]
    recipient_email: Option<String>,
    #[serde(rename = "m", skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(rename = "sv", skip_serializing_if = "Option::is_none")]
    service_name: Option<String>,
}

impl TokenPayload {
    fn is_empty(&self) -> bool {
        self.encoded_len() <= 2
    }

    fn encoded_len(&self) -> usize {
        serde_json::to_string(self).map(|s| s.len()).unwrap_or(0)
    }

    // Trim slots in priority order. Phone numbers are short and never trimmed.
    fn trim_slot(&mut self, index: usize) -> Option<&mut Option<String>> {
        match index {
            0 => Some(&mut self.message),
            1 => Some(&mut self.sender_email),
            2 => Some(&mut self.recipient_email),
            3 => Some(&mut self.sender_name),
            4 => Some(&mut self.recipient_name),
            5 => Some(&mut self.service_name),
            _ => None,
        }
    }
}

/// Encode the buyer fields into a token that fits the carrier's byte ceiling.
///
/// Returns an empty token when there is nothing to carry.
pub fn encode(form_data: Option<&FormData>, service_name: Option<&str>) -> String {
    let mut payload = TokenPayload {
        service_name: service_name.map(|s| s.to_string()).filter(|s| !s.is_empty()),
        ..TokenPayload::default()
    };
    if let Some(fd) = form_data {
        payload.sender_name = fd.sender_name.clone().filter(|s| !s.is_empty());
        payload.sender_phone = fd.sender_phone.clone().filter(|s| !s.is_empty());
        payload.sender_email = fd.sender_email.clone().filter(|s| !s.is_empty());
        payload.recipient_name = fd.recipient_name.clone().filter(|s| !s.is_empty());
        payload.recipient_phone = fd.recipient_phone.clone().filter(|s| !s.is_empty());
        payload.recipient_email = fd.recipient_email.clone().filter(|s| !s.is_empty());
        payload.message = fd.message.clone().filter(|s| !s.is_empty());
    }
    if payload.is_empty() {
        return String::new();
    }
    let mut slot = 0;
    while payload.encoded_len() > MAX_PAYLOAD_BYTES {
        let excess = payload.encoded_len() - MAX_PAYLOAD_BYTES;
        let Some(field) = payload.trim_slot(slot) else {
            // Nothing left to trim; the fixed fields alone exceed the ceiling. Ship it anyway.
            break;
        };
        match field.take() {
            Some(value) if value.len() > excess => {
                let kept = truncate_to_boundary(&value, value.len() - excess);
                if kept.is_empty() {
                    slot += 1;
                } else {
                    *field = Some(kept.to_string());
                }
            },
            _ => {
                slot += 1;
            },
        }
    }
    match serde_json::to_string(&payload) {
        Ok(json) => base64::encode(json),
        Err(_) => String::new(),
    }
}

/// Best-effort decode of a gateway-echoed token. Anything unreadable is treated as "no data".
pub fn decode(token: &str) -> (Option<FormData>, Option<String>) {
    if token.is_empty() {
        return (None, None);
    }
    let Ok(raw) = base64::decode(token) else {
        return (None, None);
    };
    let Ok(payload) = serde_json::from_slice::<TokenPayload>(&raw) else {
        return (None, None);
    };
    let form_data = FormData {
        sender_name: payload.sender_name,
        sender_phone: payload.sender_phone,
        sender_email: payload.sender_email,
        recipient_name: payload.recipient_name,
        recipient_phone: payload.recipient_phone,
        recipient_email: payload.recipient_email,
        message: payload.message,
    };
    let form_data = if form_data.is_empty() { None } else { Some(form_data) };
    (form_data, payload.service_name)
}

/// Cut `s` down to at most `max_bytes`, backing up to the nearest character boundary.
fn truncate_to_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
