// sms.rs
// Outbound reminder messages: Africa's Talking SMS, plus a WhatsApp stub.

use anyhow::Result;
use std::{collections::HashMap, env};

const AFRICAS_TALKING_URL: &str = "https://api.africastalking.com/version1/messaging";

pub struct SmsOutcome {
    pub success: bool,
    pub api_response: Option<String>,
}

/// Ensure the recipient carries the Nigerian country code.
pub fn normalize_recipient(recipient: &str) -> String {
    if recipient.starts_with('+') || recipient.starts_with("234") {
        recipient.to_string()
    } else if let Some(rest) = recipient.strip_prefix('0') {
        format!("234{rest}")
    } else {
        format!("234{recipient}")
    }
}

pub async fn send_sms_reminder(recipient: &str, message: &str) -> Result<SmsOutcome> {
    let Ok(api_key) = env::var("AFRICAS_TALKING_API_KEY") else {
        tracing::warn!("Africa's Talking API key not configured");
        return Ok(SmsOutcome {
            success: false,
            api_response: Some("SMS service not configured".to_string()),
        });
    };
    let username =
        env::var("AFRICAS_TALKING_USERNAME").unwrap_or_else(|_| "sandbox".to_string());

    let recipient = normalize_recipient(recipient);
    let mut form = HashMap::new();
    form.insert("username", username);
    form.insert("to", recipient);
    form.insert("message", message.to_string());

    let client = reqwest::Client::new();
    let response = client
        .post(AFRICAS_TALKING_URL)
        .header("Accept", "application/json")
        .header("apikey", api_key)
        .form(&form)
        .send()
        .await?;

    let body: serde_json::Value = response.json().await?;
    let success = body
        .pointer("/SMSMessageData/Recipients/0/status")
        .and_then(|s| s.as_str())
        .map(|s| s == "Success")
        .unwrap_or(false);

    Ok(SmsOutcome {
        success,
        api_response: Some(body.to_string()),
    })
}

/// WhatsApp delivery is not wired up yet; log and report success so the
/// calling flow can be exercised end to end.
pub async fn send_whatsapp_reminder(recipient: &str, message: &str) -> Result<SmsOutcome> {
    tracing::info!("whatsapp reminder to {recipient}: {message}");
    Ok(SmsOutcome {
        success: true,
        api_response: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_nigerian_numbers() {
        assert_eq!(normalize_recipient("08012345678"), "2348012345678");
        assert_eq!(normalize_recipient("8012345678"), "2348012345678");
        assert_eq!(normalize_recipient("2348012345678"), "2348012345678");
        assert_eq!(normalize_recipient("+2348012345678"), "+2348012345678");
    }
}
