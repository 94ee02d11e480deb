// mailer.rs
// Transactional email through the MailerSend HTTP API.

use anyhow::{Result, bail};
use serde_json::json;
use std::env;

const MAILERSEND_URL: &str = "https://api.mailersend.com/v1/email";

/// Send a plain-text email. Fails cleanly when the API token is missing so
/// callers can decide whether delivery is required (OTP) or best-effort
/// (tool-result emails).
pub async fn send_email(to: &str, subject: &str, body: &str) -> Result<()> {
    let Ok(token) = env::var("MAILERSEND_API_TOKEN") else {
        bail!("MAILERSEND_API_TOKEN not configured");
    };
    let from = env::var("MAILERSEND_FROM").unwrap_or_else(|_| "noreply@ficore.app".to_string());

    let payload = json!({
        "from": { "email": from },
        "to": [ { "email": to } ],
        "subject": subject,
        "text": body,
    });

    let client = reqwest::Client::new();
    let response = client
        .post(MAILERSEND_URL)
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        bail!("mailersend returned {status}: {text}");
    }
    Ok(())
}

pub async fn send_otp_email(to: &str, otp: &str) -> Result<()> {
    send_email(
        to,
        "Your One-Time Password",
        &format!("Your OTP is {otp}. It expires in 5 minutes."),
    )
    .await
}

pub async fn send_reset_email(to: &str, base_url: &str, token: &str) -> Result<()> {
    send_email(
        to,
        "Reset Your Password",
        &format!("Use this link to reset your password: {base_url}/reset-password?token={token}\nThe link expires in one hour."),
    )
    .await
}

/// Best-effort result email from the personal-finance tools.
pub async fn send_tool_result_email(to: &str, tool_title: &str, summary: &str) {
    if let Err(err) = send_email(to, tool_title, summary).await {
        tracing::warn!("tool result email to {to} failed: {err:?}");
    }
}
