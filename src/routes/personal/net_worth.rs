// Net worth calculator: assets minus liabilities with achievement badges.
// Badge keys are stored on the document and translated at render time.

use std::{sync::Arc, time::SystemTime};

use askama::Template;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Response},
};
use mongodb::bson::DateTime;
use serde::Deserialize;

use crate::error::AppError;
use crate::format::format_currency;
use crate::i18n::trans;
use crate::mailer;
use crate::models::NetWorthRecord;
use crate::routes::helpers::{clean_opt, parse_f64_field, parse_optional_f64_field, render};
use crate::session::ToolVisitor;
use crate::state::{AppState, insert_net_worth, log_tool_usage};

#[derive(Template)]
#[template(path = "personal/net_worth.html")]
struct NetWorthTemplate {
    errors: Option<String>,
}

#[derive(Template)]
#[template(path = "personal/net_worth_result.html")]
struct NetWorthResultTemplate {
    first_name: String,
    total_assets: String,
    total_liabilities: String,
    net_worth: String,
    badges: Vec<String>,
}

#[derive(Deserialize)]
pub struct NetWorthForm {
    first_name: String,
    cash_savings: String,
    investments: String,
    property: String,
    #[serde(default)]
    loans: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    send_email: Option<String>,
}

pub struct NetWorthSummary {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    pub badges: Vec<&'static str>,
}

pub fn summarize(cash_savings: f64, investments: f64, property: f64, loans: f64) -> NetWorthSummary {
    let total_assets = cash_savings + investments + property;
    let total_liabilities = loans;
    let net_worth = total_assets - total_liabilities;

    let mut badges = Vec::new();
    if net_worth > 0.0 {
        badges.push("net_worth_badge_wealth_builder");
    }
    if total_liabilities == 0.0 {
        badges.push("net_worth_badge_debt_free");
    }
    if cash_savings >= total_assets * 0.3 {
        badges.push("net_worth_badge_savings_champion");
    }
    if property >= total_assets * 0.5 {
        badges.push("net_worth_badge_property_mogul");
    }

    NetWorthSummary {
        total_assets,
        total_liabilities,
        net_worth,
        badges,
    }
}

pub async fn net_worth_page(visitor: ToolVisitor) -> Result<Response, AppError> {
    let mut response = render(NetWorthTemplate { errors: None })?.into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

pub async fn net_worth_submit(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Form(form): Form<NetWorthForm>,
) -> Result<Response, AppError> {
    let lang = visitor.lang;
    let parsed = (|| -> Result<(f64, f64, f64, f64), String> {
        if form.first_name.trim().is_empty() {
            return Err("First name is required".to_string());
        }
        Ok((
            parse_f64_field(&form.cash_savings, "Cash savings")?,
            parse_f64_field(&form.investments, "Investments")?,
            parse_f64_field(&form.property, "Property")?,
            parse_optional_f64_field(form.loans.clone(), "Loans")?.unwrap_or(0.0),
        ))
    })();
    let (cash_savings, investments, property, loans) = match parsed {
        Ok(values) => values,
        Err(msg) => {
            let mut response = render(NetWorthTemplate { errors: Some(msg) })?.into_response();
            visitor.attach_cookie(&mut response);
            return Ok(response);
        }
    };

    let summary = summarize(cash_savings, investments, property, loans);
    let badges: Vec<String> = summary.badges.iter().map(|b| b.to_string()).collect();

    let record = NetWorthRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: visitor.user_id().map(str::to_string),
        session_id: visitor.session_id.clone(),
        first_name: form.first_name.trim().to_string(),
        email: clean_opt(form.email.clone()),
        send_email: form.send_email.is_some(),
        cash_savings,
        investments,
        property,
        loans,
        total_assets: summary.total_assets,
        total_liabilities: summary.total_liabilities,
        net_worth: summary.net_worth,
        badges: badges.clone(),
        created_at: DateTime::from_system_time(SystemTime::now()),
    };
    insert_net_worth(&state, &record).await?;
    log_tool_usage(
        &state,
        "net_worth",
        visitor.user_id(),
        &visitor.session_id,
        "calculate_net_worth",
    )
    .await?;

    if record.send_email {
        if let Some(email) = record.email.as_deref() {
            mailer::send_tool_result_email(
                email,
                "Your Net Worth Summary",
                &format!(
                    "Total assets: {}\nTotal liabilities: {}\nNet worth: {}",
                    format_currency(summary.total_assets),
                    format_currency(summary.total_liabilities),
                    format_currency(summary.net_worth),
                ),
            )
            .await;
        }
    }

    let mut response = render(NetWorthResultTemplate {
        first_name: record.first_name.clone(),
        total_assets: format_currency(summary.total_assets),
        total_liabilities: format_currency(summary.total_liabilities),
        net_worth: format_currency(summary.net_worth),
        badges: badges.iter().map(|b| trans(b, lang)).collect(),
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_totals_and_badges() {
        let summary = summarize(50000.0, 20000.0, 100000.0, 30000.0);
        assert_eq!(summary.total_assets, 170000.0);
        assert_eq!(summary.net_worth, 140000.0);
        assert!(summary.badges.contains(&"net_worth_badge_wealth_builder"));
        assert!(!summary.badges.contains(&"net_worth_badge_debt_free"));
    }

    #[test]
    fn debt_free_badge_requires_zero_loans() {
        let summary = summarize(40000.0, 0.0, 40000.0, 0.0);
        assert!(summary.badges.contains(&"net_worth_badge_debt_free"));
        assert!(summary.badges.contains(&"net_worth_badge_savings_champion"));
        assert!(summary.badges.contains(&"net_worth_badge_property_mogul"));
    }
}
