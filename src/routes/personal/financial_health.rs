// Financial health score: debt-to-income, savings rate and interest burden
// folded into a 0-100 score. Zero income is rejected outright.

use std::{sync::Arc, time::SystemTime};

use askama::Template;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Response},
};
use mongodb::bson::DateTime;
use serde::Deserialize;

use crate::error::AppError;
use crate::i18n::trans;
use crate::mailer;
use crate::models::HealthScoreRecord;
use crate::routes::helpers::{clean_opt, parse_f64_field, render};
use crate::session::ToolVisitor;
use crate::state::{AppState, average_health_score, insert_health_score, log_tool_usage};

#[derive(Template)]
#[template(path = "personal/financial_health.html")]
struct FinancialHealthTemplate {
    errors: Option<String>,
}

#[derive(Template)]
#[template(path = "personal/financial_health_result.html")]
struct FinancialHealthResultTemplate {
    first_name: String,
    score: i32,
    status: String,
    debt_to_income: String,
    savings_rate: String,
    interest_burden: String,
    badges: Vec<String>,
    average_score: String,
}

#[derive(Deserialize)]
pub struct FinancialHealthForm {
    first_name: String,
    income: String,
    expenses: String,
    debt: String,
    interest_rate: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    send_email: Option<String>,
}

pub struct HealthScore {
    pub debt_to_income: f64,
    pub savings_rate: f64,
    pub interest_burden: f64,
    pub score: i32,
    pub status_key: &'static str,
    pub badge_keys: Vec<&'static str>,
}

/// Score formula. Callers must reject income <= 0 before calling.
pub fn score_health(income: f64, expenses: f64, debt: f64, interest_rate: f64) -> HealthScore {
    let debt_to_income = debt / income * 100.0;
    let savings_rate = (income - expenses) / income * 100.0;
    let interest_burden = if debt > 0.0 {
        ((interest_rate * debt / 100.0) / 12.0) / income * 100.0
    } else {
        0.0
    };

    let mut score = 100.0;
    if debt_to_income > 0.0 {
        score -= (debt_to_income / 50.0).min(50.0);
    }
    if savings_rate < 0.0 {
        score -= savings_rate.abs().min(30.0);
    } else if savings_rate > 0.0 {
        score += (savings_rate / 2.0).min(20.0);
    }
    score -= interest_burden.min(20.0);
    let score = (score.round() as i32).clamp(0, 100);

    let status_key = if score >= 80 {
        "financial_health_status_excellent"
    } else if score >= 60 {
        "financial_health_status_good"
    } else {
        "financial_health_status_needs_improvement"
    };

    let mut badge_keys = Vec::new();
    if score >= 80 {
        badge_keys.push("financial_health_badge_financial_star");
    }
    if debt_to_income < 20.0 {
        badge_keys.push("financial_health_badge_debt_manager");
    }
    if savings_rate >= 20.0 {
        badge_keys.push("financial_health_badge_savings_pro");
    }
    if interest_burden == 0.0 && debt > 0.0 {
        badge_keys.push("financial_health_badge_interest_free");
    }

    HealthScore {
        debt_to_income,
        savings_rate,
        interest_burden,
        score,
        status_key,
        badge_keys,
    }
}

pub async fn financial_health_page(visitor: ToolVisitor) -> Result<Response, AppError> {
    let mut response = render(FinancialHealthTemplate { errors: None })?.into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

pub async fn financial_health_submit(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Form(form): Form<FinancialHealthForm>,
) -> Result<Response, AppError> {
    let lang = visitor.lang;

    let reshow = |visitor: &ToolVisitor, msg: String| -> Result<Response, AppError> {
        let mut response =
            render(FinancialHealthTemplate { errors: Some(msg) })?.into_response();
        visitor.attach_cookie(&mut response);
        Ok(response)
    };

    let parsed = (|| -> Result<(f64, f64, f64, f64), String> {
        Ok((
            parse_f64_field(&form.income, "Income")?,
            parse_f64_field(&form.expenses, "Expenses")?,
            parse_f64_field(&form.debt, "Debt")?,
            parse_f64_field(&form.interest_rate, "Interest rate")?,
        ))
    })();
    let (income, expenses, debt, interest_rate) = match parsed {
        Ok(values) => values,
        Err(msg) => return reshow(&visitor, msg),
    };

    // No score without income; nothing is persisted for this case.
    if income <= 0.0 {
        return reshow(&visitor, trans("financial_health_income_zero_error", lang));
    }

    let result = score_health(income, expenses, debt, interest_rate);
    let badges: Vec<String> = result.badge_keys.iter().map(|b| trans(b, lang)).collect();
    let status = trans(result.status_key, lang);

    let record = HealthScoreRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: visitor.user_id().map(str::to_string),
        session_id: visitor.session_id.clone(),
        first_name: form.first_name.trim().to_string(),
        email: clean_opt(form.email.clone()),
        send_email: form.send_email.is_some(),
        income,
        expenses,
        debt,
        interest_rate,
        debt_to_income: result.debt_to_income,
        savings_rate: result.savings_rate,
        interest_burden: result.interest_burden,
        score: result.score,
        status: status.clone(),
        badges: badges.clone(),
        created_at: DateTime::from_system_time(SystemTime::now()),
    };
    insert_health_score(&state, &record).await?;
    log_tool_usage(
        &state,
        "financial_health",
        visitor.user_id(),
        &visitor.session_id,
        "calculate_score",
    )
    .await?;

    if record.send_email {
        if let Some(email) = record.email.as_deref() {
            mailer::send_tool_result_email(
                email,
                "Your Financial Health Score",
                &format!("Score: {} / 100 ({status})", result.score),
            )
            .await;
        }
    }

    let average_score = average_health_score(&state)
        .await?
        .map(|avg| format!("{avg:.0}"))
        .unwrap_or_default();

    let mut response = render(FinancialHealthResultTemplate {
        first_name: record.first_name.clone(),
        score: result.score,
        status,
        debt_to_income: format!("{:.1}%", result.debt_to_income),
        savings_rate: format!("{:.1}%", result.savings_rate),
        interest_burden: format!("{:.1}%", result.interest_burden),
        badges,
        average_score,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debt_free_saver_scores_high() {
        let result = score_health(100000.0, 60000.0, 0.0, 0.0);
        assert_eq!(result.debt_to_income, 0.0);
        assert_eq!(result.savings_rate, 40.0);
        // 100 + min(40/2, 20) = 100, clamped.
        assert_eq!(result.score, 100);
        assert_eq!(result.status_key, "financial_health_status_excellent");
        assert!(result
            .badge_keys
            .contains(&"financial_health_badge_savings_pro"));
    }

    #[test]
    fn heavy_debt_drags_the_score_down() {
        let result = score_health(100000.0, 120000.0, 500000.0, 24.0);
        assert_eq!(result.debt_to_income, 500.0);
        assert_eq!(result.savings_rate, -20.0);
        assert_eq!(result.interest_burden, 10.0);
        // 100 - 50 - 20 - 10 = 20
        assert_eq!(result.score, 20);
        assert_eq!(
            result.status_key,
            "financial_health_status_needs_improvement"
        );
    }

    #[test]
    fn interest_free_badge_needs_outstanding_debt() {
        let result = score_health(100000.0, 50000.0, 10000.0, 0.0);
        assert!(result
            .badge_keys
            .contains(&"financial_health_badge_interest_free"));
        assert!(result
            .badge_keys
            .contains(&"financial_health_badge_debt_manager"));
    }
}
