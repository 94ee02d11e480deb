// Emergency fund planner. The recommended cover stretches with risk tolerance
// and dependents, then the gap is spread over the chosen timeline.

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
use crate::models::{EmergencyFundRecord, RiskLevel};
use crate::routes::helpers::{
    SimpleOption, parse_f64_field, parse_i64_field, parse_optional_f64_field, render,
};
use crate::session::ToolVisitor;
use crate::state::{AppState, insert_emergency_fund, log_tool_usage};

const TIMELINES: &[i32] = &[6, 12, 18];

#[derive(Template)]
#[template(path = "personal/emergency_fund.html")]
struct EmergencyFundTemplate {
    timelines: Vec<SimpleOption>,
    risks: Vec<SimpleOption>,
    errors: Option<String>,
}

fn timeline_options(selected: i32) -> Vec<SimpleOption> {
    TIMELINES
        .iter()
        .map(|months| SimpleOption {
            value: months.to_string(),
            label: format!("{months} months"),
            selected: *months == selected,
        })
        .collect()
}

fn risk_options(selected: &str) -> Vec<SimpleOption> {
    vec![
        SimpleOption {
            value: "low".into(),
            label: "Low".into(),
            selected: selected == "low",
        },
        SimpleOption {
            value: "medium".into(),
            label: "Medium".into(),
            selected: selected == "medium",
        },
        SimpleOption {
            value: "high".into(),
            label: "High".into(),
            selected: selected == "high",
        },
    ]
}

#[derive(Template)]
#[template(path = "personal/emergency_fund_result.html")]
struct EmergencyFundResultTemplate {
    recommended_months: i32,
    target_amount: String,
    savings_gap: String,
    monthly_savings: String,
    percent_of_income: String,
    fully_funded: bool,
    badges: Vec<String>,
}

#[derive(Deserialize)]
pub struct EmergencyFundForm {
    monthly_expenses: String,
    #[serde(default)]
    monthly_income: Option<String>,
    current_savings: String,
    risk_tolerance: String,
    dependents: String,
    timeline: String,
}

pub struct FundPlan {
    pub recommended_months: i32,
    pub target_amount: f64,
    pub savings_gap: f64,
    pub monthly_savings: f64,
    pub percent_of_income: Option<f64>,
    pub badges: Vec<&'static str>,
}

pub fn plan_fund(
    monthly_expenses: f64,
    monthly_income: Option<f64>,
    current_savings: f64,
    risk: RiskLevel,
    dependents: i32,
    timeline: i32,
) -> FundPlan {
    let mut recommended_months = match risk {
        RiskLevel::High => timeline.max(12),
        RiskLevel::Low => timeline.min(6),
        RiskLevel::Medium => timeline,
    };
    if dependents >= 2 {
        recommended_months += 2;
    }

    let target_amount = monthly_expenses * f64::from(recommended_months);
    let savings_gap = target_amount - current_savings;
    let monthly_savings = if savings_gap > 0.0 {
        savings_gap / f64::from(timeline)
    } else {
        0.0
    };
    let percent_of_income = monthly_income
        .filter(|income| *income > 0.0)
        .map(|income| monthly_savings / income * 100.0);

    let mut badges = Vec::new();
    if timeline == 6 || timeline == 12 {
        badges.push("Planner");
    }
    if dependents >= 2 {
        badges.push("Protector");
    }
    if savings_gap <= 0.0 {
        badges.push("Steady Saver");
    }
    if current_savings >= target_amount {
        badges.push("Fund Master");
    }

    FundPlan {
        recommended_months,
        target_amount,
        savings_gap,
        monthly_savings,
        percent_of_income,
        badges,
    }
}

pub async fn emergency_fund_page(visitor: ToolVisitor) -> Result<Response, AppError> {
    let mut response = render(EmergencyFundTemplate {
        timelines: timeline_options(6),
        risks: risk_options("medium"),
        errors: None,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

pub async fn emergency_fund_submit(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Form(form): Form<EmergencyFundForm>,
) -> Result<Response, AppError> {
    let parsed = (|| -> Result<(f64, Option<f64>, f64, RiskLevel, i32, i32), String> {
        let monthly_expenses = parse_f64_field(&form.monthly_expenses, "Monthly expenses")?;
        let monthly_income =
            parse_optional_f64_field(form.monthly_income.clone(), "Monthly income")?;
        let current_savings = parse_f64_field(&form.current_savings, "Current savings")?;
        let risk = match form.risk_tolerance.as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            _ => return Err("Select a risk tolerance".to_string()),
        };
        let dependents = parse_i64_field(&form.dependents, "Dependents")? as i32;
        let timeline = form
            .timeline
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|t| TIMELINES.contains(t))
            .ok_or_else(|| "Select a valid timeline".to_string())?;
        Ok((
            monthly_expenses,
            monthly_income,
            current_savings,
            risk,
            dependents,
            timeline,
        ))
    })();
    let (monthly_expenses, monthly_income, current_savings, risk, dependents, timeline) =
        match parsed {
            Ok(values) => values,
            Err(msg) => {
                let mut response = render(EmergencyFundTemplate {
                    timelines: timeline_options(6),
                    risks: risk_options(&form.risk_tolerance),
                    errors: Some(msg),
                })?
                .into_response();
                visitor.attach_cookie(&mut response);
                return Ok(response);
            }
        };

    let plan = plan_fund(
        monthly_expenses,
        monthly_income,
        current_savings,
        risk,
        dependents,
        timeline,
    );
    let badges: Vec<String> = plan.badges.iter().map(|b| b.to_string()).collect();

    let record = EmergencyFundRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: visitor.user_id().map(str::to_string),
        session_id: visitor.session_id.clone(),
        monthly_expenses,
        monthly_income,
        current_savings,
        risk_tolerance_level: risk,
        dependents,
        timeline,
        recommended_months: plan.recommended_months,
        target_amount: plan.target_amount,
        savings_gap: plan.savings_gap,
        monthly_savings: plan.monthly_savings,
        percent_of_income: plan.percent_of_income,
        badges: badges.clone(),
        created_at: DateTime::from_system_time(SystemTime::now()),
    };
    insert_emergency_fund(&state, &record).await?;
    log_tool_usage(
        &state,
        "emergency_fund",
        visitor.user_id(),
        &visitor.session_id,
        "plan_submit",
    )
    .await?;

    let mut response = render(EmergencyFundResultTemplate {
        recommended_months: plan.recommended_months,
        target_amount: format_currency(plan.target_amount),
        savings_gap: format_currency(plan.savings_gap.max(0.0)),
        monthly_savings: format_currency(plan.monthly_savings),
        percent_of_income: plan
            .percent_of_income
            .map(|p| format!("{p:.1}%"))
            .unwrap_or_default(),
        fully_funded: plan.savings_gap <= 0.0,
        badges,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_risk_stretches_cover_to_a_year() {
        let plan = plan_fund(50000.0, Some(200000.0), 100000.0, RiskLevel::High, 0, 6);
        assert_eq!(plan.recommended_months, 12);
        assert_eq!(plan.target_amount, 600000.0);
        assert_eq!(plan.savings_gap, 500000.0);
        // Gap is spread over the chosen timeline, not the recommended cover.
        assert!((plan.monthly_savings - 500000.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn dependents_add_two_months() {
        let plan = plan_fund(10000.0, None, 0.0, RiskLevel::Medium, 2, 12);
        assert_eq!(plan.recommended_months, 14);
        assert!(plan.badges.contains(&"Protector"));
        assert!(plan.badges.contains(&"Planner"));
    }

    #[test]
    fn funded_plan_earns_badges_and_zero_contribution() {
        let plan = plan_fund(10000.0, Some(50000.0), 120000.0, RiskLevel::Low, 0, 12);
        assert_eq!(plan.recommended_months, 6);
        assert_eq!(plan.monthly_savings, 0.0);
        assert!(plan.badges.contains(&"Steady Saver"));
        assert!(plan.badges.contains(&"Fund Master"));
    }
}
