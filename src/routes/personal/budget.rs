// Budget planner: income minus categorised expenses, with a savings goal.

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
use crate::models::Budget;
use crate::routes::helpers::{parse_f64_field, render};
use crate::session::ToolVisitor;
use crate::state::{AppState, insert_budget, log_tool_usage};

#[derive(Template)]
#[template(path = "personal/budget.html")]
struct BudgetTemplate {
    errors: Option<String>,
}

#[derive(Template)]
#[template(path = "personal/budget_result.html")]
struct BudgetResultTemplate {
    income: String,
    expenses: String,
    savings_goal: String,
    surplus_deficit: String,
    in_surplus: bool,
    insights: Vec<String>,
}

#[derive(Deserialize)]
pub struct BudgetForm {
    income: String,
    housing: String,
    food: String,
    transport: String,
    dependents: String,
    miscellaneous: String,
    others: String,
    savings_goal: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    send_email: Option<String>,
}

pub fn total_expenses(
    housing: f64,
    food: f64,
    transport: f64,
    dependents: f64,
    miscellaneous: f64,
    others: f64,
) -> f64 {
    housing + food + transport + dependents + miscellaneous + others
}

pub async fn budget_page(visitor: ToolVisitor) -> Result<Response, AppError> {
    let mut response = render(BudgetTemplate { errors: None })?.into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

pub async fn budget_submit(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Form(form): Form<BudgetForm>,
) -> Result<Response, AppError> {
    let lang = visitor.lang;
    let parsed = (|| -> Result<[f64; 8], String> {
        Ok([
            parse_f64_field(&form.income, "Income")?,
            parse_f64_field(&form.housing, "Housing")?,
            parse_f64_field(&form.food, "Food")?,
            parse_f64_field(&form.transport, "Transport")?,
            parse_f64_field(&form.dependents, "Dependents")?,
            parse_f64_field(&form.miscellaneous, "Miscellaneous")?,
            parse_f64_field(&form.others, "Others")?,
            parse_f64_field(&form.savings_goal, "Savings goal")?,
        ])
    })();
    let [income, housing, food, transport, dependents, miscellaneous, others, savings_goal] =
        match parsed {
            Ok(values) => values,
            Err(msg) => {
                let mut response =
                    render(BudgetTemplate { errors: Some(msg) })?.into_response();
                visitor.attach_cookie(&mut response);
                return Ok(response);
            }
        };

    let expenses = total_expenses(housing, food, transport, dependents, miscellaneous, others);
    let surplus_deficit = income - expenses;

    let budget = Budget {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: visitor.user_id().map(str::to_string),
        session_id: visitor.session_id.clone(),
        income,
        housing,
        food,
        transport,
        dependents,
        miscellaneous,
        others,
        savings_goal,
        surplus_deficit,
        created_at: DateTime::from_system_time(SystemTime::now()),
    };
    insert_budget(&state, &budget).await?;
    log_tool_usage(
        &state,
        "budget",
        visitor.user_id(),
        &visitor.session_id,
        "create_budget",
    )
    .await?;

    let mut insights = Vec::new();
    if surplus_deficit < 0.0 {
        insights.push(trans("budget_insight_budget_deficit", lang));
    } else if surplus_deficit > 0.0 {
        insights.push(trans("budget_insight_budget_surplus", lang));
    }
    if savings_goal == 0.0 {
        insights.push(trans("budget_insight_set_savings_goal", lang));
    }

    if form.send_email.is_some() {
        if let Some(email) = form.email.as_deref().filter(|e| e.contains('@')) {
            mailer::send_tool_result_email(
                email,
                "Your Budget Summary",
                &format!(
                    "Income: {}\nExpenses: {}\nSavings goal: {}\nSurplus/Deficit: {}",
                    format_currency(income),
                    format_currency(expenses),
                    format_currency(savings_goal),
                    format_currency(surplus_deficit),
                ),
            )
            .await;
        }
    }

    let mut response = render(BudgetResultTemplate {
        income: format_currency(income),
        expenses: format_currency(expenses),
        savings_goal: format_currency(savings_goal),
        surplus_deficit: format_currency(surplus_deficit),
        in_surplus: surplus_deficit >= 0.0,
        insights,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surplus_matches_income_minus_expenses() {
        let expenses = total_expenses(20000.0, 15000.0, 5000.0, 0.0, 0.0, 0.0);
        assert_eq!(expenses, 40000.0);
        assert_eq!(100000.0 - expenses, 60000.0);
    }
}
