// Agent dashboard: recent facilitation activity and assisted traders.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use mongodb::bson::doc;
use serde::Deserialize;

use crate::error::AppError;
use crate::format::format_datetime;
use crate::models::{AgentActivityType, CoinTxKind, UserRole};
use crate::session::SessionUser;
use crate::state::{
    AppState, CoinCredit, credit_coins, find_user, list_agent_activities, log_agent_activity,
};

use super::helpers::{effective_user_id, parse_i64_field, render, require_role};

#[derive(Deserialize)]
pub struct AgentDashboardQuery {
    #[serde(default)]
    as_user: Option<String>,
}

#[derive(Template)]
#[template(path = "agents/dashboard.html")]
struct AgentDashboardTemplate {
    display_name: String,
    coin_balance: i64,
    activities_count: usize,
    traders_assisted: usize,
    activities: Vec<ActivityRow>,
    admin_viewing: bool,
}

struct ActivityRow {
    activity_type: String,
    trader_id: String,
    timestamp: String,
}

pub async fn agent_dashboard(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgentDashboardQuery>,
) -> Result<Html<String>, AppError> {
    require_role(&session_user, UserRole::Agent)?;
    let effective = effective_user_id(&session_user, query.as_user.as_deref());
    let admin_viewing = effective != session_user.username();

    let user = find_user(&state, &effective)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let activities = list_agent_activities(&state, &effective, 10).await?;
    let traders_assisted = activities
        .iter()
        .filter_map(|a| a.trader_id.clone())
        .collect::<std::collections::HashSet<_>>()
        .len();

    let rows = activities
        .iter()
        .map(|activity| ActivityRow {
            activity_type: activity.activity_type.as_str().to_string(),
            trader_id: activity.trader_id.clone().unwrap_or_default(),
            timestamp: format_datetime(&activity.timestamp),
        })
        .collect::<Vec<_>>();

    render(AgentDashboardTemplate {
        display_name: user.display_name.unwrap_or_else(|| user.username.clone()),
        coin_balance: user.coin_balance,
        activities_count: rows.len(),
        traders_assisted,
        activities: rows,
        admin_viewing,
    })
}

// Agents can buy coins on behalf of a trader who pays them in cash. The
// credit is recorded against the trader with the agent on the transaction.

#[derive(Template)]
#[template(path = "agents/facilitate.html")]
struct FacilitateTemplate {
    trader_id: String,
    amount: String,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct FacilitateForm {
    trader_id: String,
    amount: String,
}

pub async fn facilitate_page(session_user: SessionUser) -> Result<Html<String>, AppError> {
    require_role(&session_user, UserRole::Agent)?;
    render(FacilitateTemplate {
        trader_id: String::new(),
        amount: String::new(),
        errors: None,
    })
}

pub async fn facilitate(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<FacilitateForm>,
) -> Result<Response, AppError> {
    require_role(&session_user, UserRole::Agent)?;

    let reshow = |errors: String| {
        render(FacilitateTemplate {
            trader_id: form.trader_id.clone(),
            amount: form.amount.clone(),
            errors: Some(errors),
        })
        .map(IntoResponse::into_response)
    };

    let amount = match parse_i64_field(&form.amount, "Amount") {
        Ok(amount) if amount > 0 => amount,
        Ok(_) => return reshow("Amount must be positive".to_string()),
        Err(msg) => return reshow(msg),
    };
    let trader_id = form.trader_id.trim().to_lowercase();
    let Some(trader) = find_user(&state, &trader_id).await? else {
        return reshow("Trader not found".to_string());
    };
    if trader.role != UserRole::Trader {
        return reshow("Coins can only be facilitated for traders".to_string());
    }

    let reference = format!("AGENT_FACILITATION_{}", uuid::Uuid::new_v4());
    credit_coins(
        &state,
        CoinCredit {
            user_id: &trader_id,
            amount,
            kind: CoinTxKind::Purchase,
            reference: &reference,
            actor: session_user.username(),
            payment_method: Some("cash".to_string()),
            facilitated_by_agent: Some(session_user.username().to_string()),
        },
    )
    .await?;
    log_agent_activity(
        &state,
        session_user.username(),
        AgentActivityType::TokenFacilitation,
        Some(trader_id.clone()),
        Some(doc! { "amount": amount, "ref": &reference }),
    )
    .await?;
    Ok(Redirect::to("/agents/dashboard").into_response())
}
