// Tool feedback: a 1-5 rating with an optional comment.

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
use crate::models::Feedback;
use crate::routes::helpers::{SimpleOption, clean_opt, render};
use crate::session::ToolVisitor;
use crate::state::{AppState, insert_feedback};

const TOOLS: &[&str] = &[
    "budget",
    "bill",
    "net_worth",
    "emergency_fund",
    "financial_health",
    "quiz",
    "learning_hub",
];

#[derive(Template)]
#[template(path = "personal/feedback.html")]
struct FeedbackTemplate {
    tools: Vec<SimpleOption>,
    notice: Option<String>,
    errors: Option<String>,
}

fn tool_options(selected: &str) -> Vec<SimpleOption> {
    TOOLS
        .iter()
        .map(|tool| SimpleOption {
            value: tool.to_string(),
            label: tool.replace('_', " "),
            selected: *tool == selected,
        })
        .collect()
}

#[derive(Deserialize)]
pub struct FeedbackForm {
    tool_name: String,
    rating: String,
    #[serde(default)]
    comment: Option<String>,
}

pub async fn feedback_page(visitor: ToolVisitor) -> Result<Response, AppError> {
    let mut response = render(FeedbackTemplate {
        tools: tool_options(""),
        notice: None,
        errors: None,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

pub async fn feedback_submit(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let lang = visitor.lang;
    let rating = form.rating.trim().parse::<i32>().ok();
    let valid_rating = rating.filter(|r| (1..=5).contains(r));
    let valid_tool = TOOLS.contains(&form.tool_name.as_str());

    let (notice, errors) = match (valid_rating, valid_tool) {
        (Some(rating), true) => {
            insert_feedback(
                &state,
                &Feedback {
                    id: None,
                    user_id: visitor.user_id().map(str::to_string),
                    session_id: Some(visitor.session_id.clone()),
                    tool_name: form.tool_name.clone(),
                    rating,
                    comment: clean_opt(form.comment.clone()),
                    timestamp: DateTime::from_system_time(SystemTime::now()),
                },
            )
            .await?;
            (Some(trans("feedback_thanks", lang)), None)
        }
        (None, _) => (None, Some(trans("feedback_invalid_rating", lang))),
        (_, false) => (None, Some("Select a valid tool".to_string())),
    };

    let mut response = render(FeedbackTemplate {
        tools: tool_options(&form.tool_name),
        notice,
        errors,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}
