// Personal-finance tools. Every page works for anonymous visitors (keyed by
// the sid cookie) and logged-in users alike.

use askama::Template;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::session::ToolVisitor;

use super::helpers::render;

pub mod bills;
pub mod budget;
pub mod emergency_fund;
pub mod feedback;
pub mod financial_health;
pub mod learning_hub;
pub mod net_worth;
pub mod quiz;

#[derive(Template)]
#[template(path = "personal/index.html")]
struct PersonalIndexTemplate {
    logged_in: bool,
}

pub async fn personal_index(visitor: ToolVisitor) -> Result<Response, AppError> {
    let mut response = render(PersonalIndexTemplate {
        logged_in: visitor.user.is_some(),
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}
