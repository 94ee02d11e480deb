// Landing page with entry points into the app and the anonymous tools.

use askama::Template;
use axum::response::Html;

use crate::error::AppError;

use super::helpers::render;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {}

pub async fn home() -> Result<Html<String>, AppError> {
    render(HomeTemplate {})
}
