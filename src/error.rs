// error.rs
// Central error type for route handlers. Data-access helpers keep returning
// anyhow::Result; handlers map everything user-visible into AppError so the
// flash-style taxonomy stays uniform.

use askama::Template;
use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::i18n::{Lang, trans};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("insufficient coin balance")]
    InsufficientCoins,

    #[error("user not found")]
    UserNotFound,

    #[error("access denied")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error")]
    Database(#[from] mongodb::error::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InsufficientCoins => StatusCode::PAYMENT_REQUIRED,
            AppError::UserNotFound | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self, lang: Lang) -> String {
        match self {
            AppError::InsufficientCoins => trans("insufficient_coins", lang),
            AppError::UserNotFound => trans("user_not_found", lang),
            AppError::Forbidden => trans("access_denied", lang),
            AppError::NotFound => trans("item_not_found", lang),
            AppError::Validation(msg) => msg.clone(),
            AppError::Database(_) => trans("database_error", lang),
            AppError::Internal(_) => trans("something_went_wrong", lang),
        }
    }

    /// JSON shape used by the API endpoints (coin balance, reminders).
    pub fn into_json_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self:?}");
        }
        (status, Json(json!({ "success": false, "error": self.message(Lang::En) })))
            .into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self:?}");
        }
        let page = ErrorTemplate {
            message: self.message(Lang::En),
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, self.message(Lang::En)).into_response(),
        }
    }
}
