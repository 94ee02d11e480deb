// Settings: profile, notification toggles, language preference.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::session::SessionUser;
use crate::state::{AppState, update_language, update_notifications, update_profile};

use super::helpers::{SimpleOption, language_options, render};

#[derive(Template)]
#[template(path = "settings/index.html")]
struct SettingsIndexTemplate {
    display_name: String,
    email: String,
    role: String,
    language: String,
}

pub async fn settings_index(session_user: SessionUser) -> Result<Html<String>, AppError> {
    let user = session_user.user();
    render(SettingsIndexTemplate {
        display_name: user
            .display_name
            .clone()
            .unwrap_or_else(|| user.username.clone()),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        language: user.language.as_str().to_string(),
    })
}

#[derive(Template)]
#[template(path = "settings/profile.html")]
struct ProfileTemplate {
    display_name: String,
    email: String,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    display_name: String,
    email: String,
}

pub async fn profile_page(session_user: SessionUser) -> Result<Html<String>, AppError> {
    let user = session_user.user();
    render(ProfileTemplate {
        display_name: user
            .display_name
            .clone()
            .unwrap_or_else(|| user.username.clone()),
        email: user.email.clone(),
        errors: None,
    })
}

pub async fn profile_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 5 {
        return render(ProfileTemplate {
            display_name: form.display_name.clone(),
            email: form.email.clone(),
            errors: Some("Enter a valid email address".to_string()),
        })
        .map(IntoResponse::into_response);
    }
    update_profile(&state, session_user.username(), form.display_name.trim(), &email).await?;
    Ok(Redirect::to("/settings").into_response())
}

#[derive(Template)]
#[template(path = "settings/notifications.html")]
struct NotificationsTemplate {
    email_notifications: bool,
    sms_notifications: bool,
}

#[derive(Deserialize)]
pub struct NotificationsForm {
    #[serde(default)]
    email_notifications: Option<String>,
    #[serde(default)]
    sms_notifications: Option<String>,
}

pub async fn notifications_page(session_user: SessionUser) -> Result<Html<String>, AppError> {
    let user = session_user.user();
    render(NotificationsTemplate {
        email_notifications: user.email_notifications,
        sms_notifications: user.sms_notifications,
    })
}

pub async fn notifications_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<NotificationsForm>,
) -> Result<Response, AppError> {
    update_notifications(
        &state,
        session_user.username(),
        form.email_notifications.is_some(),
        form.sms_notifications.is_some(),
    )
    .await?;
    Ok(Redirect::to("/settings").into_response())
}

#[derive(Template)]
#[template(path = "settings/language.html")]
struct LanguageTemplate {
    languages: Vec<SimpleOption>,
}

#[derive(Deserialize)]
pub struct LanguageForm {
    language: String,
}

pub async fn language_page(session_user: SessionUser) -> Result<Html<String>, AppError> {
    render(LanguageTemplate {
        languages: language_options(session_user.user().language.as_str()),
    })
}

pub async fn language_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<LanguageForm>,
) -> Result<Response, AppError> {
    let Some(language) = crate::i18n::Lang::parse(&form.language) else {
        return Err(AppError::Validation("invalid language".into()));
    };
    update_language(&state, session_user.username(), language).await?;
    Ok(Redirect::to("/settings").into_response())
}
