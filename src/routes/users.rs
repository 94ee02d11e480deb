// Auth and onboarding: signup with the coin bonus, password + emailed-OTP
// login, password reset, and the per-role setup wizards.

use std::{env, sync::Arc};

use askama::Template;
use axum::{
    extract::{Form, Query, State},
    http::{HeaderValue, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use mongodb::bson::doc;
use rand::Rng;
use serde::Deserialize;

use crate::error::AppError;
use crate::i18n::{Lang, trans};
use crate::mailer;
use crate::models::{AgentDetails, BusinessDetails, PersonalDetails, UserRole};
use crate::session::{
    SESSION_COOKIE_NAME, SessionUser, expired_session_cookie, extract_cookies, session_cookie,
    wizard_path,
};
use crate::state::{
    AppState, complete_agent_setup, complete_business_setup, complete_personal_setup,
    create_session, delete_session, find_session, find_user, find_user_by_email,
    find_user_by_reset_token, log_audit_action, promote_session, set_otp, set_reset_token,
    signup_user, update_password, verify_otp,
};

use super::helpers::{SimpleOption, clean_opt, language_options, render, role_options};

fn two_factor_enabled() -> bool {
    env::var("ENABLE_2FA")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

fn base_url() -> String {
    env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

fn valid_username(username: &str) -> bool {
    (3..=30).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn with_session_cookie(mut response: Response, token: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(&session_cookie(token)) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

// --- signup ---

#[derive(Template)]
#[template(path = "users/signup.html")]
struct SignupTemplate {
    username: String,
    email: String,
    roles: Vec<SimpleOption>,
    languages: Vec<SimpleOption>,
    errors: Option<String>,
}

impl SignupTemplate {
    fn empty() -> Self {
        SignupTemplate {
            username: String::new(),
            email: String::new(),
            roles: role_options("personal"),
            languages: language_options("en"),
            errors: None,
        }
    }
}

#[derive(Deserialize)]
pub struct SignupForm {
    username: String,
    email: String,
    password: String,
    role: String,
    language: String,
}

pub async fn signup_page() -> Result<Html<String>, AppError> {
    render(SignupTemplate::empty())
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_lowercase();
    let email = form.email.trim().to_lowercase();

    let reshow = |errors: String| {
        render(SignupTemplate {
            username: username.clone(),
            email: email.clone(),
            roles: role_options(&form.role),
            languages: language_options(&form.language),
            errors: Some(errors),
        })
        .map(IntoResponse::into_response)
    };

    if !valid_username(&username) {
        return reshow(trans("username_format", Lang::En));
    }
    if !email.contains('@') || email.len() < 5 {
        return reshow("Enter a valid email address".to_string());
    }
    if form.password.len() < 8 {
        return reshow("Password must be at least 8 characters".to_string());
    }
    let role = match form.role.as_str() {
        "personal" => UserRole::Personal,
        "trader" => UserRole::Trader,
        "agent" => UserRole::Agent,
        _ => return reshow("Select a valid role".to_string()),
    };
    let language = Lang::parse(&form.language).unwrap_or(Lang::En);

    if find_user(&state, &username).await?.is_some() {
        return reshow(trans("username_exists", language));
    }
    if find_user_by_email(&state, &email).await?.is_some() {
        return reshow(trans("email_exists", language));
    }

    let password_hash = bcrypt::hash(&form.password, bcrypt::DEFAULT_COST)
        .map_err(|err| AppError::Internal(err.into()))?;
    signup_user(&state, &username, &email, &password_hash, role, language).await?;
    tracing::info!("new user created: {username} (role {})", role.as_str());

    let token = create_session(&state, &username, false).await?;
    let response = Redirect::to(wizard_path(role)).into_response();
    Ok(with_session_cookie(response, &token))
}

// --- login / 2FA ---

#[derive(Template)]
#[template(path = "users/login.html")]
struct LoginTemplate {
    username: String,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

pub async fn login_page() -> Result<Html<String>, AppError> {
    render(LoginTemplate {
        username: String::new(),
        errors: None,
    })
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_lowercase();

    let reshow = |errors: String| {
        render(LoginTemplate {
            username: username.clone(),
            errors: Some(errors),
        })
        .map(IntoResponse::into_response)
    };

    if !valid_username(&username) {
        return reshow(trans("username_format", Lang::En));
    }
    let Some(user) = find_user(&state, &username).await? else {
        tracing::warn!("login attempt for unknown username: {username}");
        return reshow(trans("username_not_found", Lang::En));
    };
    let password_ok = bcrypt::verify(&form.password, &user.password_hash)
        .map_err(|err| AppError::Internal(err.into()))?;
    if !password_ok {
        tracing::warn!("failed login attempt for {username}");
        return reshow(trans("invalid_password", user.language));
    }
    if user.suspended {
        return reshow(trans("account_suspended", user.language));
    }

    if two_factor_enabled() {
        let otp: String = {
            let mut rng = rand::rng();
            (0..6).map(|_| rng.random_range(0..=9).to_string()).collect()
        };
        set_otp(&state, &username, &otp).await?;
        match mailer::send_otp_email(&user.email, &otp).await {
            Ok(()) => {
                let token = create_session(&state, &username, true).await?;
                tracing::info!("otp sent to {} for {username}", user.email);
                let response = Redirect::to("/verify-2fa").into_response();
                return Ok(with_session_cookie(response, &token));
            }
            Err(err) => {
                // Email delivery failure must not lock users out.
                tracing::warn!("otp email failed for {username}: {err:?}; logging in without 2fa");
                log_audit_action(
                    &state,
                    "system",
                    "login_without_2fa",
                    Some(doc! { "user_id": &username, "reason": "email_failure" }),
                )
                .await?;
            }
        }
    }

    let token = create_session(&state, &username, false).await?;
    log_audit_action(&state, &username, "login", Some(doc! { "user_id": &username })).await?;
    let target = if user.setup_complete {
        "/dashboard"
    } else {
        wizard_path(user.role)
    };
    Ok(with_session_cookie(Redirect::to(target).into_response(), &token))
}

#[derive(Template)]
#[template(path = "users/verify_2fa.html")]
struct Verify2faTemplate {
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct Verify2faForm {
    otp: String,
}

pub async fn verify_2fa_page() -> Result<Html<String>, AppError> {
    render(Verify2faTemplate { errors: None })
}

pub async fn verify_2fa(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Form(form): Form<Verify2faForm>,
) -> Result<Response, AppError> {
    let mut pending = None;
    for token in extract_cookies(&headers, SESSION_COOKIE_NAME) {
        if let Some(session) = find_session(&state, &token).await? {
            if session.pending_2fa {
                pending = Some(session);
                break;
            }
        }
    }
    let Some(session) = pending else {
        return Ok(Redirect::to("/login").into_response());
    };

    if !verify_otp(&state, &session.username, form.otp.trim()).await? {
        tracing::warn!("failed 2fa attempt for {}", session.username);
        return render(Verify2faTemplate {
            errors: Some(trans("invalid_otp", Lang::En)),
        })
        .map(IntoResponse::into_response);
    }

    promote_session(&state, &session.token).await?;
    log_audit_action(
        &state,
        &session.username,
        "verify_2fa",
        Some(doc! { "user_id": &session.username }),
    )
    .await?;

    let target = match find_user(&state, &session.username).await? {
        Some(user) if !user.setup_complete => wizard_path(user.role),
        _ => "/dashboard",
    };
    Ok(Redirect::to(target).into_response())
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    session_user: SessionUser,
) -> Result<Response, AppError> {
    delete_session(&state, session_user.token()).await?;
    let mut response = Redirect::to("/login").into_response();
    if let Ok(value) = HeaderValue::from_str(&expired_session_cookie()) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

// --- password reset ---

#[derive(Template)]
#[template(path = "users/forgot_password.html")]
struct ForgotPasswordTemplate {
    notice: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordForm {
    email: String,
}

pub async fn forgot_password_page() -> Result<Html<String>, AppError> {
    render(ForgotPasswordTemplate { notice: None })
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Html<String>, AppError> {
    let email = form.email.trim().to_lowercase();
    if let Some(user) = find_user_by_email(&state, &email).await? {
        let token = set_reset_token(&state, &user.username).await?;
        if let Err(err) = mailer::send_reset_email(&user.email, &base_url(), &token).await {
            tracing::warn!("reset email to {} failed: {err:?}", user.email);
        }
    }
    // Same notice whether or not the account exists.
    render(ForgotPasswordTemplate {
        notice: Some(trans("reset_link_sent", Lang::En)),
    })
}

#[derive(Template)]
#[template(path = "users/reset_password.html")]
struct ResetPasswordTemplate {
    token: String,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetPasswordQuery {
    token: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    token: String,
    password: String,
}

pub async fn reset_password_page(
    Query(query): Query<ResetPasswordQuery>,
) -> Result<Html<String>, AppError> {
    render(ResetPasswordTemplate {
        token: query.token.unwrap_or_default(),
        errors: None,
    })
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let Some(user) = find_user_by_reset_token(&state, form.token.trim()).await? else {
        return render(ResetPasswordTemplate {
            token: String::new(),
            errors: Some(trans("invalid_reset_token", Lang::En)),
        })
        .map(IntoResponse::into_response);
    };
    if form.password.len() < 8 {
        return render(ResetPasswordTemplate {
            token: form.token.clone(),
            errors: Some("Password must be at least 8 characters".to_string()),
        })
        .map(IntoResponse::into_response);
    }
    let password_hash = bcrypt::hash(&form.password, bcrypt::DEFAULT_COST)
        .map_err(|err| AppError::Internal(err.into()))?;
    update_password(&state, &user.username, &password_hash).await?;
    log_audit_action(
        &state,
        &user.username,
        "reset_password",
        Some(doc! { "user_id": &user.username }),
    )
    .await?;
    Ok(Redirect::to("/login").into_response())
}

// --- setup wizards ---

#[derive(Template)]
#[template(path = "users/setup_business.html")]
struct BusinessSetupTemplate {
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct BusinessSetupForm {
    name: String,
    address: String,
    industry: String,
    products_services: String,
    phone_number: String,
}

pub async fn business_setup_page(session_user: SessionUser) -> Result<Response, AppError> {
    if session_user.user().setup_complete {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    render(BusinessSetupTemplate { errors: None }).map(IntoResponse::into_response)
}

pub async fn business_setup(
    State(state): State<Arc<AppState>>,
    session_user: SessionUser,
    Form(form): Form<BusinessSetupForm>,
) -> Result<Response, AppError> {
    if form.name.trim().is_empty() || form.phone_number.trim().is_empty() {
        return render(BusinessSetupTemplate {
            errors: Some("Business name and phone number are required".to_string()),
        })
        .map(IntoResponse::into_response);
    }
    let details = BusinessDetails {
        name: form.name.trim().to_string(),
        address: form.address.trim().to_string(),
        industry: form.industry.trim().to_string(),
        products_services: form.products_services.trim().to_string(),
        phone_number: form.phone_number.trim().to_string(),
    };
    complete_business_setup(&state, session_user.username(), &details).await?;
    log_audit_action(
        &state,
        session_user.username(),
        "complete_setup_wizard",
        Some(doc! { "user_id": session_user.username() }),
    )
    .await?;
    Ok(Redirect::to("/dashboard").into_response())
}

#[derive(Template)]
#[template(path = "users/setup_personal.html")]
struct PersonalSetupTemplate {
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct PersonalSetupForm {
    first_name: String,
    last_name: String,
    phone_number: String,
    address: String,
}

pub async fn personal_setup_page(session_user: SessionUser) -> Result<Response, AppError> {
    if session_user.user().setup_complete {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    render(PersonalSetupTemplate { errors: None }).map(IntoResponse::into_response)
}

pub async fn personal_setup(
    State(state): State<Arc<AppState>>,
    session_user: SessionUser,
    Form(form): Form<PersonalSetupForm>,
) -> Result<Response, AppError> {
    if form.first_name.trim().is_empty() {
        return render(PersonalSetupTemplate {
            errors: Some("First name is required".to_string()),
        })
        .map(IntoResponse::into_response);
    }
    let details = PersonalDetails {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        phone_number: form.phone_number.trim().to_string(),
        address: form.address.trim().to_string(),
    };
    complete_personal_setup(&state, session_user.username(), &details).await?;
    log_audit_action(
        &state,
        session_user.username(),
        "complete_personal_setup_wizard",
        Some(doc! { "user_id": session_user.username() }),
    )
    .await?;
    Ok(Redirect::to("/dashboard").into_response())
}

#[derive(Template)]
#[template(path = "users/setup_agent.html")]
struct AgentSetupTemplate {
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct AgentSetupForm {
    agent_name: String,
    agent_id: String,
    area: String,
    phone: String,
}

pub async fn agent_setup_page(session_user: SessionUser) -> Result<Response, AppError> {
    if session_user.user().setup_complete {
        return Ok(Redirect::to("/agents/dashboard").into_response());
    }
    render(AgentSetupTemplate { errors: None }).map(IntoResponse::into_response)
}

pub async fn agent_setup(
    State(state): State<Arc<AppState>>,
    session_user: SessionUser,
    Form(form): Form<AgentSetupForm>,
) -> Result<Response, AppError> {
    if form.agent_name.trim().is_empty() || form.agent_id.trim().is_empty() {
        return render(AgentSetupTemplate {
            errors: Some("Agent name and id are required".to_string()),
        })
        .map(IntoResponse::into_response);
    }
    let details = AgentDetails {
        agent_name: form.agent_name.trim().to_string(),
        agent_id: form.agent_id.trim().to_string(),
        area: form.area.trim().to_string(),
        phone: clean_opt(Some(form.phone)).unwrap_or_default(),
    };
    complete_agent_setup(&state, session_user.username(), &details).await?;
    log_audit_action(
        &state,
        session_user.username(),
        "complete_agent_setup_wizard",
        Some(doc! { "user_id": session_user.username() }),
    )
    .await?;
    Ok(Redirect::to("/agents/dashboard").into_response())
}
