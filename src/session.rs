// session.rs
// Session middleware to protect routes, extractors for session data, and the
// cookie plumbing shared by login/logout and the anonymous tool pages.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use data_encoding::HEXLOWER;
use rand::RngCore;

use crate::i18n::{Lang, lang_from_accept_language};
use crate::models::{User, UserRole};
use crate::state::{AppState, SESSION_TTL_SECONDS, find_user_by_session};

pub const SESSION_COOKIE_NAME: &str = "ficore_session";
/// Anonymous visitor id for the personal-finance tools.
pub const SID_COOKIE_NAME: &str = "ficore_sid";

#[derive(Clone)]
pub struct SessionData {
    pub user: User,
    pub token: String,
}

/// Paths an authenticated-but-unconfigured user may still reach. Everything
/// else redirects to the role's setup wizard until it has been completed.
fn wizard_exempt(path: &str) -> bool {
    path.starts_with("/setup") || path == "/logout" || path == "/coins/balance"
}

pub fn wizard_path(role: UserRole) -> &'static str {
    match role {
        UserRole::Trader => "/setup/business",
        UserRole::Personal => "/setup/personal",
        UserRole::Agent => "/setup/agent",
        UserRole::Admin => "/setup/personal",
    }
}

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let tokens = extract_cookies(request.headers(), SESSION_COOKIE_NAME);
    if tokens.is_empty() {
        return Err(login_redirect());
    }

    // Try all cookies with the session name until one is valid
    let mut found = None;
    for token in tokens {
        match find_user_by_session(&state, &token).await {
            Ok(Some(user)) => {
                found = Some((user, token));
                break;
            }
            Ok(None) => continue,
            Err(err) => {
                tracing::error!("session lookup failed: {err:?}");
                return Err(crate::error::AppError::Internal(err).into_response());
            }
        }
    }

    let Some((user, token)) = found else {
        return Err(login_redirect());
    };

    if user.suspended {
        return Err(login_redirect());
    }

    if !user.setup_complete && !wizard_exempt(request.uri().path()) {
        return Err(Redirect::to(wizard_path(user.role)).into_response());
    }

    request.extensions_mut().insert(SessionData { user, token });
    Ok(next.run(request).await)
}

fn login_redirect() -> Response {
    Redirect::to("/login").into_response()
}

pub struct SessionUser(pub SessionData);

impl SessionUser {
    pub fn user(&self) -> &User {
        &self.0.user
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }

    pub fn username(&self) -> &str {
        &self.0.user.username
    }

    pub fn lang(&self) -> Lang {
        self.0.user.language
    }

    pub fn role(&self) -> UserRole {
        self.0.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.user.role.is_admin()
    }
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .map(SessionUser)
            .ok_or_else(login_redirect)
    }
}

/// Visitor identity for the anonymous-capable personal tool pages: the logged
/// in user when a valid session cookie rides along, plus a stable anonymous
/// session id. `set_sid_cookie` carries the Set-Cookie value a handler must
/// attach when the id was freshly generated.
pub struct ToolVisitor {
    pub user: Option<User>,
    pub session_id: String,
    pub lang: Lang,
    pub set_sid_cookie: Option<String>,
}

impl ToolVisitor {
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    pub fn attach_cookie(&self, response: &mut Response) {
        if let Some(cookie) = &self.set_sid_cookie {
            if let Ok(value) = axum::http::HeaderValue::from_str(cookie) {
                response
                    .headers_mut()
                    .append(axum::http::header::SET_COOKIE, value);
            }
        }
    }
}

impl FromRequestParts<Arc<AppState>> for ToolVisitor {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let mut user = None;
        for token in extract_cookies(&parts.headers, SESSION_COOKIE_NAME) {
            match find_user_by_session(state, &token).await {
                Ok(Some(found)) => {
                    user = Some(found);
                    break;
                }
                Ok(None) => continue,
                Err(err) => {
                    tracing::error!("session lookup failed: {err:?}");
                    return Err(crate::error::AppError::Internal(err).into_response());
                }
            }
        }

        let (session_id, set_sid_cookie) = match extract_cookies(&parts.headers, SID_COOKIE_NAME)
            .into_iter()
            .next()
        {
            Some(sid) => (sid, None),
            None => {
                let sid = generate_sid();
                let cookie = format!("{SID_COOKIE_NAME}={sid}; Path=/; HttpOnly; SameSite=Lax");
                (sid, Some(cookie))
            }
        };

        let lang = match &user {
            Some(user) => user.language,
            None => parts
                .headers
                .get(axum::http::header::ACCEPT_LANGUAGE)
                .and_then(|h| h.to_str().ok())
                .map(lang_from_accept_language)
                .unwrap_or(Lang::En),
        };

        Ok(ToolVisitor {
            user,
            session_id,
            lang,
            set_sid_cookie,
        })
    }
}

fn generate_sid() -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill_bytes(&mut bytes);
    HEXLOWER.encode(&bytes)
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_TTL_SECONDS}"
    )
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub fn extract_cookies(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut split = pair.trim().splitn(2, '=');
            let key = split.next()?.trim();
            let value = split.next()?.trim();
            if key == name {
                Some(value.to_owned())
            } else {
                None
            }
        })
        .collect()
}
