use anyhow::{Context, Result};
use data_encoding::BASE32_NOPAD;
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc};
use rand::RngCore;
use std::time::{Duration, SystemTime};

use crate::error::AppError;
use crate::i18n::Lang;
use crate::models::{
    AgentDetails, BusinessDetails, CoinTransaction, CoinTxKind, PersonalDetails, Session, User,
    UserRole,
};

use super::{
    AppState, OTP_TTL_SECONDS, RESET_TOKEN_TTL_SECONDS, SESSION_TTL_SECONDS, SIGNUP_BONUS_COINS,
};

pub async fn find_user(state: &AppState, username: &str) -> Result<Option<User>> {
    state
        .users
        .find_one(doc! { "_id": username })
        .await
        .map_err(Into::into)
}

pub async fn find_user_by_email(state: &AppState, email: &str) -> Result<Option<User>> {
    state
        .users
        .find_one(doc! { "email": email })
        .await
        .map_err(Into::into)
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>> {
    let mut cursor = state.users.find(doc! {}).sort(doc! { "created_at": -1 }).await?;
    let mut users = Vec::new();
    while let Some(user) = cursor.try_next().await? {
        users.push(user);
    }
    Ok(users)
}

/// Create the user document together with its signup bonus: the insert, the
/// bonus coin transaction and the audit entry commit or roll back as one unit
/// when the deployment supports transactions.
pub async fn signup_user(
    state: &AppState,
    username: &str,
    email: &str,
    password_hash: &str,
    role: UserRole,
    language: Lang,
) -> Result<(), AppError> {
    let now = DateTime::from_system_time(SystemTime::now());
    let user = User {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role,
        coin_balance: SIGNUP_BONUS_COINS,
        language,
        display_name: Some(username.to_string()),
        setup_complete: false,
        suspended: false,
        email_notifications: true,
        sms_notifications: false,
        otp: None,
        otp_expiry: None,
        reset_token: None,
        reset_token_expiry: None,
        business_details: None,
        personal_details: None,
        agent_details: None,
        created_at: now,
    };
    let bonus = CoinTransaction {
        id: None,
        user_id: username.to_string(),
        amount: SIGNUP_BONUS_COINS,
        kind: CoinTxKind::Credit,
        reference: format!("SIGNUP_BONUS_{}", uuid::Uuid::new_v4()),
        payment_method: None,
        facilitated_by_agent: None,
        notes: None,
        date: now,
    };
    let audit = crate::models::AuditLog {
        id: None,
        admin_id: "system".to_string(),
        action: "signup".to_string(),
        details: Some(doc! { "user_id": username, "role": role.as_str() }),
        timestamp: now,
    };

    if state.supports_transactions {
        let mut session = state.client.start_session().await?;
        session.start_transaction().await?;
        let outcome = async {
            state.users.insert_one(&user).session(&mut session).await?;
            state
                .coin_transactions
                .insert_one(&bonus)
                .session(&mut session)
                .await?;
            state.audit_logs.insert_one(&audit).session(&mut session).await?;
            Ok::<(), mongodb::error::Error>(())
        }
        .await;
        match outcome {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(err) => {
                let _ = session.abort_transaction().await;
                Err(err.into())
            }
        }
    } else {
        state.users.insert_one(&user).await?;
        state.coin_transactions.insert_one(&bonus).await?;
        state.audit_logs.insert_one(&audit).await?;
        Ok(())
    }
}

pub async fn create_session(state: &AppState, username: &str, pending_2fa: bool) -> Result<String> {
    let _ = state
        .sessions
        .delete_many(doc! { "username": username })
        .await;

    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);
    let token = BASE32_NOPAD.encode(&token_bytes);

    let expires_at =
        DateTime::from_system_time(SystemTime::now() + Duration::from_secs(SESSION_TTL_SECONDS));

    state
        .sessions
        .insert_one(Session {
            id: None,
            token: token.clone(),
            username: username.to_string(),
            pending_2fa,
            expires_at,
        })
        .await?;

    Ok(token)
}

pub async fn find_session(state: &AppState, token: &str) -> Result<Option<Session>> {
    if let Some(session) = state.sessions.find_one(doc! { "token": token }).await? {
        if session.expires_at.to_system_time() <= SystemTime::now() {
            let _ = state.sessions.delete_one(doc! { "token": token }).await;
            return Ok(None);
        }
        Ok(Some(session))
    } else {
        Ok(None)
    }
}

/// Resolve a non-pending session token to its user.
pub async fn find_user_by_session(state: &AppState, token: &str) -> Result<Option<User>> {
    match find_session(state, token).await? {
        Some(session) if !session.pending_2fa => find_user(state, &session.username).await,
        _ => Ok(None),
    }
}

/// Promote a pending-2FA session after OTP verification.
pub async fn promote_session(state: &AppState, token: &str) -> Result<()> {
    state
        .sessions
        .update_one(
            doc! { "token": token },
            doc! { "$set": { "pending_2fa": false } },
        )
        .await?;
    Ok(())
}

pub async fn delete_session(state: &AppState, token: &str) -> Result<()> {
    let _ = state.sessions.delete_one(doc! { "token": token }).await?;
    Ok(())
}

pub async fn set_otp(state: &AppState, username: &str, otp: &str) -> Result<()> {
    let expiry =
        DateTime::from_system_time(SystemTime::now() + Duration::from_secs(OTP_TTL_SECONDS));
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "otp": otp, "otp_expiry": expiry } },
        )
        .await?;
    Ok(())
}

/// Check and consume the OTP. Returns false for a wrong or expired code.
pub async fn verify_otp(state: &AppState, username: &str, otp: &str) -> Result<bool> {
    let Some(user) = find_user(state, username).await? else {
        return Ok(false);
    };
    let valid = user.otp.as_deref() == Some(otp)
        && user
            .otp_expiry
            .map(|e| e.to_system_time() > SystemTime::now())
            .unwrap_or(false);
    if valid {
        state
            .users
            .update_one(
                doc! { "_id": username },
                doc! { "$unset": { "otp": "", "otp_expiry": "" } },
            )
            .await?;
    }
    Ok(valid)
}

pub async fn set_reset_token(state: &AppState, username: &str) -> Result<String> {
    let mut token_bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut token_bytes);
    let token = BASE32_NOPAD.encode(&token_bytes);
    let expiry = DateTime::from_system_time(
        SystemTime::now() + Duration::from_secs(RESET_TOKEN_TTL_SECONDS),
    );
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "reset_token": &token, "reset_token_expiry": expiry } },
        )
        .await?;
    Ok(token)
}

pub async fn find_user_by_reset_token(state: &AppState, token: &str) -> Result<Option<User>> {
    let Some(user) = state
        .users
        .find_one(doc! { "reset_token": token })
        .await?
    else {
        return Ok(None);
    };
    let valid = user
        .reset_token_expiry
        .map(|e| e.to_system_time() > SystemTime::now())
        .unwrap_or(false);
    Ok(valid.then_some(user))
}

pub async fn update_password(state: &AppState, username: &str, password_hash: &str) -> Result<()> {
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "password_hash": password_hash },
                   "$unset": { "reset_token": "", "reset_token_expiry": "" } },
        )
        .await?;
    Ok(())
}

pub async fn update_profile(
    state: &AppState,
    username: &str,
    display_name: &str,
    email: &str,
) -> Result<()> {
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "display_name": display_name, "email": email } },
        )
        .await?;
    Ok(())
}

pub async fn update_notifications(
    state: &AppState,
    username: &str,
    email_notifications: bool,
    sms_notifications: bool,
) -> Result<()> {
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": {
                "email_notifications": email_notifications,
                "sms_notifications": sms_notifications,
            } },
        )
        .await?;
    Ok(())
}

pub async fn update_language(state: &AppState, username: &str, language: Lang) -> Result<()> {
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "language": language.as_str() } },
        )
        .await?;
    Ok(())
}

pub async fn complete_business_setup(
    state: &AppState,
    username: &str,
    details: &BusinessDetails,
) -> Result<()> {
    let details = mongodb::bson::to_bson(details).context("serialize business details")?;
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "business_details": details, "setup_complete": true } },
        )
        .await?;
    Ok(())
}

pub async fn complete_personal_setup(
    state: &AppState,
    username: &str,
    details: &PersonalDetails,
) -> Result<()> {
    let details = mongodb::bson::to_bson(details).context("serialize personal details")?;
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "personal_details": details, "setup_complete": true } },
        )
        .await?;
    Ok(())
}

pub async fn complete_agent_setup(
    state: &AppState,
    username: &str,
    details: &AgentDetails,
) -> Result<()> {
    let details = mongodb::bson::to_bson(details).context("serialize agent details")?;
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "agent_details": details, "setup_complete": true } },
        )
        .await?;
    Ok(())
}

pub async fn set_suspended(state: &AppState, username: &str, suspended: bool) -> Result<()> {
    state
        .users
        .update_one(
            doc! { "_id": username },
            doc! { "$set": { "suspended": suspended } },
        )
        .await?;
    Ok(())
}

/// Delete a user and everything they own. The cascade covers the bookkeeping
/// ledgers, coin history and audit entries referencing the user.
pub async fn delete_user_cascade(state: &AppState, username: &str) -> Result<bool> {
    let _ = state.records.delete_many(doc! { "user_id": username }).await;
    let _ = state
        .cashflows
        .delete_many(doc! { "user_id": username })
        .await;
    let _ = state
        .inventory
        .delete_many(doc! { "user_id": username })
        .await;
    let _ = state
        .coin_transactions
        .delete_many(doc! { "user_id": username })
        .await;
    let _ = state
        .audit_logs
        .delete_many(doc! { "details.user_id": username })
        .await;
    let _ = state
        .sessions
        .delete_many(doc! { "username": username })
        .await;
    let result = state.users.delete_one(doc! { "_id": username }).await?;
    Ok(result.deleted_count > 0)
}
