use std::str::FromStr;

use askama::Template;
use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use mongodb::bson::{DateTime, oid::ObjectId};

use crate::error::AppError;
use crate::models::{CashflowType, PaymentMethod, RecordType, UserRole};
use crate::session::SessionUser;

pub(super) fn render<T: Template>(tpl: T) -> Result<Html<String>, AppError> {
    tpl.render()
        .map(Html)
        .map_err(|err| AppError::Internal(err.into()))
}

/// Owner check with the admin bypass: admins may act on any user's data.
pub(super) fn ensure_owner(
    session_user: &SessionUser,
    owner_id: &str,
) -> Result<(), AppError> {
    if session_user.is_admin() || session_user.username() == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub(super) fn require_role(session_user: &SessionUser, role: UserRole) -> Result<(), AppError> {
    if session_user.is_admin() || session_user.role() == role {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub(super) fn require_admin(session_user: &SessionUser) -> Result<(), AppError> {
    if session_user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// The user a handler operates on: the acting user, or anyone when an admin
/// passes `as_user`.
pub(super) fn effective_user_id(session_user: &SessionUser, as_user: Option<&str>) -> String {
    match as_user {
        Some(target) if session_user.is_admin() => target.to_string(),
        _ => session_user.username().to_string(),
    }
}

#[derive(Clone)]
pub(super) struct SimpleOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub(super) fn clean_opt(input: Option<String>) -> Option<String> {
    input.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub(super) fn parse_object_id(value: &str) -> Result<ObjectId, AppError> {
    ObjectId::from_str(value).map_err(|_| AppError::Validation("invalid id".into()))
}

pub(super) fn parse_f64_field(value: &str, label: &str) -> Result<f64, String> {
    let parsed = value
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| format!("{label} must be a number"))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(format!("{label} must be zero or more"));
    }
    Ok(parsed)
}

pub(super) fn parse_i64_field(value: &str, label: &str) -> Result<i64, String> {
    let parsed = value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("{label} must be a whole number"))?;
    if parsed < 0 {
        return Err(format!("{label} must be zero or more"));
    }
    Ok(parsed)
}

pub(super) fn parse_optional_f64_field(
    value: Option<String>,
    label: &str,
) -> Result<Option<f64>, String> {
    match clean_opt(value) {
        Some(v) => Ok(Some(parse_f64_field(&v, label)?)),
        None => Ok(None),
    }
}

pub(super) fn parse_optional_i64_field(
    value: Option<String>,
    label: &str,
) -> Result<Option<i64>, String> {
    match clean_opt(value) {
        Some(v) => Ok(Some(parse_i64_field(&v, label)?)),
        None => Ok(None),
    }
}

pub(super) fn parse_date_field(value: &str, label: &str) -> Result<DateTime, String> {
    let trimmed = value.trim();
    let date = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| format!("{label} must be a date (YYYY-MM-DD)"))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("{label} is out of range"))?
        .and_utc();
    Ok(DateTime::from_chrono(datetime))
}

pub(super) fn parse_record_type(value: &str) -> Result<RecordType, String> {
    match value.to_lowercase().as_str() {
        "debtor" => Ok(RecordType::Debtor),
        "creditor" => Ok(RecordType::Creditor),
        _ => Err("invalid record type".into()),
    }
}

pub(super) fn parse_cashflow_type(value: &str) -> Result<CashflowType, String> {
    match value.to_lowercase().as_str() {
        "receipt" => Ok(CashflowType::Receipt),
        "payment" => Ok(CashflowType::Payment),
        _ => Err("invalid cashflow type".into()),
    }
}

pub(super) fn parse_payment_method(value: &str) -> Result<Option<PaymentMethod>, String> {
    match value.to_lowercase().as_str() {
        "" => Ok(None),
        "cash" => Ok(Some(PaymentMethod::Cash)),
        "card" => Ok(Some(PaymentMethod::Card)),
        "bank" => Ok(Some(PaymentMethod::Bank)),
        _ => Err("invalid payment method".into()),
    }
}

pub(super) fn record_type_options(selected: RecordType) -> Vec<SimpleOption> {
    vec![
        SimpleOption {
            value: "debtor".into(),
            label: "Debtor (owes you)".into(),
            selected: selected == RecordType::Debtor,
        },
        SimpleOption {
            value: "creditor".into(),
            label: "Creditor (you owe)".into(),
            selected: selected == RecordType::Creditor,
        },
    ]
}

pub(super) fn cashflow_type_options(selected: CashflowType) -> Vec<SimpleOption> {
    vec![
        SimpleOption {
            value: "receipt".into(),
            label: "Receipt (money in)".into(),
            selected: selected == CashflowType::Receipt,
        },
        SimpleOption {
            value: "payment".into(),
            label: "Payment (money out)".into(),
            selected: selected == CashflowType::Payment,
        },
    ]
}

pub(super) fn payment_method_options(selected: &str) -> Vec<SimpleOption> {
    vec![
        SimpleOption {
            value: "".into(),
            label: "None".into(),
            selected: selected.is_empty(),
        },
        SimpleOption {
            value: "cash".into(),
            label: "Cash".into(),
            selected: selected == "cash",
        },
        SimpleOption {
            value: "card".into(),
            label: "Card".into(),
            selected: selected == "card",
        },
        SimpleOption {
            value: "bank".into(),
            label: "Bank Transfer".into(),
            selected: selected == "bank",
        },
    ]
}

pub(super) fn role_options(selected: &str) -> Vec<SimpleOption> {
    vec![
        SimpleOption {
            value: "personal".into(),
            label: "Personal".into(),
            selected: selected == "personal",
        },
        SimpleOption {
            value: "trader".into(),
            label: "Trader".into(),
            selected: selected == "trader",
        },
        SimpleOption {
            value: "agent".into(),
            label: "Agent".into(),
            selected: selected == "agent",
        },
    ]
}

pub(super) fn language_options(selected: &str) -> Vec<SimpleOption> {
    vec![
        SimpleOption {
            value: "en".into(),
            label: "English".into(),
            selected: selected == "en",
        },
        SimpleOption {
            value: "ha".into(),
            label: "Hausa".into(),
            selected: selected == "ha",
        },
    ]
}

pub(super) fn pdf_response(filename: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub(super) fn csv_response(filename: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
