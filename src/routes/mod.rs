// routes/mod.rs
// Route handlers grouped by domain, plus the router assembly shared by the
// binary and the integration tests.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::session::require_session;
use crate::state::AppState;

mod helpers;

pub mod admin;
pub mod agents;
pub mod cashflows;
pub mod coins;
pub mod dashboard;
pub mod home;
pub mod inventory;
pub mod personal;
pub mod records;
pub mod reports;
pub mod settings;
pub mod users;

pub fn app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/logout", post(users::logout))
        .route(
            "/setup/business",
            get(users::business_setup_page).post(users::business_setup),
        )
        .route(
            "/setup/personal",
            get(users::personal_setup_page).post(users::personal_setup),
        )
        .route(
            "/setup/agent",
            get(users::agent_setup_page).post(users::agent_setup),
        )
        .route("/coins", get(coins::purchase_page))
        .route("/coins/purchase", post(coins::purchase))
        .route("/coins/history", get(coins::history))
        .route("/coins/balance", get(coins::balance))
        .route(
            "/coins/receipt-upload",
            get(coins::receipt_upload_page).post(coins::receipt_upload),
        )
        .route("/records", get(records::records_index).post(records::records_create))
        .route("/records/new", get(records::records_new))
        .route("/records/reminder", post(records::send_reminder))
        .route("/records/{id}", get(records::records_view))
        .route("/records/{id}/edit", get(records::records_edit))
        .route("/records/{id}/update", post(records::records_update))
        .route("/records/{id}/delete", post(records::records_delete))
        .route("/records/{id}/receipt.pdf", get(records::records_receipt_pdf))
        .route(
            "/cashflows",
            get(cashflows::cashflows_index).post(cashflows::cashflows_create),
        )
        .route("/cashflows/new", get(cashflows::cashflows_new))
        .route("/cashflows/{id}/edit", get(cashflows::cashflows_edit))
        .route("/cashflows/{id}/update", post(cashflows::cashflows_update))
        .route("/cashflows/{id}/delete", post(cashflows::cashflows_delete))
        .route(
            "/cashflows/{id}/receipt.pdf",
            get(cashflows::cashflows_receipt_pdf),
        )
        .route(
            "/inventory",
            get(inventory::inventory_index).post(inventory::inventory_create),
        )
        .route("/inventory/new", get(inventory::inventory_new))
        .route("/inventory/low-stock", get(inventory::inventory_low_stock))
        .route("/inventory/{id}/edit", get(inventory::inventory_edit))
        .route("/inventory/{id}/update", post(inventory::inventory_update))
        .route("/inventory/{id}/delete", post(inventory::inventory_delete))
        .route("/reports", get(reports::reports_index))
        .route("/reports/profit-loss", get(reports::profit_loss))
        .route("/reports/inventory", get(reports::inventory_report))
        .route("/agents/dashboard", get(agents::agent_dashboard))
        .route(
            "/agents/facilitate",
            get(agents::facilitate_page).post(agents::facilitate),
        )
        .route("/admin", get(admin::admin_dashboard))
        .route("/admin/users", get(admin::manage_users))
        .route("/admin/users/{username}/suspend", post(admin::suspend_user))
        .route(
            "/admin/users/{username}/unsuspend",
            post(admin::unsuspend_user),
        )
        .route("/admin/users/{username}/delete", post(admin::delete_user))
        .route("/admin/credit", get(admin::credit_page).post(admin::credit))
        .route("/admin/audit", get(admin::audit))
        .route(
            "/admin/data/{collection}/{id}/delete",
            post(admin::delete_item),
        )
        .route("/settings", get(settings::settings_index))
        .route(
            "/settings/profile",
            get(settings::profile_page).post(settings::profile_update),
        )
        .route(
            "/settings/notifications",
            get(settings::notifications_page).post(settings::notifications_update),
        )
        .route(
            "/settings/language",
            get(settings::language_page).post(settings::language_update),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(home::home))
        .route("/signup", get(users::signup_page).post(users::signup))
        .route("/login", get(users::login_page).post(users::login))
        .route(
            "/verify-2fa",
            get(users::verify_2fa_page).post(users::verify_2fa),
        )
        .route(
            "/forgot-password",
            get(users::forgot_password_page).post(users::forgot_password),
        )
        .route(
            "/reset-password",
            get(users::reset_password_page).post(users::reset_password),
        )
        .route("/personal", get(personal::personal_index))
        .route(
            "/personal/budget",
            get(personal::budget::budget_page).post(personal::budget::budget_submit),
        )
        .route(
            "/personal/bills",
            get(personal::bills::bills_page).post(personal::bills::bills_create),
        )
        .route(
            "/personal/bills/{id}/paid",
            post(personal::bills::bills_mark_paid),
        )
        .route(
            "/personal/bills/{id}/delete",
            post(personal::bills::bills_delete),
        )
        .route(
            "/personal/net-worth",
            get(personal::net_worth::net_worth_page).post(personal::net_worth::net_worth_submit),
        )
        .route(
            "/personal/emergency-fund",
            get(personal::emergency_fund::emergency_fund_page)
                .post(personal::emergency_fund::emergency_fund_submit),
        )
        .route(
            "/personal/financial-health",
            get(personal::financial_health::financial_health_page)
                .post(personal::financial_health::financial_health_submit),
        )
        .route(
            "/personal/quiz",
            get(personal::quiz::quiz_page).post(personal::quiz::quiz_submit),
        )
        .route("/personal/learning", get(personal::learning_hub::learning_index))
        .route(
            "/personal/learning/{id}",
            get(personal::learning_hub::learning_module),
        )
        .route(
            "/personal/learning/{id}/complete",
            post(personal::learning_hub::learning_complete),
        )
        .route(
            "/personal/feedback",
            get(personal::feedback::feedback_page).post(personal::feedback::feedback_submit),
        )
        .merge(protected)
        .with_state(state)
}
