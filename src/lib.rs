pub mod error;
pub mod format;
pub mod i18n;
pub mod mailer;
pub mod models;
pub mod pdf;
pub mod routes;
pub mod session;
pub mod sms;
pub mod state;
