// models.rs
// Domain documents for the MongoDB collections.

use mongodb::bson::{DateTime, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::i18n::Lang;

/// User roles for authorization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Personal,
    Trader,
    Agent,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Personal => "personal",
            UserRole::Trader => "trader",
            UserRole::Agent => "agent",
            UserRole::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Personal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub name: String,
    pub address: String,
    pub industry: String,
    pub products_services: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDetails {
    pub agent_name: String,
    pub agent_id: String,
    pub area: String,
    pub phone: String,
}

fn default_true() -> bool {
    true
}

/// User document. `_id` is the username, as in the original data set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub coin_balance: i64,
    pub language: Lang,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub setup_complete: bool,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default = "default_true")]
    pub email_notifications: bool,
    #[serde(default)]
    pub sms_notifications: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp_expiry: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_expiry: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_details: Option<BusinessDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_details: Option<PersonalDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_details: Option<AgentDetails>,
    pub created_at: DateTime,
}

/// Session document linking a cookie token to a user.
///
/// A `pending_2fa` session exists between the password check and OTP
/// verification and does not grant access to protected routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub pending_2fa: bool,
    pub expires_at: DateTime,
}

/// Unified debtor/creditor ledger entry type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Debtor,
    Creditor,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Debtor => "debtor",
            RecordType::Creditor => "creditor",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub amount_owed: f64,
    #[serde(default)]
    pub reminder_count: i32,
    pub created_at: DateTime,
}

/// Unified receipt/payment ledger entry type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CashflowType {
    Receipt,
    Payment,
}

impl CashflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashflowType::Receipt => "receipt",
            CashflowType::Payment => "payment",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Bank => "bank",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cashflow {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    #[serde(rename = "type")]
    pub flow_type: CashflowType,
    pub party_name: String,
    pub amount: f64,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub file_id: Option<ObjectId>,
    #[serde(default)]
    pub filename: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub item_name: String,
    pub qty: i64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub buying_price: Option<f64>,
    #[serde(default)]
    pub selling_price: Option<f64>,
    pub threshold: i64,
    pub created_at: DateTime,
    #[serde(default)]
    pub updated_at: Option<DateTime>,
}

/// Coin movement kind. Debits are stored with a negative amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoinTxKind {
    Purchase,
    Spend,
    Credit,
    AdminCredit,
}

impl CoinTxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinTxKind::Purchase => "purchase",
            CoinTxKind::Spend => "spend",
            CoinTxKind::Credit => "credit",
            CoinTxKind::AdminCredit => "admin_credit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinTransaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: CoinTxKind,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub facilitated_by_agent: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub admin_id: String,
    pub action: String,
    #[serde(default)]
    pub details: Option<Document>,
    pub timestamp: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentActivityType {
    TraderRegistration,
    TokenFacilitation,
    ReportGeneration,
    TraderAssistance,
}

impl AgentActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentActivityType::TraderRegistration => "trader_registration",
            AgentActivityType::TokenFacilitation => "token_facilitation",
            AgentActivityType::ReportGeneration => "report_generation",
            AgentActivityType::TraderAssistance => "trader_assistance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentActivity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub agent_id: String,
    pub activity_type: AgentActivityType,
    #[serde(default)]
    pub trader_id: Option<String>,
    #[serde(default)]
    pub details: Option<Document>,
    pub timestamp: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub debt_id: ObjectId,
    pub recipient: String,
    pub message: String,
    pub send_type: String,
    #[serde(default)]
    pub api_response: Option<String>,
    pub timestamp: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub tool_name: String,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    pub timestamp: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUsage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub tool_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub action: String,
    pub timestamp: DateTime,
}

// Personal-finance result documents. One per submission, keyed by a uuid `_id`
// and owned by a user or an anonymous session.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub income: f64,
    pub housing: f64,
    pub food: f64,
    pub transport: f64,
    pub dependents: f64,
    pub miscellaneous: f64,
    pub others: f64,
    pub savings_goal: f64,
    pub surplus_deficit: f64,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BillFrequency {
    #[serde(rename = "one-time")]
    OneTime,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "quarterly")]
    Quarterly,
}

impl BillFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillFrequency::OneTime => "one-time",
            BillFrequency::Weekly => "weekly",
            BillFrequency::Monthly => "monthly",
            BillFrequency::Quarterly => "quarterly",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Unpaid,
    Paid,
    Pending,
    Overdue,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Unpaid => "unpaid",
            BillStatus::Paid => "paid",
            BillStatus::Pending => "pending",
            BillStatus::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub bill_name: String,
    pub amount: f64,
    pub due_date: DateTime,
    pub frequency: BillFrequency,
    pub status: BillStatus,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetWorthRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub first_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub send_email: bool,
    pub cash_savings: f64,
    pub investments: f64,
    pub property: f64,
    pub loans: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    pub badges: Vec<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyFundRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub monthly_expenses: f64,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    pub current_savings: f64,
    pub risk_tolerance_level: RiskLevel,
    pub dependents: i32,
    pub timeline: i32,
    pub recommended_months: i32,
    pub target_amount: f64,
    pub savings_gap: f64,
    pub monthly_savings: f64,
    #[serde(default)]
    pub percent_of_income: Option<f64>,
    pub badges: Vec<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScoreRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub first_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub send_email: bool,
    pub income: f64,
    pub expenses: f64,
    pub debt: f64,
    pub interest_rate: f64,
    pub debt_to_income: f64,
    pub savings_rate: f64,
    pub interest_burden: f64,
    pub score: i32,
    pub status: String,
    pub badges: Vec<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub answers: Vec<String>,
    pub score: i32,
    pub personality: String,
    pub badges: Vec<String>,
    pub created_at: DateTime,
}

/// Learning-hub content, seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningModule {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub summary: String,
    pub sections: Vec<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningProgress {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub module_id: String,
    pub completed: bool,
    pub updated_at: DateTime,
}
