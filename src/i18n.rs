// i18n.rs
// English/Hausa string tables and the trans() lookup. Keys missing from the
// Hausa column fall back to English; unknown keys render as the key itself so
// a missing entry is visible instead of a panic.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Ha,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ha => "ha",
        }
    }

    pub fn parse(value: &str) -> Option<Lang> {
        match value {
            "en" => Some(Lang::En),
            "ha" => Some(Lang::Ha),
            _ => None,
        }
    }
}

/// Pick a language from an Accept-Language header value.
pub fn lang_from_accept_language(header: &str) -> Lang {
    accept_language::parse(header)
        .first()
        .and_then(|tag| Lang::parse(tag.split('-').next().unwrap_or(tag)))
        .unwrap_or(Lang::En)
}

pub fn trans(key: &str, lang: Lang) -> String {
    match table().get(key) {
        Some((en, ha)) => match lang {
            Lang::En => (*en).to_string(),
            Lang::Ha => {
                if ha.is_empty() {
                    (*en).to_string()
                } else {
                    (*ha).to_string()
                }
            }
        },
        None => key.to_string(),
    }
}

fn table() -> &'static HashMap<&'static str, (&'static str, &'static str)> {
    static TABLE: OnceLock<HashMap<&'static str, (&'static str, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            // general
            ("app_name", ("FiCore", "FiCore")),
            ("welcome", ("Welcome", "Barka da zuwa")),
            ("login", ("Log In", "Shiga")),
            ("signup", ("Sign Up", "Yi Rajista")),
            ("logout", ("Log Out", "Fita")),
            ("dashboard", ("Dashboard", "Allon Bayani")),
            ("submit", ("Submit", "Aika")),
            ("save", ("Save", "Ajiye")),
            ("edit", ("Edit", "Gyara")),
            ("delete", ("Delete", "Share")),
            ("back", ("Back", "Koma Baya")),
            ("access_denied", (
                "You do not have permission to access this page.",
                "Ba ka da izinin shiga wannan shafin ba.",
            )),
            ("database_error", (
                "An error occurred while accessing the database. Please try again later.",
                "An sami matsala wajen shiga rumbun bayanai. Da fatan za a sake gwadawa daga baya.",
            )),
            ("something_went_wrong", ("An error occurred", "An sami matsala")),
            ("item_not_found", ("Item not found", "Ba a sami abu ba")),
            ("item_deleted", ("Item deleted successfully", "An share abu cikin nasara")),
            ("invalid_collection", ("Invalid collection selected", "Zaɓin rukunin bai dace ba")),
            // auth
            ("username_exists", ("Username already exists", "Sunan mai amfani ya riga ya wanzu")),
            ("email_exists", ("Email already exists", "Imel ɗin ya riga ya wanzu")),
            ("username_format", (
                "Username must be alphanumeric with underscores",
                "Sunan mai amfani dole ya ƙunshi haruffa da lambobi kawai",
            )),
            ("username_not_found", (
                "Username does not exist. Please check your signup details.",
                "Sunan mai amfani ba ya wanzu. Da fatan a duba bayanan rajista.",
            )),
            ("invalid_password", ("Incorrect password", "Kalmar sirri ba daidai ba ce")),
            ("account_suspended", ("This account has been suspended", "An dakatar da wannan asusun")),
            ("invalid_otp", ("Invalid or expired OTP", "Lambar OTP ba daidai ba ce ko ta ƙare")),
            ("invalid_2fa_session", (
                "Invalid 2FA session. Please log in again",
                "Zaman tantancewa bai inganta ba. Da fatan a sake shiga",
            )),
            ("otp_subject", ("Your One-Time Password", "Lambar Sirri ta Wucin Gadi")),
            ("reset_subject", ("Reset Your Password", "Sake Saita Kalmar Sirri")),
            ("reset_link_sent", (
                "If the email exists, a reset link has been sent",
                "Idan imel ɗin yana wanzu, an aika hanyar sake saitawa",
            )),
            ("invalid_reset_token", ("Invalid or expired reset link", "Hanyar sake saitawa ba ta inganta ba")),
            ("password_reset_success", ("Password reset successfully", "An sake saita kalmar sirri cikin nasara")),
            ("setup_complete_msg", ("Setup completed", "An kammala saitin farko")),
            // coins
            ("insufficient_coins", (
                "Insufficient coins. Purchase more coins.",
                "Kuɗin coin bai isa ba. Sayi ƙarin coins.",
            )),
            ("purchase_success", ("Coins purchased successfully", "An sayi coins cikin nasara")),
            ("coins_credited", ("Coins credited successfully", "An ƙara coins cikin nasara")),
            ("user_not_found", ("User not found", "Ba a sami mai amfani ba")),
            ("receipt_uploaded", ("Receipt uploaded successfully", "An ɗora rasit cikin nasara")),
            ("coin_amount", ("Coin Amount", "Adadin Coins")),
            ("payment_method", ("Payment Method", "Hanyar Biya")),
            // records & cashflows & inventory
            ("record_created", ("Record created successfully", "An ƙirƙiri rikodin cikin nasara")),
            ("record_updated", ("Record updated successfully", "An sabunta rikodin cikin nasara")),
            ("record_deleted", ("Record deleted successfully", "An share rikodin cikin nasara")),
            ("cashflow_created", ("Transaction recorded successfully", "An rubuta mu'amala cikin nasara")),
            ("cashflow_updated", ("Transaction updated successfully", "An sabunta mu'amala cikin nasara")),
            ("cashflow_deleted", ("Transaction deleted successfully", "An share mu'amala cikin nasara")),
            ("item_added", ("Item added successfully", "An ƙara kaya cikin nasara")),
            ("item_updated", ("Item updated successfully", "An sabunta kaya cikin nasara")),
            ("reminder_sent", ("Reminder sent successfully", "An aika tunatarwa cikin nasara")),
            ("reminder_failed", ("Failed to send reminder", "An kasa aika tunatarwa")),
            ("no_contact", (
                "No contact number on file for this record",
                "Babu lambar waya a kan wannan rikodin",
            )),
            // settings
            ("profile_updated", ("Profile updated successfully", "An sabunta bayanan sirri cikin nasara")),
            ("notifications_updated", (
                "Notification preferences updated successfully",
                "An sabunta zaɓin sanarwa cikin nasara",
            )),
            ("language_updated", ("Language updated successfully", "An sabunta harshe cikin nasara")),
            // admin
            ("user_deleted", ("User deleted successfully", "An share mai amfani cikin nasara")),
            ("user_suspended", ("User suspended", "An dakatar da mai amfani")),
            ("user_unsuspended", ("User reactivated", "An dawo da mai amfani")),
            // budget
            ("budget_budget_planner", ("Budget Planner", "Mai Tsara Kasafin Kuɗi")),
            ("budget_monthly_income", ("Monthly Income", "Kuɗin Shiga na Wata")),
            ("budget_income_required", ("Please enter your income", "Da fatan a shigar da kuɗin shiga")),
            ("budget_savings_goal", ("Savings Goal", "Burin Ajiya")),
            ("budget_surplus", ("Surplus", "Rara")),
            ("budget_deficit", ("Deficit", "Gibi")),
            ("budget_insight_budget_deficit", (
                "Your expenses exceed your income. Reduce non-essential spending.",
                "Kashe kuɗinka ya zarce kuɗin shigarka. Rage kashe kuɗin da ba dole ba.",
            )),
            ("budget_insight_budget_surplus", (
                "You have a surplus. Consider saving or investing it.",
                "Kana da rara. Ka yi tunanin ajiyewa ko saka hannun jari.",
            )),
            ("budget_insight_set_savings_goal", (
                "Set a savings goal to build financial discipline.",
                "Saita burin ajiya don gina tarbiyyar kuɗi.",
            )),
            // net worth
            ("net_worth_calculator", ("Net Worth Calculator", "Ma'aunin Dukiya")),
            ("net_worth_badge_wealth_builder", ("Wealth Builder", "Mai Gina Dukiya")),
            ("net_worth_badge_debt_free", ("Debt Free", "Mara Bashi")),
            ("net_worth_badge_savings_champion", ("Savings Champion", "Gwarzon Ajiya")),
            ("net_worth_badge_property_mogul", ("Property Mogul", "Sarkin Gidaje")),
            // emergency fund
            ("emergency_fund_planner", ("Emergency Fund Planner", "Mai Tsara Asusun Gaggawa")),
            // financial health
            ("financial_health_score", ("Financial Health Score", "Makin Lafiyar Kuɗi")),
            ("financial_health_income_zero_error", (
                "Income must be greater than zero to calculate a score.",
                "Kuɗin shiga dole ya zarce sifili kafin a lissafa maki.",
            )),
            ("financial_health_status_excellent", ("Excellent", "Madalla")),
            ("financial_health_status_good", ("Good", "Mai Kyau")),
            ("financial_health_status_needs_improvement", ("Needs Improvement", "Yana Bukatar Ingantawa")),
            ("financial_health_badge_financial_star", ("Financial Star", "Tauraron Kuɗi")),
            ("financial_health_badge_debt_manager", ("Debt Manager", "Mai Kula da Bashi")),
            ("financial_health_badge_savings_pro", ("Savings Pro", "Kwararren Ajiya")),
            ("financial_health_badge_interest_free", ("Interest Free", "Mara Ruwan Bashi")),
            // quiz
            ("quiz_title", ("Money Personality Quiz", "Tambayoyin Halin Kuɗi")),
            // feedback
            ("feedback_thanks", ("Thank you for your feedback", "Mun gode da ra'ayinka")),
            ("feedback_invalid_rating", ("Rating must be between 1 and 5", "Maki dole ya kasance tsakanin 1 da 5")),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_then_key() {
        assert_eq!(trans("login", Lang::Ha), "Shiga");
        assert_eq!(trans("no_such_key", Lang::Ha), "no_such_key");
    }

    #[test]
    fn accept_language_parsing() {
        assert_eq!(lang_from_accept_language("ha-NG,ha;q=0.9,en;q=0.8"), Lang::Ha);
        assert_eq!(lang_from_accept_language("fr-FR,fr;q=0.9"), Lang::En);
        assert_eq!(lang_from_accept_language("en-US"), Lang::En);
    }
}
