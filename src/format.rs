// format.rs
// Currency and date rendering shared by the HTML row builders and the PDFs.

use mongodb::bson::DateTime;

/// Format an amount as naira with thousands separators, e.g. "₦12,345.67".
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as i64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!(
        "{}₦{}.{:02}",
        if negative { "-" } else { "" },
        grouped,
        fraction
    )
}

pub fn format_date(date: &DateTime) -> String {
    date.to_chrono().format("%Y-%m-%d").to_string()
}

pub fn format_datetime(date: &DateTime) -> String {
    date.to_chrono().format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_currency(0.0), "₦0.00");
        assert_eq!(format_currency(1234.5), "₦1,234.50");
        assert_eq!(format_currency(1000000.0), "₦1,000,000.00");
        assert_eq!(format_currency(-250.75), "-₦250.75");
    }
}
