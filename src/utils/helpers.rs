//! Helper functions for EventDesk

use rust_decimal::Decimal;

/// Format a monetary amount with its currency code
pub fn format_money(amount: Decimal, currency: &str, decimal_places: u32) -> String {
    format!("{} {}", amount.round_dp(decimal_places), currency)
}

/// Basic e-mail shape check
pub fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    parts.len() == 2 && !parts[0].is_empty() && parts[1].contains('.')
}

/// Strip path separators and control characters from an uploaded filename
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect()
}

/// Storage path for an uploaded image field value
pub fn file_value_path(event_id: i64, field_id: i64, filename: &str) -> String {
    format!(
        "registration_fields/event_{}/field_{}/{}",
        event_id,
        field_id,
        sanitize_filename(filename)
    )
}
