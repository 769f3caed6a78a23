//! Utility functions for the rating service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique snapshot ID
pub fn generate_snapshot_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Format a value with an explicit sign and one decimal, e.g. `+1.3`
pub fn format_signed(value: f64) -> String {
    let rounded = format!("{:.1}", value);
    match rounded.as_str() {
        "0.0" | "-0.0" => "0.0".to_string(),
        _ if value > 0.0 => format!("+{}", rounded),
        _ => rounded,
    }
}

/// Format a rating with one decimal
pub fn format_rating(value: f64) -> String {
    format!("{:.1}", value)
}
