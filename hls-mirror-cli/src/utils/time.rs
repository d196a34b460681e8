use std::time::Duration;

use crate::error::AppError;

/// Parse a duration such as "500ms", "5s", "1.5m" or "2h". A bare number is seconds.
pub fn parse_duration(time_str: &str) -> Result<Duration, AppError> {
    let time_str = time_str.trim();
    if time_str.is_empty() {
        return Err(AppError::ParseError(
            "Invalid duration: empty string".to_string(),
        ));
    }

    let split_index = time_str
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(time_str.len());
    let (numeric_part, unit_part) = time_str.split_at(split_index);

    let value = numeric_part
        .parse::<f64>()
        .map_err(|_| AppError::ParseError(format!("Invalid number in duration '{time_str}'")))?;

    let seconds = match unit_part.trim().to_lowercase().as_str() {
        "" | "s" => value,
        "ms" => value / 1000.0,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        unit => {
            return Err(AppError::ParseError(format!(
                "Invalid unit '{unit}' in duration '{time_str}'"
            )));
        }
    };

    Duration::try_from_secs_f64(seconds)
        .map_err(|e| AppError::ParseError(format!("Invalid duration '{time_str}': {e}")))
}
