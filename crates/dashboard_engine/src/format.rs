//! Display helpers. Values stay raw in the snapshot and are only formatted here.

use brokerage_positions::parse_amount;
use serde::Serialize;

pub const PLACEHOLDER: &str = "-";

/// `$1,234.56` style, `-` for empty or non-numeric input.
pub fn format_currency(raw: &str) -> String {
    match parse_amount(raw) {
        Some(v) => format_amount(v),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_amount(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, whole, cents % 100)
}

/// Text already carrying `%` is returned unchanged.
pub fn format_percentage(raw: &str) -> String {
    let t = raw.trim();
    if t.is_empty() {
        return PLACEHOLDER.to_string();
    }
    if t.contains('%') {
        return t.to_string();
    }
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() => format!("{:.2}%", v),
        _ => PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeDirection {
    Up,
    Down,
}

pub fn change_direction(percent_change: &str) -> ChangeDirection {
    if percent_change.contains('+') {
        ChangeDirection::Up
    } else {
        ChangeDirection::Down
    }
}

fn group_thousands(mut n: u64) -> String {
    let mut parts: Vec<String> = Vec::new();
    while n >= 1000 {
        parts.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    parts.push(n.to_string());
    parts.reverse();
    parts.join(",")
}
