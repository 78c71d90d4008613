pub mod admin;
pub mod public;
pub mod stylist;

use crate::{
    errors::AppError,
    models::{AppointmentRow, EmployeeRow, ServiceRow},
};

#[derive(Clone, Debug)]
pub struct AppointmentView {
    pub id: i64,
    pub name: String,
    pub customer: String,
    pub phone: String,
    pub service: String,
    pub stylist: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub start_input: String,
    pub duration_min: i64,
    pub buffer_before_min: i64,
    pub buffer_after_min: i64,
    pub price: String,
    pub state: String,
    pub state_label: String,
    pub source_label: String,
    pub notes: String,
    pub has_notes: bool,
}

pub fn to_view(row: AppointmentRow) -> AppointmentView {
    let state = row.state();
    let source_label = row
        .source
        .parse::<crate::models::Source>()
        .map(|source| source.label().to_string())
        .unwrap_or_else(|_| row.source.clone());
    let notes = row.notes.unwrap_or_default();
    AppointmentView {
        id: row.id,
        name: row.name,
        customer: row.partner_name,
        phone: row.phone.unwrap_or_default(),
        service: row.service_name,
        stylist: row.employee_name,
        date: row.start_dt.format("%a %d %b %Y").to_string(),
        start: row.start_dt.format("%H:%M").to_string(),
        end: row.end_dt.format("%H:%M").to_string(),
        start_input: row.start_dt.format("%Y-%m-%dT%H:%M").to_string(),
        duration_min: row.duration_min,
        buffer_before_min: row.buffer_before_min,
        buffer_after_min: row.buffer_after_min,
        price: format!("{:.2} {}", row.price, row.currency),
        state: state.as_str().to_string(),
        state_label: state.label().to_string(),
        source_label,
        has_notes: !notes.trim().is_empty(),
        notes,
    }
}

#[derive(Clone, Debug)]
pub struct ServiceOption {
    pub id: i64,
    pub name: String,
    pub duration: String,
    pub price: String,
    pub selected: bool,
}

pub fn service_options(rows: Vec<ServiceRow>, selected: Option<i64>) -> Vec<ServiceOption> {
    rows.into_iter()
        .map(|row| ServiceOption {
            id: row.id,
            duration: format!("{} min", crate::slots::service_minutes(row.service_duration)),
            price: format!("{:.2}", row.list_price),
            selected: selected == Some(row.id),
            name: row.name,
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct StaffOption {
    pub id: i64,
    pub name: String,
    pub initials: String,
    pub selected: bool,
}

pub fn staff_options(rows: Vec<EmployeeRow>, selected: Option<i64>) -> Vec<StaffOption> {
    rows.into_iter()
        .map(|row| {
            let initials = row
                .name
                .split_whitespace()
                .filter_map(|part| part.chars().next())
                .take(2)
                .collect::<String>();
            StaffOption {
                id: row.id,
                initials: initials.to_uppercase(),
                selected: selected == Some(row.id),
                name: row.name,
            }
        })
        .collect()
}

/// Empty or unparsable form ids read as "not chosen".
pub fn parse_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|value| value.trim().parse().ok())
}

/// Turns the errors a form can show back to the user into a message; the
/// rest propagate as HTTP errors.
pub fn form_error(err: AppError) -> Result<String, actix_web::Error> {
    match err {
        AppError::InvalidDateTime(value) => Ok(format!("Invalid date format: '{value}'.")),
        AppError::InvalidDate(value) => Ok(format!("Invalid date: '{value}'.")),
        AppError::Validation(message) => Ok(message),
        AppError::NotFound(what) => Ok(format!("{what} does not exist.")),
        err => Err(err.into()),
    }
}

/// Parses an optional minutes field; blank means "keep the default".
pub fn parse_minutes(value: Option<&str>, label: &str) -> Result<Option<i64>, AppError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::validation(format!("{label} must be a whole number of minutes."))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_and_minutes_are_unset() {
        assert_eq!(parse_id(Some(" 12 ")), Some(12));
        assert_eq!(parse_id(Some("")), None);
        assert_eq!(parse_id(None), None);
        assert_eq!(parse_minutes(Some(""), "Duration").unwrap(), None);
        assert_eq!(parse_minutes(Some("45"), "Duration").unwrap(), Some(45));
        assert!(parse_minutes(Some("4h"), "Duration").is_err());
    }

    #[test]
    fn user_facing_errors_become_messages() {
        assert_eq!(form_error(AppError::validation("taken")).unwrap(), "taken");
        assert!(form_error(AppError::Config("x".to_string())).is_err());
    }
}
