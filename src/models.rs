use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STYLIST: &str = "stylist";

pub const PRODUCT_TYPE_SERVICE: &str = "service";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentState {
    Requested,
    Confirmed,
    InService,
    Done,
    Cancelled,
    NoShow,
}

impl AppointmentState {
    pub const ALL: [AppointmentState; 6] = [
        AppointmentState::Requested,
        AppointmentState::Confirmed,
        AppointmentState::InService,
        AppointmentState::Done,
        AppointmentState::Cancelled,
        AppointmentState::NoShow,
    ];

    /// States that take part in the no-overlap rule.
    pub const ACTIVE: [AppointmentState; 2] =
        [AppointmentState::Confirmed, AppointmentState::InService];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentState::Requested => "requested",
            AppointmentState::Confirmed => "confirmed",
            AppointmentState::InService => "in_service",
            AppointmentState::Done => "done",
            AppointmentState::Cancelled => "cancelled",
            AppointmentState::NoShow => "no_show",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentState::Requested => "Requested",
            AppointmentState::Confirmed => "Confirmed",
            AppointmentState::InService => "In Service",
            AppointmentState::Done => "Completed",
            AppointmentState::Cancelled => "Cancelled",
            AppointmentState::NoShow => "No Show",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

impl FromStr for AppointmentState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == value)
            .ok_or_else(|| format!("unknown appointment state '{value}'"))
    }
}

impl fmt::Display for AppointmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    WalkIn,
    Instagram,
    Call,
    Website,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::WalkIn, Source::Instagram, Source::Call, Source::Website];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::WalkIn => "walk_in",
            Source::Instagram => "instagram",
            Source::Call => "call",
            Source::Website => "website",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::WalkIn => "Walk-in",
            Source::Instagram => "Instagram",
            Source::Call => "Call",
            Source::Website => "Website",
        }
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == value)
            .ok_or_else(|| format!("unknown source '{value}'"))
    }
}

/// The buttons on an appointment record. Each one sets its target state
/// directly, whatever the current state is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowAction {
    Confirm,
    Start,
    Done,
    Cancel,
    NoShow,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 5] = [
        WorkflowAction::Confirm,
        WorkflowAction::Start,
        WorkflowAction::Done,
        WorkflowAction::Cancel,
        WorkflowAction::NoShow,
    ];

    pub fn target(&self) -> AppointmentState {
        match self {
            WorkflowAction::Confirm => AppointmentState::Confirmed,
            WorkflowAction::Start => AppointmentState::InService,
            WorkflowAction::Done => AppointmentState::Done,
            WorkflowAction::Cancel => AppointmentState::Cancelled,
            WorkflowAction::NoShow => AppointmentState::NoShow,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            WorkflowAction::Confirm => "confirm",
            WorkflowAction::Start => "start",
            WorkflowAction::Done => "done",
            WorkflowAction::Cancel => "cancel",
            WorkflowAction::NoShow => "no_show",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowAction::Confirm => "Confirm",
            WorkflowAction::Start => "Start Service",
            WorkflowAction::Done => "Mark Done",
            WorkflowAction::Cancel => "Cancel",
            WorkflowAction::NoShow => "No Show",
        }
    }
}

impl FromStr for WorkflowAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.slug() == value)
            .ok_or_else(|| format!("unknown action '{value}'"))
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub password_hash: String,
    pub employee_id: Option<i64>,
    pub active: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartnerRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: i64,
    pub name: String,
    pub product_type: String,
    pub list_price: f64,
    pub service_duration: f64,
}

impl ServiceRow {
    pub fn is_service(&self) -> bool {
        self.product_type == PRODUCT_TYPE_SERVICE
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: i64,
    pub name: String,
    pub is_salon_role: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployeeRow {
    pub id: i64,
    pub name: String,
    pub job_name: Option<String>,
    pub is_salon_role: bool,
}

/// Appointment joined with the display names of its references.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: i64,
    pub name: String,
    pub partner_id: i64,
    pub partner_name: String,
    pub phone: Option<String>,
    pub service_product_id: i64,
    pub service_name: String,
    pub employee_id: i64,
    pub employee_name: String,
    pub start_dt: NaiveDateTime,
    pub duration_min: i64,
    pub buffer_before_min: i64,
    pub buffer_after_min: i64,
    pub end_dt: NaiveDateTime,
    pub price: f64,
    pub currency: String,
    pub source: String,
    pub state: String,
    pub notes: Option<String>,
}

impl AppointmentRow {
    pub fn state(&self) -> AppointmentState {
        self.state.parse().unwrap_or(AppointmentState::Requested)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrackingRow {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub author_name: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_confirmed_and_in_service_are_active() {
        let active: Vec<_> = AppointmentState::ALL
            .into_iter()
            .filter(AppointmentState::is_active)
            .collect();
        assert_eq!(active, vec![AppointmentState::Confirmed, AppointmentState::InService]);
    }

    #[test]
    fn states_parse_from_their_storage_names() {
        for state in AppointmentState::ALL {
            assert_eq!(state.as_str().parse::<AppointmentState>(), Ok(state));
        }
        assert!("pending".parse::<AppointmentState>().is_err());
    }

    #[test]
    fn actions_target_their_states() {
        assert_eq!("start".parse::<WorkflowAction>().unwrap().target(), AppointmentState::InService);
        assert_eq!(WorkflowAction::NoShow.target(), AppointmentState::NoShow);
        assert!("reopen".parse::<WorkflowAction>().is_err());
    }

    #[test]
    fn source_defaults_to_walk_in() {
        assert_eq!(Source::default(), Source::WalkIn);
        assert_eq!("website".parse::<Source>(), Ok(Source::Website));
    }
}
