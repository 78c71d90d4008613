use std::env;
use std::str::FromStr;

use chrono::NaiveTime;

use crate::{errors::AppError, slots::WorkingHours};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub working_hours: WorkingHours,
    pub default_buffer_before_min: i64,
    pub default_buffer_after_min: i64,
    pub currency: String,
    pub admin: AdminBootstrap,
    pub seed_demo: bool,
}

#[derive(Clone, Debug)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let start = parse_time("WORKDAY_START", &get("WORKDAY_START", "09:00"))?;
        let end = parse_time("WORKDAY_END", &get("WORKDAY_END", "17:00"))?;
        let step: i64 = parse_num("SLOT_STEP_MIN", &get("SLOT_STEP_MIN", "30"))?;
        if end <= start {
            return Err(AppError::Config(
                "WORKDAY_END must be later than WORKDAY_START".to_string(),
            ));
        }
        if step <= 0 {
            return Err(AppError::Config("SLOT_STEP_MIN must be positive".to_string()));
        }

        Ok(Self {
            database_url: get("DATABASE_URL", "sqlite://./data/salon.db"),
            port: parse_num("PORT", &get("PORT", "8080"))?,
            working_hours: WorkingHours::new(start, end, step),
            default_buffer_before_min: parse_num(
                "DEFAULT_BUFFER_BEFORE_MIN",
                &get("DEFAULT_BUFFER_BEFORE_MIN", "0"),
            )?,
            default_buffer_after_min: parse_num(
                "DEFAULT_BUFFER_AFTER_MIN",
                &get("DEFAULT_BUFFER_AFTER_MIN", "5"),
            )?,
            currency: get("CURRENCY", "USD"),
            admin: AdminBootstrap {
                username: get("ADMIN_USER", "admin"),
                password: get("ADMIN_PASSWORD", "admin"),
                display_name: get("ADMIN_DISPLAY_NAME", "Salon Manager"),
            },
            seed_demo: get("SEED_DEMO", "false") == "true",
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            working_hours: WorkingHours::default(),
            default_buffer_before_min: 0,
            default_buffer_after_min: 5,
            currency: "USD".to_string(),
            admin: AdminBootstrap {
                username: "admin".to_string(),
                password: "admin".to_string(),
                display_name: "Salon Manager".to_string(),
            },
            seed_demo: false,
        }
    }
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| AppError::Config(format!("{key} must be HH:MM, got '{value}'")))
}

fn parse_num<T: FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} is not a valid number: '{value}'")))
}
