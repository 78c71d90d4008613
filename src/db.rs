use std::{fs, path::Path};

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    auth::hash_password,
    config::{AdminBootstrap, Config},
    errors::{AppError, AppResult},
    models::{AppointmentRow, TrackingRow, ROLE_ADMIN},
};

pub const APPOINTMENT_SEQUENCE: &str = "salon.appointment";

pub const APPOINTMENT_SELECT: &str = r#"SELECT a.id, a.name, a.partner_id, p.name AS partner_name, p.phone AS phone,
              a.service_product_id, s.name AS service_name,
              a.employee_id, e.name AS employee_name,
              a.start_dt, a.duration_min, a.buffer_before_min, a.buffer_after_min, a.end_dt,
              a.price, a.currency, a.source, a.state, a.notes
       FROM appointments a
       JOIN partners p ON a.partner_id = p.id
       JOIN products s ON a.service_product_id = s.id
       JOIN employees e ON a.employee_id = e.id"#;

pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub fn ensure_sqlite_dir(db_url: &str) -> AppResult<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool, config: &Config) -> AppResult<()> {
    seed_admin(pool, &config.admin).await?;
    if config.seed_demo {
        seed_demo(pool).await?;
    }
    Ok(())
}

/// Appends one entry to the field history of an appointment.
pub async fn log_change(
    conn: &mut SqliteConnection,
    appointment_id: i64,
    field: &str,
    old_value: Option<String>,
    new_value: Option<String>,
    author_id: Option<i64>,
) -> AppResult<()> {
    if old_value == new_value {
        return Ok(());
    }
    sqlx::query(
        r#"INSERT INTO appointment_tracking (appointment_id, field, old_value, new_value, author_id, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(appointment_id)
    .bind(field)
    .bind(old_value)
    .bind(new_value)
    .bind(author_id)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn fetch_tracking(pool: &SqlitePool, appointment_id: i64) -> AppResult<Vec<TrackingRow>> {
    let rows = sqlx::query_as::<_, TrackingRow>(
        r#"SELECT t.field, t.old_value, t.new_value, u.display_name AS author_name, t.created_at
           FROM appointment_tracking t
           LEFT JOIN users u ON t.author_id = u.id
           WHERE t.appointment_id = ?
           ORDER BY t.id"#,
    )
    .bind(appointment_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn fetch_appointment(
    conn: &mut SqliteConnection,
    appointment_id: i64,
) -> AppResult<AppointmentRow> {
    let query = format!("{APPOINTMENT_SELECT} WHERE a.id = ? LIMIT 1");
    sqlx::query_as::<_, AppointmentRow>(&query)
        .bind(appointment_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Appointment {appointment_id}")))
}

/// Draws the next reference of a sequence, e.g. `APT/00042`.
pub async fn next_reference(conn: &mut SqliteConnection, code: &str) -> AppResult<String> {
    let row = sqlx::query_as::<_, (String, i64, i64)>(
        r#"UPDATE sequences SET next_number = next_number + 1
           WHERE code = ?
           RETURNING prefix, padding, next_number - 1"#,
    )
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    let (prefix, padding, number) =
        row.ok_or_else(|| AppError::NotFound(format!("Sequence {code}")))?;
    Ok(format!("{prefix}{number:0width$}", width = padding.max(0) as usize))
}

async fn seed_admin(pool: &SqlitePool, admin: &AdminBootstrap) -> AppResult<()> {
    let existing = sqlx::query_as::<_, (i64,)>("SELECT id FROM users WHERE role = ? LIMIT 1")
        .bind(ROLE_ADMIN)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    if admin.password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash = hash_password(&admin.password)?;
    sqlx::query(
        r#"INSERT INTO users (username, display_name, role, password_hash, employee_id, active, created_at)
           VALUES (?, ?, ?, ?, NULL, 1, ?)"#,
    )
    .bind(&admin.username)
    .bind(&admin.display_name)
    .bind(ROLE_ADMIN)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    log::info!("Seeded back-office admin '{}'", admin.username);
    Ok(())
}

async fn seed_demo(pool: &SqlitePool) -> AppResult<()> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let jobs = [("Barber", true), ("Stylist", true), ("Receptionist", false)];
    for (name, salon_role) in jobs {
        sqlx::query("INSERT INTO jobs (name, is_salon_role) VALUES (?, ?)")
            .bind(name)
            .bind(salon_role)
            .execute(&mut *tx)
            .await?;
    }

    let employees = [("Marco Rossi", "Barber"), ("Lena Vogel", "Stylist"), ("Sam Reed", "Receptionist")];
    for (name, job) in employees {
        sqlx::query(
            "INSERT INTO employees (name, job_id, active) SELECT ?, id, 1 FROM jobs WHERE name = ?",
        )
        .bind(name)
        .bind(job)
        .execute(&mut *tx)
        .await?;
    }

    let services = [
        ("Signature Cut", 35.0, 0.75),
        ("Fade & Line-Up", 28.0, 0.5),
        ("Beard Sculpt", 18.0, 0.5),
        ("Full Grooming", 55.0, 1.0),
    ];
    for (name, price, hours) in services {
        sqlx::query(
            "INSERT INTO products (name, product_type, list_price, service_duration, active) VALUES (?, 'service', ?, ?, 1)",
        )
        .bind(name)
        .bind(price)
        .bind(hours)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    log::info!("Seeded demo services and staff");
    Ok(())
}
