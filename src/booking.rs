//! Appointment booking rules.
//!
//! Every operation takes the acting party explicitly: a public website
//! visitor or an authenticated back-office user. Writes run in a single
//! transaction so a rejected overlap leaves nothing behind.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::SqliteConnection;

use crate::{
    auth::Actor,
    config::Config,
    db::{self, APPOINTMENT_SELECT, APPOINTMENT_SEQUENCE},
    errors::{AppError, AppResult},
    models::{
        AppointmentRow, AppointmentState, EmployeeRow, JobRow, PartnerRow, ServiceRow, Source,
        WorkflowAction, PRODUCT_TYPE_SERVICE,
    },
    slots::{service_minutes, Interval, Slot, WorkingHours, MAX_MINUTES},
    state::AppState,
};

const OVERLAP_MESSAGE: &str = "This stylist already has a confirmed appointment overlapping this time.";

/// Derived end: the service plus both buffers.
pub fn compute_end(
    start: NaiveDateTime,
    duration_min: i64,
    before_min: i64,
    after_min: i64,
) -> AppResult<NaiveDateTime> {
    duration_min
        .checked_add(before_min)
        .and_then(|total| total.checked_add(after_min))
        .and_then(Duration::try_minutes)
        .and_then(|total| start.checked_add_signed(total))
        .ok_or_else(|| AppError::validation("Appointment end is out of range."))
}

/// Accepts `YYYY-MM-DDTHH:MM` (datetime-local inputs) or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_start(value: &str) -> AppResult<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| AppError::InvalidDateTime(value.to_string()))
}

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(value.to_string()))
}

#[derive(Clone, Debug)]
pub struct NewAppointment {
    pub partner_id: i64,
    pub service_product_id: i64,
    pub employee_id: i64,
    pub start_dt: NaiveDateTime,
    pub duration_min: Option<i64>,
    pub buffer_before_min: Option<i64>,
    pub buffer_after_min: Option<i64>,
    pub source: Source,
    pub state: AppointmentState,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AppointmentUpdate {
    pub service_product_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub start_dt: Option<NaiveDateTime>,
    pub duration_min: Option<i64>,
    pub buffer_before_min: Option<i64>,
    pub buffer_after_min: Option<i64>,
    pub notes: Option<String>,
}

/// What the public booking form submits.
#[derive(Clone, Debug)]
pub struct BookingRequest {
    pub service_product_id: i64,
    pub employee_id: i64,
    pub start_dt: String,
    pub name: String,
    pub phone: String,
    pub notes: Option<String>,
}

// ---------- Catalog and directory ----------

pub async fn list_services(state: &AppState, _actor: &Actor) -> AppResult<Vec<ServiceRow>> {
    let rows = sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, name, product_type, list_price, service_duration
           FROM products
           WHERE product_type = ? AND active = 1
           ORDER BY name"#,
    )
    .bind(PRODUCT_TYPE_SERVICE)
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}

pub async fn list_products(state: &AppState, actor: &Actor) -> AppResult<Vec<ServiceRow>> {
    actor.admin()?;
    let rows = sqlx::query_as::<_, ServiceRow>(
        "SELECT id, name, product_type, list_price, service_duration FROM products WHERE active = 1 ORDER BY name",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}

pub async fn create_product(
    state: &AppState,
    actor: &Actor,
    name: &str,
    product_type: &str,
    list_price: f64,
    service_duration: f64,
) -> AppResult<i64> {
    actor.admin()?;
    if name.trim().is_empty() {
        return Err(AppError::validation("Product name is required."));
    }
    if !list_price.is_finite() || !service_duration.is_finite() || list_price < 0.0 || service_duration < 0.0 {
        return Err(AppError::validation("Price and duration cannot be negative."));
    }
    if service_duration * 60.0 > MAX_MINUTES as f64 {
        return Err(AppError::validation("A service cannot last longer than 24 hours."));
    }
    let id = sqlx::query(
        "INSERT INTO products (name, product_type, list_price, service_duration, active) VALUES (?, ?, ?, ?, 1)",
    )
    .bind(name.trim())
    .bind(product_type)
    .bind(list_price)
    .bind(service_duration)
    .execute(&state.db)
    .await?
    .last_insert_rowid();
    Ok(id)
}

const EMPLOYEE_SELECT: &str = r#"SELECT e.id, e.name, j.name AS job_name,
              COALESCE(j.is_salon_role, 0) AS is_salon_role
       FROM employees e
       LEFT JOIN jobs j ON e.job_id = j.id"#;

/// Active employees whose job title is flagged as a salon role.
pub async fn list_bookable_staff(state: &AppState, _actor: &Actor) -> AppResult<Vec<EmployeeRow>> {
    let query = format!("{EMPLOYEE_SELECT} WHERE e.active = 1 AND j.is_salon_role = 1 ORDER BY e.name");
    let rows = sqlx::query_as::<_, EmployeeRow>(&query)
        .fetch_all(&state.db)
        .await?;
    Ok(rows)
}

pub async fn list_employees(state: &AppState, actor: &Actor) -> AppResult<Vec<EmployeeRow>> {
    actor.admin()?;
    let query = format!("{EMPLOYEE_SELECT} WHERE e.active = 1 ORDER BY e.name");
    let rows = sqlx::query_as::<_, EmployeeRow>(&query)
        .fetch_all(&state.db)
        .await?;
    Ok(rows)
}

pub async fn create_employee(
    state: &AppState,
    actor: &Actor,
    name: &str,
    job_id: Option<i64>,
) -> AppResult<i64> {
    actor.admin()?;
    if name.trim().is_empty() {
        return Err(AppError::validation("Employee name is required."));
    }
    let id = sqlx::query("INSERT INTO employees (name, job_id, active) VALUES (?, ?, 1)")
        .bind(name.trim())
        .bind(job_id)
        .execute(&state.db)
        .await?
        .last_insert_rowid();
    Ok(id)
}

pub async fn list_jobs(state: &AppState, actor: &Actor) -> AppResult<Vec<JobRow>> {
    actor.admin()?;
    let rows = sqlx::query_as::<_, JobRow>("SELECT id, name, is_salon_role FROM jobs ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    Ok(rows)
}

pub async fn create_job(state: &AppState, actor: &Actor, name: &str, is_salon_role: bool) -> AppResult<i64> {
    actor.admin()?;
    if name.trim().is_empty() {
        return Err(AppError::validation("Job title is required."));
    }
    let id = sqlx::query("INSERT INTO jobs (name, is_salon_role) VALUES (?, ?)")
        .bind(name.trim())
        .bind(is_salon_role)
        .execute(&state.db)
        .await?
        .last_insert_rowid();
    Ok(id)
}

async fn fetch_service(conn: &mut SqliteConnection, id: i64) -> AppResult<ServiceRow> {
    sqlx::query_as::<_, ServiceRow>(
        "SELECT id, name, product_type, list_price, service_duration FROM products WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Service {id}")))
}

async fn fetch_employee(conn: &mut SqliteConnection, id: i64) -> AppResult<EmployeeRow> {
    let query = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
    sqlx::query_as::<_, EmployeeRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {id}")))
}

/// Reuses the customer with exactly this phone number, or creates one.
pub async fn find_or_create_partner(
    conn: &mut SqliteConnection,
    name: &str,
    phone: &str,
) -> AppResult<PartnerRow> {
    let existing = sqlx::query_as::<_, PartnerRow>(
        "SELECT id, name FROM partners WHERE phone = ? ORDER BY id LIMIT 1",
    )
    .bind(phone)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(partner) = existing {
        if partner.name != name {
            log::info!(
                "Phone {phone} belongs to customer #{} '{}', booking under that record instead of '{name}'",
                partner.id,
                partner.name
            );
        }
        return Ok(partner);
    }

    let id = sqlx::query("INSERT INTO partners (name, phone, created_at) VALUES (?, ?, ?)")
        .bind(name)
        .bind(phone)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
    log::info!("Created customer #{id} for phone {phone}");

    Ok(PartnerRow {
        id,
        name: name.to_string(),
    })
}

// ---------- Availability ----------

async fn busy_intervals(
    conn: &mut SqliteConnection,
    employee_id: i64,
    date: NaiveDate,
) -> AppResult<Vec<Interval>> {
    let day = WorkingHours::day_bounds(date);
    let rows = sqlx::query_as::<_, (NaiveDateTime, NaiveDateTime)>(
        r#"SELECT start_dt, end_dt FROM appointments
           WHERE employee_id = ? AND state IN (?, ?)
             AND start_dt >= ? AND start_dt < ?
           ORDER BY start_dt"#,
    )
    .bind(employee_id)
    .bind(AppointmentState::Confirmed.as_str())
    .bind(AppointmentState::InService.as_str())
    .bind(day.start)
    .bind(day.end)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(start, end)| Interval::new(start, end))
        .collect())
}

/// Bookable start times for a staff member, a service and a calendar day.
pub async fn available_slots(
    state: &AppState,
    actor: &Actor,
    employee_id: i64,
    service_product_id: i64,
    date_str: &str,
) -> AppResult<Vec<Slot>> {
    let date = parse_date(date_str)?;
    let mut conn = state.db.acquire().await?;
    fetch_employee(&mut conn, employee_id).await?;
    let service = fetch_service(&mut conn, service_product_id).await?;
    let duration = service_minutes(service.service_duration);
    if duration > MAX_MINUTES {
        return Err(AppError::validation(format!(
            "Service {} is longer than a working day can hold.",
            service.name
        )));
    }
    let busy = busy_intervals(&mut conn, employee_id, date).await?;

    let slots = state.config.working_hours.slots_for(date, duration, &busy);
    log::debug!(
        "{} requested slots for employee {employee_id} on {date}: {} free",
        actor.describe(),
        slots.len()
    );
    Ok(slots)
}

// ---------- Overlap guard ----------

async fn ensure_no_overlap(
    conn: &mut SqliteConnection,
    appointment_id: Option<i64>,
    employee_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> AppResult<()> {
    let clashes = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM appointments
           WHERE id != ? AND employee_id = ? AND state IN (?, ?)
             AND start_dt < ? AND end_dt > ?"#,
    )
    .bind(appointment_id.unwrap_or(-1))
    .bind(employee_id)
    .bind(AppointmentState::Confirmed.as_str())
    .bind(AppointmentState::InService.as_str())
    .bind(end)
    .bind(start)
    .fetch_one(&mut *conn)
    .await?;

    if clashes > 0 {
        log::warn!("Rejected overlapping booking for employee {employee_id} at {start}");
        return Err(AppError::validation(OVERLAP_MESSAGE));
    }
    Ok(())
}

fn check_minutes(duration: i64, before: i64, after: i64) -> AppResult<()> {
    if duration < 0 || before < 0 || after < 0 {
        return Err(AppError::validation("Durations and buffers cannot be negative."));
    }
    if duration > MAX_MINUTES || before > MAX_MINUTES || after > MAX_MINUTES {
        return Err(AppError::validation("Durations and buffers are limited to 24 hours."));
    }
    Ok(())
}

fn ensure_service(service: &ServiceRow) -> AppResult<()> {
    if !service.is_service() {
        return Err(AppError::validation("Selected product must be a Service type."));
    }
    Ok(())
}

// ---------- Writes ----------

async fn insert_appointment(
    conn: &mut SqliteConnection,
    config: &Config,
    actor: &Actor,
    new: NewAppointment,
) -> AppResult<i64> {
    if matches!(actor, Actor::Public)
        && (new.state != AppointmentState::Requested || new.source != Source::Website)
    {
        return Err(AppError::Forbidden(
            "website bookings can only be requested".to_string(),
        ));
    }

    let service = fetch_service(conn, new.service_product_id).await?;
    ensure_service(&service)?;
    fetch_employee(conn, new.employee_id).await?;

    let duration = new
        .duration_min
        .unwrap_or_else(|| service_minutes(service.service_duration));
    let before = new.buffer_before_min.unwrap_or(config.default_buffer_before_min);
    let after = new.buffer_after_min.unwrap_or(config.default_buffer_after_min);
    check_minutes(duration, before, after)?;
    let end = compute_end(new.start_dt, duration, before, after)?;

    if new.state.is_active() {
        ensure_no_overlap(conn, None, new.employee_id, new.start_dt, end).await?;
    }

    let reference = db::next_reference(conn, APPOINTMENT_SEQUENCE).await?;
    let id = sqlx::query(
        r#"INSERT INTO appointments
           (name, partner_id, service_product_id, employee_id, start_dt, duration_min,
            buffer_before_min, buffer_after_min, end_dt, price, currency, source, state, notes, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&reference)
    .bind(new.partner_id)
    .bind(service.id)
    .bind(new.employee_id)
    .bind(new.start_dt)
    .bind(duration)
    .bind(before)
    .bind(after)
    .bind(end)
    .bind(service.list_price)
    .bind(&config.currency)
    .bind(new.source.as_str())
    .bind(new.state.as_str())
    .bind(new.notes.filter(|notes| !notes.trim().is_empty()))
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    let author = actor.author_id();
    let created = [
        ("name", reference.clone()),
        ("partner_id", new.partner_id.to_string()),
        ("service_product_id", service.id.to_string()),
        ("employee_id", new.employee_id.to_string()),
        ("start_dt", new.start_dt.to_string()),
        ("end_dt", end.to_string()),
        ("source", new.source.as_str().to_string()),
        ("state", new.state.as_str().to_string()),
    ];
    for (field, value) in created {
        db::log_change(conn, id, field, None, Some(value), author).await?;
    }

    log::info!(
        "{} created appointment {reference} ({}) for employee {} at {}",
        actor.describe(),
        new.state,
        new.employee_id,
        new.start_dt
    );
    Ok(id)
}

pub async fn create_appointment(
    state: &AppState,
    actor: &Actor,
    new: NewAppointment,
) -> AppResult<AppointmentRow> {
    let mut tx = state.db.begin().await?;
    let id = insert_appointment(&mut tx, &state.config, actor, new).await?;
    let row = db::fetch_appointment(&mut tx, id).await?;
    tx.commit().await?;
    Ok(row)
}

/// Website booking: resolves the customer by phone and files a request.
pub async fn submit_booking(
    state: &AppState,
    actor: &Actor,
    request: BookingRequest,
) -> AppResult<AppointmentRow> {
    let start_dt = parse_start(&request.start_dt)?;
    if request.name.trim().is_empty() || request.phone.trim().is_empty() {
        return Err(AppError::validation("Name and phone are required."));
    }

    let mut tx = state.db.begin().await?;
    let employee = fetch_employee(&mut tx, request.employee_id).await?;
    if !employee.is_salon_role {
        return Err(AppError::validation("Selected staff member does not take appointments."));
    }
    let partner = find_or_create_partner(&mut tx, request.name.trim(), request.phone.trim()).await?;

    let id = insert_appointment(
        &mut tx,
        &state.config,
        actor,
        NewAppointment {
            partner_id: partner.id,
            service_product_id: request.service_product_id,
            employee_id: employee.id,
            start_dt,
            duration_min: None,
            buffer_before_min: None,
            buffer_after_min: None,
            source: Source::Website,
            state: AppointmentState::Requested,
            notes: request.notes,
        },
    )
    .await?;
    let row = db::fetch_appointment(&mut tx, id).await?;
    tx.commit().await?;
    Ok(row)
}

/// Staff-side booking for a customer given by name and phone (walk-ins,
/// calls, social media). `new.partner_id` is replaced by the resolved customer.
pub async fn create_for_customer(
    state: &AppState,
    actor: &Actor,
    name: &str,
    phone: &str,
    mut new: NewAppointment,
) -> AppResult<AppointmentRow> {
    actor.back_office()?;
    if name.trim().is_empty() || phone.trim().is_empty() {
        return Err(AppError::validation("Customer name and phone are required."));
    }

    let mut tx = state.db.begin().await?;
    new.partner_id = find_or_create_partner(&mut tx, name.trim(), phone.trim()).await?.id;
    let id = insert_appointment(&mut tx, &state.config, actor, new).await?;
    let row = db::fetch_appointment(&mut tx, id).await?;
    tx.commit().await?;
    Ok(row)
}

/// Back-office edit of the scheduling fields; end and price follow their inputs.
pub async fn update_appointment(
    state: &AppState,
    actor: &Actor,
    appointment_id: i64,
    update: AppointmentUpdate,
) -> AppResult<AppointmentRow> {
    actor.admin()?;
    let mut tx = state.db.begin().await?;
    let current = db::fetch_appointment(&mut tx, appointment_id).await?;

    let (service_id, price) = match update.service_product_id {
        Some(id) if id != current.service_product_id => {
            let service = fetch_service(&mut tx, id).await?;
            ensure_service(&service)?;
            (service.id, service.list_price)
        }
        _ => (current.service_product_id, current.price),
    };
    let employee_id = match update.employee_id {
        Some(id) if id != current.employee_id => fetch_employee(&mut tx, id).await?.id,
        _ => current.employee_id,
    };
    let start = update.start_dt.unwrap_or(current.start_dt);
    let duration = update.duration_min.unwrap_or(current.duration_min);
    let before = update.buffer_before_min.unwrap_or(current.buffer_before_min);
    let after = update.buffer_after_min.unwrap_or(current.buffer_after_min);
    check_minutes(duration, before, after)?;
    let end = compute_end(start, duration, before, after)?;
    let notes = update.notes.or(current.notes.clone());

    if current.state().is_active() {
        ensure_no_overlap(&mut tx, Some(appointment_id), employee_id, start, end).await?;
    }

    sqlx::query(
        r#"UPDATE appointments
           SET service_product_id = ?, employee_id = ?, start_dt = ?, duration_min = ?,
               buffer_before_min = ?, buffer_after_min = ?, end_dt = ?, price = ?, notes = ?
           WHERE id = ?"#,
    )
    .bind(service_id)
    .bind(employee_id)
    .bind(start)
    .bind(duration)
    .bind(before)
    .bind(after)
    .bind(end)
    .bind(price)
    .bind(&notes)
    .bind(appointment_id)
    .execute(&mut *tx)
    .await?;

    let author = actor.author_id();
    let changes = [
        ("service_product_id", current.service_product_id.to_string(), service_id.to_string()),
        ("employee_id", current.employee_id.to_string(), employee_id.to_string()),
        ("start_dt", current.start_dt.to_string(), start.to_string()),
        ("duration_min", current.duration_min.to_string(), duration.to_string()),
        ("buffer_before_min", current.buffer_before_min.to_string(), before.to_string()),
        ("buffer_after_min", current.buffer_after_min.to_string(), after.to_string()),
        ("end_dt", current.end_dt.to_string(), end.to_string()),
    ];
    for (field, old, new) in changes {
        db::log_change(&mut tx, appointment_id, field, Some(old), Some(new), author).await?;
    }

    let row = db::fetch_appointment(&mut tx, appointment_id).await?;
    tx.commit().await?;
    Ok(row)
}

/// Runs a workflow button. The target state is set directly; entering an
/// active state re-checks the overlap rule.
pub async fn apply_action(
    state: &AppState,
    actor: &Actor,
    appointment_id: i64,
    action: WorkflowAction,
) -> AppResult<AppointmentRow> {
    let user = actor.back_office()?;
    let mut tx = state.db.begin().await?;
    let current = db::fetch_appointment(&mut tx, appointment_id).await?;

    if !user.is_admin() {
        let own = user.employee_id == Some(current.employee_id);
        let allowed = matches!(
            action,
            WorkflowAction::Start | WorkflowAction::Done | WorkflowAction::NoShow
        );
        if !own || !allowed {
            return Err(AppError::Forbidden(format!(
                "{} cannot {} appointment {}",
                user.display_name,
                action.slug(),
                current.name
            )));
        }
    }

    let target = action.target();
    if target.is_active() {
        ensure_no_overlap(
            &mut tx,
            Some(appointment_id),
            current.employee_id,
            current.start_dt,
            current.end_dt,
        )
        .await?;
    }

    sqlx::query("UPDATE appointments SET state = ? WHERE id = ?")
        .bind(target.as_str())
        .bind(appointment_id)
        .execute(&mut *tx)
        .await?;
    db::log_change(
        &mut tx,
        appointment_id,
        "state",
        Some(current.state.clone()),
        Some(target.as_str().to_string()),
        actor.author_id(),
    )
    .await?;

    let row = db::fetch_appointment(&mut tx, appointment_id).await?;
    tx.commit().await?;
    log::info!(
        "{} moved appointment {} from {} to {}",
        user.display_name,
        row.name,
        current.state,
        target
    );
    Ok(row)
}

// ---------- Queries ----------

pub async fn get_appointment(state: &AppState, actor: &Actor, appointment_id: i64) -> AppResult<AppointmentRow> {
    let user = actor.back_office()?;
    let mut conn = state.db.acquire().await?;
    let row = db::fetch_appointment(&mut conn, appointment_id).await?;
    if !user.is_admin() && user.employee_id != Some(row.employee_id) {
        return Err(AppError::Forbidden(format!("appointment {}", row.name)));
    }
    Ok(row)
}

pub async fn list_appointments(
    state: &AppState,
    actor: &Actor,
    filter: Option<AppointmentState>,
) -> AppResult<Vec<AppointmentRow>> {
    actor.admin()?;
    let rows = match filter {
        Some(appointment_state) => {
            let query = format!("{APPOINTMENT_SELECT} WHERE a.state = ? ORDER BY a.start_dt ASC");
            sqlx::query_as::<_, AppointmentRow>(&query)
                .bind(appointment_state.as_str())
                .fetch_all(&state.db)
                .await?
        }
        None => {
            let query = format!("{APPOINTMENT_SELECT} ORDER BY a.start_dt ASC");
            sqlx::query_as::<_, AppointmentRow>(&query)
                .fetch_all(&state.db)
                .await?
        }
    };
    Ok(rows)
}

/// One staff member's agenda for a day, in start order.
pub async fn agenda_for(
    state: &AppState,
    actor: &Actor,
    employee_id: i64,
    date: NaiveDate,
) -> AppResult<Vec<AppointmentRow>> {
    let user = actor.back_office()?;
    if !user.is_admin() && user.employee_id != Some(employee_id) {
        return Err(AppError::Forbidden("another stylist's agenda".to_string()));
    }
    let day = WorkingHours::day_bounds(date);
    let query = format!(
        "{APPOINTMENT_SELECT} WHERE a.employee_id = ? AND a.start_dt >= ? AND a.start_dt < ? ORDER BY a.start_dt ASC"
    );
    let rows = sqlx::query_as::<_, AppointmentRow>(&query)
        .bind(employee_id)
        .bind(day.start)
        .bind(day.end)
        .fetch_all(&state.db)
        .await?;
    Ok(rows)
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use crate::auth::AuthUser;
    use crate::models::ROLE_ADMIN;

    pub fn admin() -> Actor {
        Actor::User(AuthUser {
            id: 1,
            display_name: "Salon Manager".to_string(),
            role: ROLE_ADMIN.to_string(),
            employee_id: None,
        })
    }

    pub struct Salon {
        pub barber: i64,
        pub receptionist: i64,
        pub haircut: i64,
        pub shampoo: i64,
        pub customer: i64,
    }

    /// One barber, one non-bookable receptionist, a 30 minute haircut
    /// service, a consumable product and a customer.
    pub async fn salon(state: &AppState) -> Salon {
        let admin = admin();
        let barber_job = create_job(state, &admin, "Barber", true).await.unwrap();
        let desk_job = create_job(state, &admin, "Receptionist", false).await.unwrap();
        let barber = create_employee(state, &admin, "Marco", Some(barber_job)).await.unwrap();
        let receptionist = create_employee(state, &admin, "Sam", Some(desk_job)).await.unwrap();
        let haircut = create_product(state, &admin, "Haircut", "service", 25.0, 0.5)
            .await
            .unwrap();
        let shampoo = create_product(state, &admin, "Shampoo", "consu", 9.0, 0.0)
            .await
            .unwrap();
        let mut conn = state.db.acquire().await.unwrap();
        let customer = find_or_create_partner(&mut conn, "Ada", "555-0100")
            .await
            .unwrap()
            .id;
        Salon {
            barber,
            receptionist,
            haircut,
            shampoo,
            customer,
        }
    }

    pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    pub fn booking(salon: &Salon, start: NaiveDateTime, state: AppointmentState) -> NewAppointment {
        NewAppointment {
            partner_id: salon.customer,
            service_product_id: salon.haircut,
            employee_id: salon.barber,
            start_dt: start,
            duration_min: None,
            buffer_before_min: Some(0),
            buffer_after_min: Some(0),
            source: Source::Call,
            state,
            notes: None,
        }
    }
}
