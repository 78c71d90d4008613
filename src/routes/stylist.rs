use actix_web::{http::header, web, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use askama::Template;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::{
    auth::{basic_config, stylist_validator, Actor, AuthUser},
    booking,
    models::{AppointmentState, WorkflowAction},
    routes::{form_error, to_view, AppointmentView},
    state::AppState,
    templates::render_form,
};

const STYLIST_ACTIONS: [WorkflowAction; 3] =
    [WorkflowAction::Start, WorkflowAction::Done, WorkflowAction::NoShow];

#[derive(Clone, Debug)]
struct AgendaButton {
    slug: String,
    label: String,
}

#[derive(Clone, Debug)]
struct AgendaEntry {
    appointment: AppointmentView,
    buttons: Vec<AgendaButton>,
}

#[derive(Template)]
#[template(path = "stylist_agenda.html")]
struct StylistAgendaTemplate {
    stylist_name: String,
    day_label: String,
    date: String,
    previous_day: String,
    next_day: String,
    entries: Vec<AgendaEntry>,
    error: String,
    has_error: bool,
    is_admin: bool,
}

#[derive(Deserialize)]
struct AgendaQuery {
    date: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(basic_config()).service(
        web::scope("/stylist")
            .wrap(HttpAuthentication::basic(stylist_validator))
            .service(web::resource("").route(web::get().to(index)))
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/agenda").route(web::get().to(agenda)))
            .service(
                web::resource("/appointments/{id}/{action}").route(web::post().to(run_action)),
            ),
    );
}

async fn index() -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, "/stylist/agenda"))
        .finish()
}

/// Buttons a stylist may press for an appointment in the given state.
fn buttons_for(appointment_state: AppointmentState) -> Vec<AgendaButton> {
    STYLIST_ACTIONS
        .into_iter()
        .filter(|action| action.target() != appointment_state)
        .filter(|_| !matches!(appointment_state, AppointmentState::Cancelled))
        .map(|action| AgendaButton {
            slug: action.slug().to_string(),
            label: action.label().to_string(),
        })
        .collect()
}

async fn agenda_page(
    state: &AppState,
    user: AuthUser,
    date: NaiveDate,
    error: Option<String>,
) -> Result<HttpResponse> {
    let Some(employee_id) = user.employee_id else {
        return Ok(HttpResponse::Forbidden().body("No agenda is linked to this account"));
    };
    let stylist_name = user.display_name.clone();
    let actor = Actor::User(user);
    let rows = booking::agenda_for(state, &actor, employee_id, date).await?;

    let entries = rows
        .into_iter()
        .map(|row| {
            let buttons = buttons_for(row.state());
            AgendaEntry {
                appointment: to_view(row),
                buttons,
            }
        })
        .collect();

    let rejected = error.is_some();
    Ok(render_form(
        StylistAgendaTemplate {
            stylist_name,
            day_label: date.format("%A %d %B %Y").to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            previous_day: (date - Duration::days(1)).format("%Y-%m-%d").to_string(),
            next_day: (date + Duration::days(1)).format("%Y-%m-%d").to_string(),
            entries,
            has_error: rejected,
            error: error.unwrap_or_default(),
            is_admin: false,
        },
        rejected,
    ))
}

async fn agenda(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    query: web::Query<AgendaQuery>,
) -> Result<HttpResponse> {
    let date = match query.date.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => booking::parse_date(value)?,
        None => chrono::Local::now().date_naive(),
    };
    agenda_page(&state, auth.into_inner(), date, None).await
}

async fn run_action(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse> {
    let user = auth.into_inner();
    let (appointment_id, slug) = path.into_inner();
    let Ok(action) = slug.parse::<WorkflowAction>() else {
        return Ok(HttpResponse::NotFound().body("Unknown action"));
    };

    let actor = Actor::User(user.clone());
    match booking::apply_action(&state, &actor, appointment_id, action).await {
        Ok(row) => Ok(HttpResponse::SeeOther()
            .append_header((
                header::LOCATION,
                format!("/stylist/agenda?date={}", row.start_dt.format("%Y-%m-%d")),
            ))
            .finish()),
        Err(err) => {
            let message = form_error(err)?;
            let today = chrono::Local::now().date_naive();
            agenda_page(&state, user, today, Some(message)).await
        }
    }
}
