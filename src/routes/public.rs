use actix_web::{http::header, web, HttpResponse, Result};
use askama::Template;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::Actor,
    booking::{self, BookingRequest},
    errors::{AppError, AppResult},
    routes::{parse_id, service_options, staff_options, to_view, AppointmentView, ServiceOption, StaffOption},
    slots::Slot,
    state::AppState,
    templates::{render, render_form},
};

#[derive(Clone, Debug, Default)]
struct BookingView {
    start_dt: String,
    name: String,
    phone: String,
    notes: String,
}

#[derive(Template)]
#[template(path = "appointment_form.html")]
struct AppointmentFormTemplate {
    services: Vec<ServiceOption>,
    staff: Vec<StaffOption>,
    form: BookingView,
    error: String,
    has_error: bool,
}

#[derive(Template)]
#[template(path = "appointment_thanks.html")]
struct AppointmentThanksTemplate {
    appointment: AppointmentView,
}

#[derive(Deserialize)]
struct BookingForm {
    service_product_id: Option<String>,
    employee_id: Option<String>,
    start_dt: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/appointment").route(web::get().to(appointment_form)))
        .service(web::resource("/appointment/submit").route(web::post().to(appointment_submit)))
        .service(web::resource("/appointment/json/slots").route(web::post().to(appointment_slots)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn index() -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, "/appointment"))
        .finish()
}

async fn appointment_form(state: web::Data<AppState>) -> Result<HttpResponse> {
    form_page(&state, None, BookingView::default(), None).await
}

async fn form_page(
    state: &AppState,
    selected: Option<(Option<i64>, Option<i64>)>,
    form: BookingView,
    error: Option<String>,
) -> Result<HttpResponse> {
    let actor = Actor::Public;
    let (service_id, employee_id) = selected.unwrap_or((None, None));
    let services = booking::list_services(state, &actor).await?;
    let staff = booking::list_bookable_staff(state, &actor).await?;

    let rejected = error.is_some();
    Ok(render_form(
        AppointmentFormTemplate {
            services: service_options(services, service_id),
            staff: staff_options(staff, employee_id),
            form,
            has_error: rejected,
            error: error.unwrap_or_default(),
        },
        rejected,
    ))
}

async fn appointment_submit(
    state: web::Data<AppState>,
    form: web::Form<BookingForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let service_id = parse_id(form.service_product_id.as_deref());
    let employee_id = parse_id(form.employee_id.as_deref());
    let view = BookingView {
        start_dt: form.start_dt.unwrap_or_default(),
        name: form.name.unwrap_or_default(),
        phone: form.phone.unwrap_or_default(),
        notes: form.notes.clone().unwrap_or_default(),
    };

    let (Some(service_product_id), Some(employee_id)) = (service_id, employee_id) else {
        let error = "Please choose a service and a stylist.".to_string();
        return form_page(&state, Some((service_id, employee_id)), view, Some(error)).await;
    };

    let request = BookingRequest {
        service_product_id,
        employee_id,
        start_dt: view.start_dt.clone(),
        name: view.name.clone(),
        phone: view.phone.clone(),
        notes: form.notes,
    };

    let error = match booking::submit_booking(&state, &Actor::Public, request).await {
        Ok(row) => {
            return Ok(render(AppointmentThanksTemplate {
                appointment: to_view(row),
            }))
        }
        Err(AppError::InvalidDateTime(_)) => "Invalid date format.".to_string(),
        Err(AppError::Validation(message)) => message,
        Err(AppError::NotFound(_)) => "The selected service or stylist is not available.".to_string(),
        Err(err) => return Err(err.into()),
    };

    log::info!("Website booking rejected: {error}");
    form_page(&state, Some((service_id, Some(employee_id))), view, Some(error)).await
}

/// Accepts the parameters as a bare JSON object or wrapped in a JSON-RPC
/// `call` envelope; the reply mirrors the request shape.
async fn appointment_slots(state: web::Data<AppState>, body: web::Json<Value>) -> HttpResponse {
    let body = body.into_inner();
    let rpc_id = body
        .get("params")
        .map(|_| body.get("id").cloned().unwrap_or(Value::Null));
    let params = match rpc_id {
        Some(_) => body.get("params").cloned().unwrap_or(Value::Null),
        None => body,
    };

    let payload = match query_slots(&state, &params).await {
        Ok(slots) => json!({ "slots": slots }),
        Err(err) => {
            log::warn!("Slot lookup failed: {err}");
            json!({ "error": err.to_string() })
        }
    };

    match rpc_id {
        Some(id) => HttpResponse::Ok().json(json!({ "jsonrpc": "2.0", "id": id, "result": payload })),
        None => HttpResponse::Ok().json(payload),
    }
}

async fn query_slots(state: &AppState, params: &Value) -> AppResult<Vec<Slot>> {
    let employee_id = id_param(params, "employee_id")?;
    let service_product_id = id_param(params, "service_product_id")?;
    let date_str = params
        .get("date_str")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::validation("date_str is required"))?;
    booking::available_slots(state, &Actor::Public, employee_id, service_product_id, date_str).await
}

fn id_param(params: &Value, key: &str) -> AppResult<i64> {
    let value = params.get(key);
    value
        .and_then(Value::as_i64)
        .or_else(|| value.and_then(Value::as_str).and_then(|raw| raw.trim().parse().ok()))
        .ok_or_else(|| AppError::validation(format!("{key} must be an integer id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::fixtures::salon;
    use actix_web::{test, App};

    async fn app_state() -> (AppState, crate::booking::fixtures::Salon) {
        let state = AppState::for_tests().await;
        let salon = salon(&state).await;
        (state, salon)
    }

    async fn appointment_count(state: &AppState) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appointments")
            .fetch_one(&state.db)
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn form_lists_services_and_salon_staff_only() {
        let (state, _) = app_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/appointment").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Haircut"));
        assert!(!html.contains("Shampoo"));
        assert!(html.contains("Marco"));
        assert!(!html.contains("Sam"));
    }

    #[actix_web::test]
    async fn submit_creates_requested_website_booking() {
        let (state, salon) = app_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/appointment/submit")
            .set_form([
                ("service_product_id", salon.haircut.to_string()),
                ("employee_id", salon.barber.to_string()),
                ("start_dt", "2026-01-05T10:00".to_string()),
                ("name", "Grace".to_string()),
                ("phone", "555-0199".to_string()),
                ("notes", "".to_string()),
            ])
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("00001"));
        assert_eq!(appointment_count(&state).await, 1);

        let (source, appointment_state) =
            sqlx::query_as::<_, (String, String)>("SELECT source, state FROM appointments")
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(source, "website");
        assert_eq!(appointment_state, "requested");
    }

    #[actix_web::test]
    async fn submit_with_bad_start_shows_error_and_books_nothing() {
        let (state, salon) = app_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/appointment/submit")
            .set_form([
                ("service_product_id", salon.haircut.to_string()),
                ("employee_id", salon.barber.to_string()),
                ("start_dt", "next tuesday".to_string()),
                ("name", "Grace".to_string()),
                ("phone", "555-0199".to_string()),
            ])
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Invalid date format."));
        assert_eq!(appointment_count(&state).await, 0);
    }

    #[actix_web::test]
    async fn slots_endpoint_answers_plain_json() {
        let (state, salon) = app_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/appointment/json/slots")
            .set_json(json!({
                "employee_id": salon.barber,
                "service_product_id": salon.haircut,
                "date_str": "2026-01-05"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let slots = body["slots"].as_array().unwrap();
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0]["time"], "09:00");
        assert_eq!(slots[0]["datetime"], "2026-01-05T09:00");
        assert_eq!(slots[0]["display"], "09:00 AM");
    }

    #[actix_web::test]
    async fn slots_endpoint_answers_json_rpc_envelopes() {
        let (state, salon) = app_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/appointment/json/slots")
            .set_json(json!({
                "jsonrpc": "2.0",
                "method": "call",
                "id": 7,
                "params": {
                    "employee_id": salon.barber.to_string(),
                    "service_product_id": salon.haircut,
                    "date_str": "2026-01-05"
                }
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["slots"].as_array().unwrap().len(), 16);
    }

    #[actix_web::test]
    async fn slots_endpoint_reports_errors_as_payload() {
        let (state, salon) = app_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        for params in [
            json!({ "employee_id": 404, "service_product_id": salon.haircut, "date_str": "2026-01-05" }),
            json!({ "employee_id": salon.barber, "service_product_id": salon.haircut, "date_str": "05.01.2026" }),
            json!({ "service_product_id": salon.haircut, "date_str": "2026-01-05" }),
        ] {
            let req = test::TestRequest::post()
                .uri("/appointment/json/slots")
                .set_json(params)
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert!(body["error"].is_string(), "{body}");
            assert!(body.get("slots").is_none());
        }
    }

    #[actix_web::test]
    async fn form_fails_loudly_when_the_catalog_is_unreadable() {
        let (state, _) = app_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        state.db.close().await;
        let req = test::TestRequest::get().uri("/appointment").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn slots_for_an_oversized_service_come_back_as_an_error() {
        let (state, salon) = app_state().await;
        let huge = sqlx::query(
            "INSERT INTO products (name, product_type, list_price, service_duration, active) VALUES ('Marathon', 'service', 10, 1e300, 1)",
        )
        .execute(&state.db)
        .await
        .unwrap()
        .last_insert_rowid();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/appointment/json/slots")
            .set_json(json!({
                "employee_id": salon.barber,
                "service_product_id": huge,
                "date_str": "2026-01-05"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["error"].is_string(), "{body}");
    }
}
