use actix_web::{http::header, web, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use askama::Template;
use serde::Deserialize;

use crate::{
    auth::{self, admin_validator, basic_config, Actor, AuthUser},
    booking::{self, AppointmentUpdate, NewAppointment},
    db,
    errors::AppError,
    models::{AppointmentRow, AppointmentState, Source, WorkflowAction, PRODUCT_TYPE_SERVICE},
    routes::{
        form_error, parse_id, parse_minutes, service_options, staff_options, to_view,
        AppointmentView, ServiceOption, StaffOption,
    },
    state::AppState,
    templates::{render, render_form},
};

#[derive(Clone, Debug)]
struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Clone, Debug)]
struct ActionButton {
    slug: String,
    label: String,
}

#[derive(Clone, Debug)]
struct TrackingView {
    field: String,
    old_value: String,
    new_value: String,
    author: String,
    created_at: String,
}

#[derive(Clone, Debug)]
struct ProductView {
    name: String,
    product_type: String,
    price: String,
    duration: String,
}

#[derive(Clone, Debug)]
struct JobView {
    id: i64,
    name: String,
    is_salon_role: bool,
}

#[derive(Clone, Debug)]
struct EmployeeView {
    id: i64,
    name: String,
    job: String,
    bookable: bool,
}

#[derive(Clone, Debug)]
struct UserView {
    username: String,
    display_name: String,
    role: String,
    active: bool,
}

#[derive(Template)]
#[template(path = "admin_appointments.html")]
struct AdminAppointmentsTemplate {
    appointments: Vec<AppointmentView>,
    states: Vec<SelectOption>,
    is_admin: bool,
}

#[derive(Template)]
#[template(path = "admin_appointment_detail.html")]
struct AdminAppointmentDetailTemplate {
    appointment: AppointmentView,
    actions: Vec<ActionButton>,
    services: Vec<ServiceOption>,
    staff: Vec<StaffOption>,
    history: Vec<TrackingView>,
    error: String,
    has_error: bool,
    is_admin: bool,
}

#[derive(Clone, Debug, Default)]
struct NewAppointmentView {
    name: String,
    phone: String,
    start_dt: String,
    duration_min: String,
    buffer_before_min: String,
    buffer_after_min: String,
    notes: String,
    confirm: bool,
}

#[derive(Template)]
#[template(path = "admin_appointment_new.html")]
struct AdminAppointmentNewTemplate {
    services: Vec<ServiceOption>,
    staff: Vec<StaffOption>,
    sources: Vec<SelectOption>,
    form: NewAppointmentView,
    error: String,
    has_error: bool,
    is_admin: bool,
}

#[derive(Template)]
#[template(path = "admin_services.html")]
struct AdminServicesTemplate {
    products: Vec<ProductView>,
    errors: Vec<String>,
    success: String,
    has_success: bool,
    is_admin: bool,
}

#[derive(Template)]
#[template(path = "admin_staff.html")]
struct AdminStaffTemplate {
    jobs: Vec<JobView>,
    employees: Vec<EmployeeView>,
    users: Vec<UserView>,
    errors: Vec<String>,
    success: String,
    has_success: bool,
    is_admin: bool,
}

#[derive(Deserialize)]
struct AppointmentFilter {
    state: Option<String>,
}

#[derive(Deserialize)]
struct AppointmentCreateForm {
    name: Option<String>,
    phone: Option<String>,
    service_product_id: Option<String>,
    employee_id: Option<String>,
    start_dt: Option<String>,
    source: Option<String>,
    confirm: Option<String>,
    duration_min: Option<String>,
    buffer_before_min: Option<String>,
    buffer_after_min: Option<String>,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct AppointmentEditForm {
    service_product_id: Option<String>,
    employee_id: Option<String>,
    start_dt: Option<String>,
    duration_min: Option<String>,
    buffer_before_min: Option<String>,
    buffer_after_min: Option<String>,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct ProductCreateForm {
    name: String,
    product_type: Option<String>,
    list_price: String,
    service_duration: String,
}

#[derive(Deserialize)]
struct JobCreateForm {
    name: String,
    is_salon_role: Option<String>,
}

#[derive(Deserialize)]
struct EmployeeCreateForm {
    name: String,
    job_id: Option<String>,
}

#[derive(Deserialize)]
struct UserCreateForm {
    username: String,
    display_name: String,
    password: String,
    employee_id: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(basic_config()).service(
        web::scope("/admin")
            .wrap(HttpAuthentication::basic(admin_validator))
            .service(web::resource("").route(web::get().to(index)))
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/appointments").route(web::get().to(list_appointments)))
            .service(
                web::resource("/appointments/new")
                    .route(web::get().to(new_appointment))
                    .route(web::post().to(create_appointment)),
            )
            .service(
                web::resource("/appointments/{id}")
                    .route(web::get().to(appointment_detail))
                    .route(web::post().to(update_appointment)),
            )
            .service(web::resource("/appointments/{id}/{action}").route(web::post().to(run_action)))
            .service(
                web::resource("/services")
                    .route(web::get().to(list_products))
                    .route(web::post().to(create_product)),
            )
            .service(web::resource("/staff").route(web::get().to(show_staff)))
            .service(web::resource("/staff/jobs").route(web::post().to(create_job)))
            .service(web::resource("/staff/employees").route(web::post().to(create_employee)))
            .service(web::resource("/staff/users").route(web::post().to(create_user))),
    );
}

async fn index() -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, "/admin/appointments"))
        .finish()
}

fn actor(auth: web::ReqData<AuthUser>) -> Actor {
    Actor::User(auth.into_inner())
}

async fn list_appointments(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    query: web::Query<AppointmentFilter>,
) -> Result<HttpResponse> {
    let actor = actor(auth);
    let filter = query
        .state
        .as_deref()
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<AppointmentState>().ok());
    let rows = booking::list_appointments(&state, &actor, filter).await?;

    let states = AppointmentState::ALL
        .into_iter()
        .map(|option| SelectOption {
            value: option.as_str().to_string(),
            label: option.label().to_string(),
            selected: filter == Some(option),
        })
        .collect();

    Ok(render(AdminAppointmentsTemplate {
        appointments: rows.into_iter().map(to_view).collect(),
        states,
        is_admin: true,
    }))
}

async fn detail_page(
    state: &AppState,
    actor: &Actor,
    appointment_id: i64,
    error: Option<String>,
) -> Result<HttpResponse> {
    let row = booking::get_appointment(state, actor, appointment_id).await?;
    let services = booking::list_services(state, actor).await?;
    let staff = booking::list_bookable_staff(state, actor).await?;
    let history = db::fetch_tracking(&state.db, appointment_id)
        .await?
        .into_iter()
        .map(|entry| TrackingView {
            field: entry.field,
            old_value: entry.old_value.unwrap_or_default(),
            new_value: entry.new_value.unwrap_or_default(),
            author: entry.author_name.unwrap_or_else(|| "Website".to_string()),
            created_at: entry.created_at,
        })
        .collect();
    let actions = WorkflowAction::ALL
        .into_iter()
        .map(|action| ActionButton {
            slug: action.slug().to_string(),
            label: action.label().to_string(),
        })
        .collect();

    let rejected = error.is_some();
    Ok(render_form(
        AdminAppointmentDetailTemplate {
            services: service_options(services, Some(row.service_product_id)),
            staff: staff_options(staff, Some(row.employee_id)),
            appointment: to_view(row),
            actions,
            history,
            has_error: rejected,
            error: error.unwrap_or_default(),
            is_admin: true,
        },
        rejected,
    ))
}

async fn appointment_detail(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    detail_page(&state, &actor(auth), path.into_inner(), None).await
}

async fn update_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<i64>,
    form: web::Form<AppointmentEditForm>,
) -> Result<HttpResponse> {
    let actor = actor(auth);
    let appointment_id = path.into_inner();
    let form = form.into_inner();

    let result = apply_edit(&state, &actor, appointment_id, form).await;

    match result {
        Ok(_) => Ok(redirect_to_detail(appointment_id)),
        Err(err) => detail_page(&state, &actor, appointment_id, Some(form_error(err)?)).await,
    }
}

async fn apply_edit(
    state: &AppState,
    actor: &Actor,
    appointment_id: i64,
    form: AppointmentEditForm,
) -> Result<AppointmentRow, AppError> {
    let start_dt = match form.start_dt.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Some(booking::parse_start(value)?),
        _ => None,
    };
    let update = AppointmentUpdate {
        service_product_id: parse_id(form.service_product_id.as_deref()),
        employee_id: parse_id(form.employee_id.as_deref()),
        start_dt,
        duration_min: parse_minutes(form.duration_min.as_deref(), "Duration")?,
        buffer_before_min: parse_minutes(form.buffer_before_min.as_deref(), "Buffer before")?,
        buffer_after_min: parse_minutes(form.buffer_after_min.as_deref(), "Buffer after")?,
        notes: form.notes,
    };
    booking::update_appointment(state, actor, appointment_id, update).await
}

async fn run_action(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse> {
    let actor = actor(auth);
    let (appointment_id, slug) = path.into_inner();
    let Ok(action) = slug.parse::<WorkflowAction>() else {
        return Ok(HttpResponse::NotFound().body("Unknown action"));
    };

    match booking::apply_action(&state, &actor, appointment_id, action).await {
        Ok(_) => Ok(redirect_to_detail(appointment_id)),
        Err(err) => detail_page(&state, &actor, appointment_id, Some(form_error(err)?)).await,
    }
}

fn redirect_to_detail(appointment_id: i64) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, format!("/admin/appointments/{appointment_id}")))
        .finish()
}

fn source_options(selected: Source) -> Vec<SelectOption> {
    Source::ALL
        .into_iter()
        .map(|source| SelectOption {
            value: source.as_str().to_string(),
            label: source.label().to_string(),
            selected: source == selected,
        })
        .collect()
}

async fn new_appointment_page(
    state: &AppState,
    actor: &Actor,
    selected: (Option<i64>, Option<i64>, Source),
    form: NewAppointmentView,
    error: Option<String>,
) -> Result<HttpResponse> {
    let (service_id, employee_id, source) = selected;
    let services = booking::list_services(state, actor).await?;
    let staff = booking::list_bookable_staff(state, actor).await?;
    let rejected = error.is_some();
    Ok(render_form(
        AdminAppointmentNewTemplate {
            services: service_options(services, service_id),
            staff: staff_options(staff, employee_id),
            sources: source_options(source),
            form,
            has_error: rejected,
            error: error.unwrap_or_default(),
            is_admin: true,
        },
        rejected,
    ))
}

async fn new_appointment(state: web::Data<AppState>, auth: web::ReqData<AuthUser>) -> Result<HttpResponse> {
    let actor = actor(auth);
    let form = NewAppointmentView {
        buffer_before_min: state.config.default_buffer_before_min.to_string(),
        buffer_after_min: state.config.default_buffer_after_min.to_string(),
        ..Default::default()
    };
    new_appointment_page(&state, &actor, (None, None, Source::default()), form, None).await
}

async fn create_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Form<AppointmentCreateForm>,
) -> Result<HttpResponse> {
    let actor = actor(auth);
    let form = form.into_inner();
    let service_id = parse_id(form.service_product_id.as_deref());
    let employee_id = parse_id(form.employee_id.as_deref());
    let source = form
        .source
        .as_deref()
        .and_then(|value| value.parse::<Source>().ok())
        .unwrap_or_default();
    let confirm = form.confirm.is_some();
    let view = NewAppointmentView {
        name: form.name.unwrap_or_default(),
        phone: form.phone.unwrap_or_default(),
        start_dt: form.start_dt.unwrap_or_default(),
        duration_min: form.duration_min.unwrap_or_default(),
        buffer_before_min: form.buffer_before_min.unwrap_or_default(),
        buffer_after_min: form.buffer_after_min.unwrap_or_default(),
        notes: form.notes.unwrap_or_default(),
        confirm,
    };

    let result = book_from_form(&state, &actor, (service_id, employee_id, source), &view).await;

    match result {
        Ok(row) => Ok(redirect_to_detail(row.id)),
        Err(err) => {
            let message = form_error(err)?;
            new_appointment_page(&state, &actor, (service_id, employee_id, source), view, Some(message)).await
        }
    }
}

async fn book_from_form(
    state: &AppState,
    actor: &Actor,
    selected: (Option<i64>, Option<i64>, Source),
    view: &NewAppointmentView,
) -> Result<AppointmentRow, AppError> {
    let (Some(service_product_id), Some(employee_id), source) = selected else {
        return Err(AppError::validation("Pick a service and a stylist."));
    };
    let notes = Some(view.notes.clone()).filter(|notes| !notes.trim().is_empty());
    let new = NewAppointment {
        partner_id: 0,
        service_product_id,
        employee_id,
        start_dt: booking::parse_start(&view.start_dt)?,
        duration_min: parse_minutes(Some(&view.duration_min), "Duration")?,
        buffer_before_min: parse_minutes(Some(&view.buffer_before_min), "Buffer before")?,
        buffer_after_min: parse_minutes(Some(&view.buffer_after_min), "Buffer after")?,
        source,
        state: if view.confirm {
            AppointmentState::Confirmed
        } else {
            AppointmentState::Requested
        },
        notes,
    };
    booking::create_for_customer(state, actor, &view.name, &view.phone, new).await
}

async fn products_page(
    state: &AppState,
    actor: &Actor,
    errors: Vec<String>,
    success: Option<&str>,
) -> Result<HttpResponse> {
    let products = booking::list_products(state, actor)
        .await?
        .into_iter()
        .map(|row| ProductView {
            duration: if row.is_service() {
                format!("{} min", crate::slots::service_minutes(row.service_duration))
            } else {
                "-".to_string()
            },
            price: format!("{:.2}", row.list_price),
            product_type: row.product_type,
            name: row.name,
        })
        .collect();
    let rejected = !errors.is_empty();
    Ok(render_form(
        AdminServicesTemplate {
            products,
            errors,
            has_success: success.is_some(),
            success: success.unwrap_or_default().to_string(),
            is_admin: true,
        },
        rejected,
    ))
}

async fn list_products(state: web::Data<AppState>, auth: web::ReqData<AuthUser>) -> Result<HttpResponse> {
    products_page(&state, &actor(auth), Vec::new(), None).await
}

async fn create_product(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Form<ProductCreateForm>,
) -> Result<HttpResponse> {
    let actor = actor(auth);
    let form = form.into_inner();
    let mut errors = Vec::new();
    let list_price = form.list_price.trim().parse::<f64>().unwrap_or_else(|_| {
        errors.push("Price must be a number.".to_string());
        0.0
    });
    let hours = form.service_duration.trim().parse::<f64>().unwrap_or_else(|_| {
        errors.push("Duration must be a number of hours.".to_string());
        0.0
    });
    if !errors.is_empty() {
        return products_page(&state, &actor, errors, None).await;
    }

    let product_type = form
        .product_type
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(PRODUCT_TYPE_SERVICE);
    match booking::create_product(&state, &actor, &form.name, product_type, list_price, hours).await {
        Ok(_) => products_page(&state, &actor, Vec::new(), Some("Product created.")).await,
        Err(err) => products_page(&state, &actor, vec![form_error(err)?], None).await,
    }
}

async fn staff_page(
    state: &AppState,
    actor: &Actor,
    errors: Vec<String>,
    success: Option<&str>,
) -> Result<HttpResponse> {
    let jobs = booking::list_jobs(state, actor)
        .await?
        .into_iter()
        .map(|job| JobView {
            id: job.id,
            name: job.name,
            is_salon_role: job.is_salon_role,
        })
        .collect();
    let employees = booking::list_employees(state, actor)
        .await?
        .into_iter()
        .map(|employee| EmployeeView {
            id: employee.id,
            name: employee.name,
            job: employee.job_name.unwrap_or_else(|| "-".to_string()),
            bookable: employee.is_salon_role,
        })
        .collect();
    let users = auth::list_users(&state.db, actor)
        .await?
        .into_iter()
        .map(|user| UserView {
            username: user.username,
            display_name: user.display_name,
            role: user.role,
            active: user.active == 1,
        })
        .collect();

    let rejected = !errors.is_empty();
    Ok(render_form(
        AdminStaffTemplate {
            jobs,
            employees,
            users,
            errors,
            has_success: success.is_some(),
            success: success.unwrap_or_default().to_string(),
            is_admin: true,
        },
        rejected,
    ))
}

async fn show_staff(state: web::Data<AppState>, auth: web::ReqData<AuthUser>) -> Result<HttpResponse> {
    staff_page(&state, &actor(auth), Vec::new(), None).await
}

async fn staff_page_handler(
    state: &AppState,
    actor: &Actor,
    result: Result<i64, AppError>,
    success: &str,
) -> Result<HttpResponse> {
    match result {
        Ok(_) => staff_page(state, actor, Vec::new(), Some(success)).await,
        Err(err) => staff_page(state, actor, vec![form_error(err)?], None).await,
    }
}

async fn create_job(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Form<JobCreateForm>,
) -> Result<HttpResponse> {
    let actor = actor(auth);
    let form = form.into_inner();
    let result = booking::create_job(&state, &actor, &form.name, form.is_salon_role.is_some()).await;
    staff_page_handler(&state, &actor, result, "Job title created.").await
}

async fn create_employee(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Form<EmployeeCreateForm>,
) -> Result<HttpResponse> {
    let actor = actor(auth);
    let form = form.into_inner();
    let job_id = parse_id(form.job_id.as_deref());
    let result = booking::create_employee(&state, &actor, &form.name, job_id).await;
    staff_page_handler(&state, &actor, result, "Employee created.").await
}

async fn create_user(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Form<UserCreateForm>,
) -> Result<HttpResponse> {
    let actor = actor(auth);
    let form = form.into_inner();
    let employee_id = parse_id(form.employee_id.as_deref());
    let result = auth::create_user(
        &state.db,
        &actor,
        &form.username,
        &form.display_name,
        &form.password,
        employee_id,
    )
    .await;
    staff_page_handler(&state, &actor, result, "Account created.").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::fixtures::{admin, at, booking, salon};
    use actix_web::{
        http::{
            header::{AUTHORIZATION, WWW_AUTHENTICATE},
            StatusCode,
        },
        test, App,
    };

    // admin:admin
    const ADMIN_BASIC: &str = "Basic YWRtaW46YWRtaW4=";

    #[actix_web::test]
    async fn back_office_requires_credentials() {
        let state = AppState::for_tests().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/admin/appointments").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let challenge = res.headers().get(WWW_AUTHENTICATE).unwrap().to_str().unwrap();
        assert!(challenge.contains(auth::AUTH_REALM), "{challenge}");

        // admin:wrong
        let req = test::TestRequest::get()
            .uri("/admin/appointments")
            .insert_header((AUTHORIZATION, "Basic YWRtaW46d3Jvbmc="))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let challenge = res.headers().get(WWW_AUTHENTICATE).unwrap().to_str().unwrap();
        assert!(challenge.contains(auth::AUTH_REALM), "{challenge}");

        let req = test::TestRequest::get()
            .uri("/admin/appointments")
            .insert_header((AUTHORIZATION, ADMIN_BASIC))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn confirm_button_reports_overlap_on_the_record() {
        let state = AppState::for_tests().await;
        let salon = salon(&state).await;
        booking::create_appointment(&state, &admin(), booking(&salon, at(5, 10, 0), AppointmentState::Confirmed))
            .await
            .unwrap();
        let held = booking::create_appointment(&state, &admin(), booking(&salon, at(5, 10, 0), AppointmentState::Requested))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri(&format!("/admin/appointments/{}/confirm", held.id))
            .insert_header((AUTHORIZATION, ADMIN_BASIC))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("overlapping this time"));

        let req = test::TestRequest::post()
            .uri(&format!("/admin/appointments/{}/cancel", held.id))
            .insert_header((AUTHORIZATION, ADMIN_BASIC))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[actix_web::test]
    async fn staff_can_book_a_phone_customer() {
        let state = AppState::for_tests().await;
        let salon = salon(&state).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let haircut = salon.haircut.to_string();
        let barber = salon.barber.to_string();
        let req = test::TestRequest::post()
            .uri("/admin/appointments/new")
            .insert_header((AUTHORIZATION, ADMIN_BASIC))
            .set_form([
                ("name", "Ada"),
                ("phone", "555-0100"),
                ("service_product_id", haircut.as_str()),
                ("employee_id", barber.as_str()),
                ("start_dt", "2026-01-05T15:00"),
                ("source", "call"),
                ("confirm", "on"),
                ("duration_min", ""),
                ("buffer_before_min", "0"),
                ("buffer_after_min", "10"),
            ])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let row = booking::list_appointments(&state, &admin(), Some(AppointmentState::Confirmed))
            .await
            .unwrap()
            .pop()
            .unwrap();
        assert_eq!(row.partner_id, salon.customer);
        assert_eq!(row.source, "call");
        assert_eq!(row.end_dt, at(5, 15, 40));
    }

    #[actix_web::test]
    async fn unknown_action_is_not_found() {
        let state = AppState::for_tests().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/admin/appointments/1/reopen")
            .insert_header((AUTHORIZATION, ADMIN_BASIC))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
