use actix_web::{http::StatusCode, HttpResponse};
use askama::Template;

pub fn render<T: Template>(template: T) -> HttpResponse {
    render_status(template, StatusCode::OK)
}

/// Form pages shown again because the submission was rejected answer 422.
pub fn render_form<T: Template>(template: T, rejected: bool) -> HttpResponse {
    let status = if rejected {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    render_status(template, status)
}

fn render_status<T: Template>(template: T, status: StatusCode) -> HttpResponse {
    match template.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Template render error: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
