use actix_web::{dev::ServiceRequest, web, Error, HttpMessage};
use actix_web_httpauth::{
    extractors::{
        basic::{self, BasicAuth},
        AuthenticationError,
    },
    headers::www_authenticate::basic::Basic,
};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use sqlx::SqlitePool;

use crate::{
    errors::{AppError, AppResult},
    models::{UserRow, ROLE_ADMIN, ROLE_STYLIST},
    state::AppState,
};

pub const AUTH_REALM: &str = "Salon Back Office";

/// Challenge config for the Basic extractor, so a missing header is answered
/// with the back-office realm.
pub fn basic_config() -> basic::Config {
    basic::Config::default().realm(AUTH_REALM)
}

fn challenge() -> Error {
    AuthenticationError::new(Basic::with_realm(AUTH_REALM)).into()
}

/// An authenticated back-office user.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub display_name: String,
    pub role: String,
    pub employee_id: Option<i64>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Who is performing an operation. Public visitors may only query
/// availability and file booking requests.
#[derive(Clone, Debug)]
pub enum Actor {
    Public,
    User(AuthUser),
}

impl Actor {
    pub fn author_id(&self) -> Option<i64> {
        match self {
            Actor::Public => None,
            Actor::User(user) => Some(user.id),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Actor::Public => "website visitor".to_string(),
            Actor::User(user) => user.display_name.clone(),
        }
    }

    pub(crate) fn back_office(&self) -> AppResult<&AuthUser> {
        match self {
            Actor::User(user) => Ok(user),
            Actor::Public => Err(AppError::Forbidden("back-office login required".to_string())),
        }
    }

    pub(crate) fn admin(&self) -> AppResult<&AuthUser> {
        let user = self.back_office()?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(user)
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::PasswordHash)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn authenticate_credentials(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Option<AuthUser> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, username, display_name, role, password_hash, employee_id, active, created_at
           FROM users
           WHERE username = ? AND active = 1
           LIMIT 1"#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(|err| log::error!("User lookup failed: {err}"))
    .ok()??;

    if !verify_password(password, &user.password_hash) {
        log::warn!("Rejected login for '{username}'");
        return None;
    }

    Some(AuthUser {
        id: user.id,
        display_name: user.display_name,
        role: user.role,
        employee_id: user.employee_id,
    })
}

async fn authenticate(req: &ServiceRequest, credentials: &BasicAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(challenge)?;
    let password = credentials.password().unwrap_or_default();
    authenticate_credentials(&state.db, credentials.user_id(), password)
        .await
        .ok_or_else(challenge)
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            if user.role != ROLE_ADMIN {
                log::warn!("{} tried the admin area", user.display_name);
                return Err((challenge(), req));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub async fn stylist_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            if user.role != ROLE_STYLIST || user.employee_id.is_none() {
                log::warn!("{} tried the stylist agenda", user.display_name);
                return Err((challenge(), req));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

/// Back-office accounts. Stylist accounts are tied to the employee whose
/// agenda they work.
pub async fn create_user(
    pool: &SqlitePool,
    actor: &Actor,
    username: &str,
    display_name: &str,
    password: &str,
    employee_id: Option<i64>,
) -> AppResult<i64> {
    actor.admin()?;
    let mut errors = Vec::new();
    if username.trim().is_empty() {
        errors.push("Username is required.");
    }
    if display_name.trim().is_empty() {
        errors.push("Display name is required.");
    }
    if password.trim().len() < 6 {
        errors.push("Password must be at least 6 characters.");
    }
    if !errors.is_empty() {
        return Err(AppError::validation(errors.join(" ")));
    }

    let role = if employee_id.is_some() { ROLE_STYLIST } else { ROLE_ADMIN };
    let password_hash = hash_password(password)?;
    let id = sqlx::query(
        r#"INSERT INTO users (username, display_name, role, password_hash, employee_id, active, created_at)
           VALUES (?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(username.trim())
    .bind(display_name.trim())
    .bind(role)
    .bind(password_hash)
    .bind(employee_id)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?
    .last_insert_rowid();

    log::info!("{} created {role} account '{}'", actor.describe(), username.trim());
    Ok(id)
}

pub async fn list_users(pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<UserRow>> {
    actor.admin()?;
    let rows = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, username, display_name, role, password_hash, employee_id, active, created_at
           FROM users
           ORDER BY display_name"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::fixtures::{admin, salon};

    #[actix_web::test]
    async fn stylist_accounts_need_an_admin_and_a_real_password() {
        let state = AppState::for_tests().await;
        let barber = salon(&state).await.barber;
        let err = create_user(&state.db, &Actor::Public, "marco", "Marco", "longpass", Some(barber))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = create_user(&state.db, &admin(), "marco", "Marco", "123", Some(barber))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        create_user(&state.db, &admin(), "marco", "Marco", "longpass", Some(barber))
            .await
            .unwrap();
        let user = authenticate_credentials(&state.db, "marco", "longpass").await.unwrap();
        assert_eq!(user.role, ROLE_STYLIST);
        assert_eq!(user.employee_id, Some(barber));
        assert_eq!(list_users(&state.db, &admin()).await.unwrap().len(), 2);
    }

    #[test]
    fn hashes_verify_only_their_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }

    #[actix_web::test]
    async fn seeded_admin_can_authenticate() {
        let state = AppState::for_tests().await;
        let user = authenticate_credentials(&state.db, "admin", "admin").await.unwrap();
        assert!(user.is_admin());
        assert!(authenticate_credentials(&state.db, "admin", "nope").await.is_none());
        assert!(authenticate_credentials(&state.db, "ghost", "admin").await.is_none());
    }
}
