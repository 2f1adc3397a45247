//! Account registration. Session issuance lives outside this service; this
//! endpoint only creates the account with the password hashed at rest.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Role;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    req.validate().map_err(|e| ApiError::Validation(e.to_string()))?;

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Validation("User already exists".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&req.email)
        .bind(&password_hash)
        .bind(Role::User.as_str())
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = %id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "email": req.email, "role": "user" })),
    ))
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::Internal("Failed to hash password".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse battery").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse battery", &parsed)
            .is_ok());
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }

    #[test]
    fn register_request_validation() {
        let ok = RegisterRequest { email: "a@b.co".into(), password: "longenough".into() };
        assert!(ok.validate().is_ok());
        let bad_email = RegisterRequest { email: "nope".into(), password: "longenough".into() };
        assert!(bad_email.validate().is_err());
        let short = RegisterRequest { email: "a@b.co".into(), password: "short".into() };
        assert!(short.validate().is_err());
    }
}
