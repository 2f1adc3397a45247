//! Request-scoped authenticated identity.
//!
//! Session issuance lives outside this service. Requests carry an
//! `Authorization: Bearer` token signed HS256 with the shared auth secret;
//! the extractor validates it and hands handlers the caller's identity
//! explicitly instead of relying on ambient state.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Token claims, as issued by the session layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthenticated)?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.auth_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| ApiError::Unauthenticated)?;

        Ok(Self {
            id: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn claims_round_trip() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "user@example.com".into(),
            role: Role::Admin,
            exp: 4_102_444_800, // 2100-01-01
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret"))
            .unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, claims.sub);
        assert_eq!(decoded.claims.role, Role::Admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "user@example.com".into(),
            role: Role::User,
            exp: 4_102_444_800,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"right"))
            .unwrap();
        assert!(decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"wrong"),
            &Validation::new(Algorithm::HS256),
        )
        .is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
    }
}
