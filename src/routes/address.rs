//! Address book routes: CRUD over the embedded sub-documents on the user
//! record. Sub-document ids are minted server-side on append.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::CurrentUser;
use crate::domain::value_objects::Pincode;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub pincode: String,
    pub house: String,
    pub area: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[validate(length(min = 1, message = "firstName is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "lastName is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "mobileNumber is required"))]
    pub mobile_number: String,
    #[validate(custom = "validate_pincode")]
    pub pincode: String,
    #[validate(length(min = 1, message = "house is required"))]
    pub house: String,
    #[validate(length(min = 1, message = "area is required"))]
    pub area: String,
    pub landmark: Option<String>,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
}

fn validate_pincode(value: &str) -> std::result::Result<(), ValidationError> {
    Pincode::new(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("pincode must be 6 digits"))
}

impl AddressPayload {
    fn checked(self) -> Result<Self> {
        self.validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        Ok(self)
    }

    fn into_address(self, id: Uuid) -> Address {
        Address {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            mobile_number: self.mobile_number,
            pincode: self.pincode,
            house: self.house,
            area: self.area,
            landmark: self.landmark,
            city: self.city,
            state: self.state,
        }
    }
}

async fn load_addresses(db: &PgPool, user_id: Uuid) -> Result<Vec<Address>> {
    let row: Option<(sqlx::types::Json<Vec<Address>>,)> =
        sqlx::query_as("SELECT addresses FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    row.map(|(addresses,)| addresses.0)
        .ok_or(ApiError::NotFound("User".into()))
}

async fn save_addresses(db: &PgPool, user_id: Uuid, addresses: &[Address]) -> Result<()> {
    sqlx::query("UPDATE users SET addresses = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(sqlx::types::Json(addresses))
        .execute(db)
        .await?;
    Ok(())
}

pub async fn list_addresses(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(load_addresses(&state.db, user.id).await?))
}

pub async fn create_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AddressPayload>,
) -> Result<(StatusCode, Json<Address>)> {
    let payload = payload.checked()?;
    let mut addresses = load_addresses(&state.db, user.id).await?;
    let address = payload.into_address(Uuid::new_v4());
    addresses.push(address.clone());
    save_addresses(&state.db, user.id, &addresses).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn update_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddressPayload>,
) -> Result<Json<Address>> {
    let payload = payload.checked()?;
    let mut addresses = load_addresses(&state.db, user.id).await?;
    let slot = addresses
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or(ApiError::NotFound("Address".into()))?;
    *slot = payload.into_address(id);
    let updated = slot.clone();
    save_addresses(&state.db, user.id, &addresses).await?;
    Ok(Json(updated))
}

pub async fn delete_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let mut addresses = load_addresses(&state.db, user.id).await?;
    let before = addresses.len();
    addresses.retain(|a| a.id != id);
    if addresses.len() == before {
        return Err(ApiError::NotFound("Address".into()));
    }
    save_addresses(&state.db, user.id, &addresses).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(pincode: &str) -> AddressPayload {
        AddressPayload {
            first_name: "Asha".into(),
            last_name: "Verma".into(),
            mobile_number: "9876543210".into(),
            pincode: pincode.into(),
            house: "12B".into(),
            area: "MG Road".into(),
            landmark: None,
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
        }
    }

    #[test]
    fn accepts_six_digit_pincode() {
        assert!(payload("560001").validate().is_ok());
    }

    #[test]
    fn rejects_short_pincode() {
        assert!(payload("1234").validate().is_err());
    }

    #[test]
    fn rejects_blank_required_fields() {
        let mut p = payload("560001");
        p.city = String::new();
        assert!(p.validate().is_err());
    }
}
