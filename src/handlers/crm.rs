// src/handlers/crm.rs

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, payload::AppQuery},
    models::crm::Customer,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct PhoneLookupQuery {
    /// Em qualquer formato: 62..., 8..., 08..., com ou sem separadores.
    pub phone: String,
}

// GET /api/customers/lookup?phone=
#[utoipa::path(
    get,
    path = "/api/customers/lookup",
    tag = "Customers",
    params(PhoneLookupQuery),
    responses(
        (status = 200, description = "Cliente dono do telefone normalizado", body = Customer),
        (status = 400, description = "Telefone inválido"),
        (status = 404, description = "Nenhum cliente com este telefone")
    ),
    security(("api_jwt" = []))
)]
pub async fn lookup_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    AppQuery(query): AppQuery<PhoneLookupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .crm_service
        .lookup_by_phone(&query.phone)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(customer))
}
