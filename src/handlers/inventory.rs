// src/handlers/inventory.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::inventory_repo::NewMaterial,
    handlers::orders::validate_positive,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        payload::{AppJson, AppPath},
        rbac::{RequireRole, StockRoles},
    },
    models::inventory::{LedgerCheck, MaterialView, StockDirection, StockMovement},
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("Nilai tidak boleh negatif.".into());
        return Err(err);
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialPayload {
    #[validate(length(min = 1, message = "Nama bahan wajib diisi."))]
    pub name: String,

    #[validate(length(min = 1, message = "Satuan wajib diisi."))]
    pub unit: String,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub cost_price: i64,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub selling_price: i64,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(value_type = f64, example = 500.0)]
    pub current_stock: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(value_type = f64, example = 200.0)]
    pub min_stock: Decimal,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl From<CreateMaterialPayload> for NewMaterial {
    fn from(payload: CreateMaterialPayload) -> Self {
        NewMaterial {
            name: payload.name.trim().to_string(),
            unit: payload.unit.trim().to_string(),
            cost_price: payload.cost_price,
            selling_price: payload.selling_price,
            current_stock: payload.current_stock,
            min_stock: payload.min_stock,
            is_active: payload.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockPayload {
    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64, example = 100.0)]
    pub quantity: Decimal,

    #[validate(length(max = 250))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    pub direction: StockDirection,

    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64, example = 2.5)]
    pub quantity: Decimal,

    #[validate(length(max = 250))]
    pub notes: Option<String>,
}

// ---
// Handlers
// ---

// POST /api/materials
#[utoipa::path(
    post,
    path = "/api/materials",
    tag = "Materials",
    request_body = CreateMaterialPayload,
    responses(
        (status = 201, description = "Material cadastrado", body = MaterialView),
        (status = 409, description = "Nome já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<StockRoles>,
    AppJson(payload): AppJson<CreateMaterialPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let material = app_state
        .inventory_service
        .create_material(user.0.id, &payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(MaterialView::from(material))))
}

// POST /api/materials/{id}/restock
#[utoipa::path(
    post,
    path = "/api/materials/{material_id}/restock",
    tag = "Materials",
    request_body = RestockPayload,
    responses(
        (status = 200, description = "Estoque reposto", body = MaterialView),
        (status = 404, description = "Material não encontrado")
    ),
    params(
        ("material_id" = Uuid, Path, description = "ID do Material")
    ),
    security(("api_jwt" = []))
)]
pub async fn restock_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<StockRoles>,
    AppPath(material_id): AppPath<Uuid>,
    AppJson(payload): AppJson<RestockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let material = app_state
        .inventory_service
        .restock(
            material_id,
            user.0.id,
            payload.quantity,
            payload.notes.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(MaterialView::from(material)))
}

// POST /api/materials/{id}/adjust
#[utoipa::path(
    post,
    path = "/api/materials/{material_id}/adjust",
    tag = "Materials",
    request_body = AdjustStockPayload,
    responses(
        (status = 200, description = "Ajuste aplicado", body = MaterialView),
        (status = 400, description = "Saldo ficaria negativo"),
        (status = 404, description = "Material não encontrado")
    ),
    params(
        ("material_id" = Uuid, Path, description = "ID do Material")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<StockRoles>,
    AppPath(material_id): AppPath<Uuid>,
    AppJson(payload): AppJson<AdjustStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let material = app_state
        .inventory_service
        .adjust(
            material_id,
            user.0.id,
            payload.direction,
            payload.quantity,
            payload.notes.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(MaterialView::from(material)))
}

// GET /api/materials/{id}/movements
#[utoipa::path(
    get,
    path = "/api/materials/{material_id}/movements",
    tag = "Materials",
    responses(
        (status = 200, description = "Livro-razão do material, do mais antigo ao mais novo", body = Vec<StockMovement>),
        (status = 404, description = "Material não encontrado")
    ),
    params(
        ("material_id" = Uuid, Path, description = "ID do Material")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    AppPath(material_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .list_movements(material_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(movements))
}

// GET /api/materials/{id}/ledger-check
#[utoipa::path(
    get,
    path = "/api/materials/{material_id}/ledger-check",
    tag = "Materials",
    responses(
        (status = 200, description = "Saldo em cache x soma do livro-razão", body = LedgerCheck),
        (status = 404, description = "Material não encontrado")
    ),
    params(
        ("material_id" = Uuid, Path, description = "ID do Material")
    ),
    security(("api_jwt" = []))
)]
pub async fn ledger_check(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<StockRoles>,
    AppPath(material_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let check = app_state
        .inventory_service
        .ledger_check(material_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !check.consistent {
        tracing::warn!(
            %material_id,
            current_stock = %check.current_stock,
            ledger_balance = %check.ledger_balance,
            "Saldo do material diverge do livro-razão"
        );
    }

    Ok(Json(check))
}
