// src/handlers/orders.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        payload::{AppJson, AppPath},
        rbac::{CheckoutRoles, RequireRole, StatusRoles},
    },
    models::orders::{OrderDetail, OrderQuote, OrderStatus, PaymentMethod},
    services::{order_service::CreateOrderCommand, pricing::LineRequest},
};

// ---
// Validação Customizada
// ---
pub(crate) fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_min".into(), &0.0);
        err.message = Some("Nilai harus lebih dari nol.".into());
        return Err(err);
    }
    Ok(())
}

// URL do arquivo de arte; string vazia conta como "sem arquivo".
fn validate_design_url(val: &str) -> Result<(), ValidationError> {
    if val.is_empty() || val.validate_url() {
        return Ok(());
    }
    let mut err = ValidationError::new("url");
    err.message = Some("URL file desain tidak valid.".into());
    Err(err)
}

fn default_quantity() -> i32 {
    1
}

// ---
// Payloads
// ---
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: Uuid,
    pub variant_id: Uuid,

    #[validate(range(min = 1, max = 100000, message = "Jumlah minimal 1."))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,

    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = Option<f64>, example = 2.0)]
    pub width: Option<Decimal>,

    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = Option<f64>, example = 1.5)]
    pub height: Option<Decimal>,

    #[validate(length(max = 250))]
    pub notes: Option<String>,

    #[serde(default)]
    pub finishing: bool,
}

impl From<OrderItemPayload> for LineRequest {
    fn from(item: OrderItemPayload) -> Self {
        LineRequest {
            product_id: item.product_id,
            variant_id: item.variant_id,
            quantity: item.quantity,
            width: item.width,
            height: item.height,
            notes: item.notes.unwrap_or_default(),
            finishing: item.finishing,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub customer_id: Option<Uuid>,

    // Obrigatórios sem `customerId`; a regra fica no service.
    #[validate(length(min = 1, message = "Nama pelanggan wajib diisi."))]
    pub customer_name: Option<String>,

    #[validate(length(min = 6, message = "Nomor telepon terlalu pendek."))]
    pub customer_phone: Option<String>,

    pub payment_method: PaymentMethod,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub discount: i64,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub tax: i64,

    #[validate(length(max = 500))]
    pub notes: Option<String>,

    pub deadline: Option<DateTime<Utc>>,

    #[validate(custom(function = "validate_design_url"))]
    pub design_file_url: Option<String>,

    #[validate(length(min = 1, message = "Pesanan minimal berisi 1 item."), nested)]
    pub items: Vec<OrderItemPayload>,
}

impl CreateOrderPayload {
    fn into_command(self) -> CreateOrderCommand {
        CreateOrderCommand {
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            payment_method: self.payment_method,
            discount: self.discount,
            tax: self.tax,
            notes: self.notes.unwrap_or_default(),
            deadline: self.deadline,
            design_file_url: self.design_file_url,
            lines: self.items.into_iter().map(LineRequest::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOrderPayload {
    #[validate(range(min = 0))]
    #[serde(default)]
    pub discount: i64,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub tax: i64,

    #[validate(length(min = 1, message = "Pesanan minimal berisi 1 item."), nested)]
    pub items: Vec<OrderItemPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: OrderStatus,
    /// Forma de quitação, exigida ao entregar um pedido em piutang.
    pub payment_method: Option<PaymentMethod>,
}

// ---
// Handlers
// ---

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido registrado com baixa de estoque", body = OrderDetail),
        (status = 400, description = "Validação, catálogo ou estoque insuficiente"),
        (status = 503, description = "Conflito de transação; repetir a requisição")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<CheckoutRoles>,
    AppJson(payload): AppJson<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let order = app_state
        .order_service
        .create_order(user.0.id, payload.into_command())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// POST /api/orders/quote
#[utoipa::path(
    post,
    path = "/api/orders/quote",
    tag = "Orders",
    request_body = QuoteOrderPayload,
    responses(
        (status = 200, description = "Orçamento calculado, nada gravado", body = OrderQuote)
    ),
    security(("api_jwt" = []))
)]
pub async fn quote_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CheckoutRoles>,
    AppJson(payload): AppJson<QuoteOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let lines: Vec<LineRequest> = payload.items.into_iter().map(LineRequest::from).collect();

    let quote = app_state
        .order_service
        .quote(&lines, payload.discount, payload.tax)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(quote))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    responses(
        (status = 200, description = "Pedido com itens e cliente", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AppPath(order_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .get_order(order_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// PATCH /api/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/status",
    tag = "Orders",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status avançado", body = OrderDetail),
        (status = 400, description = "Transição inválida ou pedido não quitado"),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<StatusRoles>,
    AppPath(order_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .advance_status(order_id, payload.status, payload.payment_method)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_payload_applies_defaults_and_validates_items() {
        let payload: CreateOrderPayload = serde_json::from_value(json!({
            "customerName": "Budi",
            "customerPhone": "081234567890",
            "paymentMethod": "cash",
            "items": [{
                "productId": Uuid::new_v4(),
                "variantId": Uuid::new_v4(),
                "width": 2.0,
                "height": 1.5
            }]
        }))
        .unwrap();

        assert_eq!(payload.items[0].quantity, 1);
        assert_eq!(payload.discount, 0);
        assert!(payload.validate().is_ok());

        let command = payload.into_command();
        assert_eq!(command.lines.len(), 1);
        assert_eq!(command.notes, "");
    }

    #[test]
    fn non_positive_dimensions_and_empty_orders_are_rejected() {
        let bad_width: CreateOrderPayload = serde_json::from_value(json!({
            "customerName": "Budi",
            "customerPhone": "081234567890",
            "paymentMethod": "piutang",
            "items": [{
                "productId": Uuid::new_v4(),
                "variantId": Uuid::new_v4(),
                "width": 0,
                "height": 1
            }]
        }))
        .unwrap();
        assert!(bad_width.validate().is_err());

        let empty: CreateOrderPayload = serde_json::from_value(json!({
            "customerName": "Budi",
            "customerPhone": "081234567890",
            "paymentMethod": "cash",
            "discount": 0,
            "items": []
        }))
        .unwrap();
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
    }

    #[test]
    fn design_url_may_be_empty_but_not_garbage() {
        assert!(validate_design_url("").is_ok());
        assert!(validate_design_url("https://drive.example.com/a.pdf").is_ok());
        assert!(validate_design_url("not a url").is_err());
    }
}
