// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{catalog::PricingUnit, crm::Customer, inventory::MaterialRequirement};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Qris,
    /// Piutang: pedido fiado, ainda não pago.
    Piutang,
}

impl PaymentMethod {
    pub fn is_receivable(self) -> bool {
        self == PaymentMethod::Piutang
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    MenungguDesain,
    ProsesCetak,
    Finishing,
    Selesai,
    SudahDiambil,
}

impl OrderStatus {
    /// A esteira de produção, na única ordem permitida.
    pub const FLOW: [OrderStatus; 5] = [
        OrderStatus::MenungguDesain,
        OrderStatus::ProsesCetak,
        OrderStatus::Finishing,
        OrderStatus::Selesai,
        OrderStatus::SudahDiambil,
    ];

    pub fn index(self) -> usize {
        match self {
            OrderStatus::MenungguDesain => 0,
            OrderStatus::ProsesCetak => 1,
            OrderStatus::Finishing => 2,
            OrderStatus::Selesai => 3,
            OrderStatus::SudahDiambil => 4,
        }
    }

    pub fn next(self) -> Option<OrderStatus> {
        Self::FLOW.get(self.index() + 1).copied()
    }

    pub fn is_picked_up(self) -> bool {
        self == OrderStatus::SudahDiambil
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(example = "ORD-20250101-001")]
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
    pub notes: String,
    pub deadline: Option<DateTime<Utc>>,
    pub design_file_url: Option<String>,
    pub status: OrderStatus,
    pub estimated_minutes: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

// Nome, variante e unidade ficam congelados no momento da venda.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub pricing_unit: PricingUnit,
    pub unit_price: i64,
    pub quantity: i32,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub notes: String,
    pub finishing: bool,
    pub finishing_cost: i64,
    pub subtotal: i64,
    pub estimated_minutes: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// O pedido composto devolvido ao cliente: cabeçalho + cliente + itens.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: Order,
    pub customer: Option<Customer>,
    pub items: Vec<OrderItem>,
}

// --- Orçamento (nada é gravado) ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub pricing_unit: PricingUnit,
    pub unit_price: i64,
    pub quantity: i32,
    pub finishing_cost: i64,
    pub subtotal: i64,
    pub estimated_minutes: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuote {
    pub lines: Vec<QuoteLine>,
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
    pub estimated_minutes: i32,
    pub materials: Vec<MaterialRequirement>,
    /// Falso quando algum material não cobre o consumo.
    pub fulfillable: bool,
}
