// src/models/inventory.rs

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Material (o cache do saldo vive em current_stock) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    #[schema(example = "ml")]
    pub unit: String,
    pub cost_price: i64,
    pub selling_price: i64,
    #[schema(example = "500.0")]
    pub current_stock: Decimal,
    #[schema(example = "200.0")]
    pub min_stock: Decimal,
    pub last_restocked: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Material {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_movement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockMovementType {
    Restock,
    Adjustment,
    OrderCheckout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_direction", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    In,
    Out,
}

impl StockDirection {
    /// Aplica o sentido a uma quantidade (entrada soma, saída subtrai).
    pub fn signed(self, quantity: Decimal) -> Decimal {
        match self {
            StockDirection::In => quantity,
            StockDirection::Out => -quantity,
        }
    }
}

// --- STOCK MOVEMENT (livro-razão, só cresce) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub material_id: Uuid,
    pub order_id: Option<Uuid>,
    pub user_id: Uuid,
    pub movement_type: StockMovementType,
    pub direction: StockDirection,
    pub quantity: Decimal,
    pub balance_after: Decimal,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Material com a marcação de estoque baixo, como o frontend espera.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialView {
    #[serde(flatten)]
    pub material: Material,
    pub is_low_stock: bool,
}

impl From<Material> for MaterialView {
    fn from(material: Material) -> Self {
        let is_low_stock = material.is_low_stock();
        Self { material, is_low_stock }
    }
}

/// Resultado da conferência entre o cache e o livro-razão.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCheck {
    pub material_id: Uuid,
    pub current_stock: Decimal,
    pub ledger_balance: Decimal,
    pub movement_count: i64,
    pub consistent: bool,
}

/// Quanto um pedido precisa de um material e se o saldo atual cobre.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRequirement {
    pub material_id: Uuid,
    pub material_name: String,
    pub unit: String,
    pub required: Decimal,
    pub available: Decimal,
    pub sufficient: bool,
}
