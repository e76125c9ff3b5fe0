// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Disponível = não apagado (soft delete) E ativo. Toda leitura de validação usa isto.
pub fn is_available(is_active: bool, deleted_at: Option<DateTime<Utc>>) -> bool {
    is_active && deleted_at.is_none()
}

// --- Unidade de precificação ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "pricing_unit")]
pub enum PricingUnit {
    #[sqlx(rename = "per_lembar")]
    #[serde(rename = "per_lembar")]
    PerSheet,
    #[sqlx(rename = "per_meter")]
    #[serde(rename = "per_meter")]
    PerLinearMeter,
    #[sqlx(rename = "per_cm")]
    #[serde(rename = "per_cm")]
    PerSquareCentimeter,
    #[sqlx(rename = "per_pcs")]
    #[serde(rename = "per_pcs")]
    PerPiece,
}

impl PricingUnit {
    /// Unidades cobradas por área exigem largura e altura.
    pub fn requires_dimensions(self) -> bool {
        matches!(self, PricingUnit::PerLinearMeter | PricingUnit::PerSquareCentimeter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub pricing_unit: PricingUnit,
    pub has_custom_size: bool,
    pub custom_width: Option<Decimal>,
    pub custom_height: Option<Decimal>,
    #[schema(example = 10000)]
    pub finishing_cost: i64,
    #[schema(example = 15)]
    pub estimated_minutes: i32,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub material_id: Uuid,
    pub name: String,
    pub cost_price: i64,
    #[schema(example = 35000)]
    pub selling_price: i64,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// --- Receita: quanto de cada material uma unidade da variante consome ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub material_id: Uuid,
    #[schema(example = "0.2")]
    pub usage_per_unit: Decimal,
}

/// Variante resolvida para uma linha de pedido: produto pai + receita completa.
#[derive(Debug, Clone)]
pub struct ResolvedVariant {
    pub variant: MaterialVariant,
    pub product: Product,
    pub recipes: Vec<Recipe>,
}
