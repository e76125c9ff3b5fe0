// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- CLIENTE ---
// A identidade é o telefone normalizado; os agregados só crescem.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    #[schema(example = "081234567890")]
    pub phone: String,
    pub email: Option<String>,
    pub total_orders: i32,
    pub total_spent: i64,
    pub loyalty_points: i64,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
