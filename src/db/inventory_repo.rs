// src/db/inventory_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{Material, StockDirection, StockMovement, StockMovementType},
};

/// Dados de um lançamento novo no livro-razão.
#[derive(Debug, Clone)]
pub struct NewStockMovement<'a> {
    pub material_id: Uuid,
    pub order_id: Option<Uuid>,
    pub user_id: Uuid,
    pub movement_type: StockMovementType,
    pub direction: StockDirection,
    pub quantity: Decimal,
    pub balance_after: Decimal,
    pub notes: &'a str,
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub name: String,
    pub unit: String,
    pub cost_price: i64,
    pub selling_price: i64,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura"
    // ---

    /// Materiais disponíveis entre os IDs informados (usado na pré-checagem).
    pub async fn find_available_by_ids<'e, E>(
        &self,
        executor: E,
        material_ids: &[Uuid],
    ) -> Result<Vec<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let materials = sqlx::query_as::<_, Material>(
            r#"
            SELECT * FROM materials
            WHERE id = ANY($1) AND deleted_at IS NULL AND is_active
            "#,
        )
            .bind(material_ids)
            .fetch_all(executor)
            .await?;

        Ok(materials)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        material_id: Uuid,
    ) -> Result<Option<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(
            "SELECT * FROM materials WHERE id = $1 AND deleted_at IS NULL",
        )
            .bind(material_id)
            .fetch_optional(executor)
            .await?;

        Ok(material)
    }

    /// Lê a linha já travada (FOR UPDATE) para o read-modify-write do saldo.
    pub async fn get_material_for_update<'e, E>(
        &self,
        executor: E,
        material_id: Uuid,
    ) -> Result<Option<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(
            "SELECT * FROM materials WHERE id = $1 FOR UPDATE",
        )
            .bind(material_id)
            .fetch_optional(executor)
            .await?;

        Ok(material)
    }

    /// Livro-razão de um material, do mais antigo ao mais novo.
    pub async fn list_movements<'e, E>(
        &self,
        executor: E,
        material_id: Uuid,
    ) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE material_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
            .bind(material_id)
            .fetch_all(executor)
            .await?;

        Ok(movements)
    }

    // ---
    // Funções de "Escrita" (sempre dentro de uma transação do service)
    // ---

    pub async fn create_material<'e, E>(
        &self,
        executor: E,
        new: &NewMaterial,
        restocked_at: Option<DateTime<Utc>>,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (
                name, unit, cost_price, selling_price, current_stock, min_stock,
                last_restocked, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(&new.name)
            .bind(&new.unit)
            .bind(new.cost_price)
            .bind(new.selling_price)
            .bind(new.current_stock)
            .bind(new.min_stock)
            .bind(restocked_at)
            .bind(new.is_active)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation(format!("materials.name={}", new.name));
                    }
                }
                e.into()
            })
    }

    /// Grava o novo saldo. `restocked` também carimba last_restocked.
    pub async fn set_stock<'e, E>(
        &self,
        executor: E,
        material_id: Uuid,
        new_balance: Decimal,
        restocked: bool,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(
            r#"
            UPDATE materials
            SET current_stock = $2,
                last_restocked = CASE WHEN $3 THEN NOW() ELSE last_restocked END
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(material_id)
            .bind(new_balance)
            .bind(restocked)
            .fetch_one(executor)
            .await?;

        Ok(material)
    }

    /// Registra uma movimentação no livro-razão (auditoria).
    pub async fn record_stock_movement<'e, E>(
        &self,
        executor: E,
        movement: &NewStockMovement<'_>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (
                material_id, order_id, user_id, movement_type, direction,
                quantity, balance_after, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(movement.material_id)
            .bind(movement.order_id)
            .bind(movement.user_id)
            .bind(movement.movement_type)
            .bind(movement.direction)
            .bind(movement.quantity)
            .bind(movement.balance_after)
            .bind(movement.notes)
            .fetch_one(executor)
            .await?;

        Ok(movement)
    }
}
