// src/db/crm_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::crm::Customer};

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cliente não apagado pelo ID.
    pub async fn find_customer<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND deleted_at IS NULL",
        )
            .bind(customer_id)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }

    /// O telefone já deve chegar normalizado.
    pub async fn find_by_phone<'e, E>(
        &self,
        executor: E,
        phone: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE phone = $1 AND deleted_at IS NULL",
        )
            .bind(phone)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }

    /// UPSERT pelo telefone normalizado: o mesmo telefone sempre cai na mesma linha.
    /// Se existir, atualiza o nome e reativa (inclusive se estava apagado).
    pub async fn upsert_by_phone<'e, E>(
        &self,
        executor: E,
        name: &str,
        phone: &str,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone, is_active)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (phone)
            DO UPDATE SET
                name = EXCLUDED.name,
                is_active = TRUE,
                deleted_at = NULL
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(phone)
            .fetch_one(executor)
            .await?;

        Ok(customer)
    }

    /// Acumula os agregados de vida do cliente. Só incrementa, nunca zera.
    pub async fn increment_metrics<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        order_total: i64,
        loyalty_points: i64,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET total_orders = total_orders + 1,
                total_spent = total_spent + $2,
                loyalty_points = loyalty_points + $3
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(customer_id)
            .bind(order_total)
            .bind(loyalty_points)
            .fetch_one(executor)
            .await?;

        Ok(customer)
    }
}
