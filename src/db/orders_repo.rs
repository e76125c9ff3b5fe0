// src/db/orders_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::PricingUnit,
        orders::{Order, OrderItem, OrderStatus, PaymentMethod},
    },
};

#[derive(Debug, Clone)]
pub struct NewOrder {
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
    pub estimated_minutes: i32,
}

/// Linha de pedido com o retrato do catálogo já congelado.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
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
}

#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  NUMERAÇÃO
    // =========================================================================

    /// Maior número já emitido com o prefixo do dia.
    /// Ordena pelo comprimento antes do texto para que "-1000" venha depois de "-999".
    pub async fn latest_order_number<'e, E>(
        &self,
        executor: E,
        prefix: &str,
    ) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let latest: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT order_number FROM orders
            WHERE order_number LIKE $1 || '%'
            ORDER BY LENGTH(order_number) DESC, order_number DESC
            LIMIT 1
            "#,
        )
            .bind(prefix)
            .fetch_optional(executor)
            .await?;

        Ok(latest.map(|(number,)| number))
    }

    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        new: &NewOrder,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                order_number, customer_id, customer_name, customer_phone, payment_method,
                subtotal, discount, tax, total, notes, deadline, design_file_url,
                estimated_minutes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
            .bind(&new.order_number)
            .bind(new.customer_id)
            .bind(&new.customer_name)
            .bind(&new.customer_phone)
            .bind(new.payment_method)
            .bind(new.subtotal)
            .bind(new.discount)
            .bind(new.tax)
            .bind(new.total)
            .bind(&new.notes)
            .bind(new.deadline)
            .bind(&new.design_file_url)
            .bind(new.estimated_minutes)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation(format!(
                            "orders.order_number={}",
                            new.order_number
                        ));
                    }
                }
                e.into()
            })
    }

    /// Insere todas as linhas num único INSERT; `position` preserva a ordem do pedido.
    pub async fn insert_items<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            INSERT INTO order_items (
                order_id, product_id, variant_id, product_name, variant_name, pricing_unit,
                unit_price, quantity, width, height, notes, finishing, finishing_cost,
                subtotal, estimated_minutes, position
            )
            "#,
        );

        builder.push_values(items.iter().enumerate(), |mut row, (position, item)| {
            row.push_bind(order_id)
                .push_bind(item.product_id)
                .push_bind(item.variant_id)
                .push_bind(item.product_name.clone())
                .push_bind(item.variant_name.clone())
                .push_bind(item.pricing_unit)
                .push_bind(item.unit_price)
                .push_bind(item.quantity)
                .push_bind(item.width)
                .push_bind(item.height)
                .push_bind(item.notes.clone())
                .push_bind(item.finishing)
                .push_bind(item.finishing_cost)
                .push_bind(item.subtotal)
                .push_bind(item.estimated_minutes)
                .push_bind(position as i32);
        });
        builder.push(" RETURNING *");

        let rows = builder
            .build_query_as::<OrderItem>()
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn find_order<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE id = $1 AND deleted_at IS NULL",
        )
            .bind(order_id)
            .fetch_optional(executor)
            .await?;

        Ok(order)
    }

    pub async fn find_order_for_update<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
            .bind(order_id)
            .fetch_optional(executor)
            .await?;

        Ok(order)
    }

    pub async fn list_order_items<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY position ASC",
        )
            .bind(order_id)
            .fetch_all(executor)
            .await?;

        Ok(items)
    }

    /// Status e forma de pagamento são os únicos campos mutáveis de um pedido.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        status: OrderStatus,
        payment_method: PaymentMethod,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2, payment_method = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(order_id)
            .bind(status)
            .bind(payment_method)
            .fetch_one(executor)
            .await?;

        Ok(order)
    }
}
