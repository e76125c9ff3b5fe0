// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{MaterialVariant, Product, Recipe},
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Variantes disponíveis (ativas e não apagadas) entre os IDs pedidos.
    /// Quem chama compara com o que pediu para descobrir as que faltam.
    pub async fn find_available_variants<'e, E>(
        &self,
        executor: E,
        variant_ids: &[Uuid],
    ) -> Result<Vec<MaterialVariant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let variants = sqlx::query_as::<_, MaterialVariant>(
            r#"
            SELECT * FROM product_material_variants
            WHERE id = ANY($1) AND deleted_at IS NULL AND is_active
            "#,
        )
            .bind(variant_ids)
            .fetch_all(executor)
            .await?;

        Ok(variants)
    }

    // Sem filtro de disponibilidade: o service precisa do nome para a mensagem de "inativo".
    pub async fn find_products<'e, E>(
        &self,
        executor: E,
        product_ids: &[Uuid],
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1)",
        )
            .bind(product_ids)
            .fetch_all(executor)
            .await?;

        Ok(products)
    }

    pub async fn find_recipes<'e, E>(
        &self,
        executor: E,
        variant_ids: &[Uuid],
    ) -> Result<Vec<Recipe>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let recipes = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT * FROM variant_recipes
            WHERE variant_id = ANY($1)
            ORDER BY material_id
            "#,
        )
            .bind(variant_ids)
            .fetch_all(executor)
            .await?;

        Ok(recipes)
    }
}
