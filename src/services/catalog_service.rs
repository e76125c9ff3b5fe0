// src/services/catalog_service.rs

use std::collections::{BTreeSet, HashMap};

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{is_available, MaterialVariant, Product, Recipe, ResolvedVariant},
    services::pricing::LineRequest,
};

#[derive(Clone)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl CatalogService {
    pub fn new(catalog_repo: CatalogRepository, pool: PgPool) -> Self {
        Self { catalog_repo, pool }
    }

    /// Resolve variante + produto + receita de cada linha, em lote.
    /// Ou todas as linhas validam, ou nada segue adiante.
    pub async fn resolve_lines(
        &self,
        lines: &[LineRequest],
    ) -> Result<Vec<ResolvedVariant>, AppError> {
        let variant_ids: Vec<Uuid> = lines
            .iter()
            .map(|l| l.variant_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let variants = self
            .catalog_repo
            .find_available_variants(&self.pool, &variant_ids)
            .await?;

        if variants.len() != variant_ids.len() {
            return Err(AppError::VariantsNotFound);
        }

        let product_ids: Vec<Uuid> = variants
            .iter()
            .map(|v| v.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let products = self
            .catalog_repo
            .find_products(&self.pool, &product_ids)
            .await?;

        let recipes = self
            .catalog_repo
            .find_recipes(&self.pool, &variant_ids)
            .await?;

        match_lines(lines, variants, products, recipes)
    }
}

/// Casa cada linha com o que veio do banco, na ordem do pedido.
pub fn match_lines(
    lines: &[LineRequest],
    variants: Vec<MaterialVariant>,
    products: Vec<Product>,
    recipes: Vec<Recipe>,
) -> Result<Vec<ResolvedVariant>, AppError> {
    let variants: HashMap<Uuid, MaterialVariant> = variants.into_iter().map(|v| (v.id, v)).collect();
    let products: HashMap<Uuid, Product> = products.into_iter().map(|p| (p.id, p)).collect();

    let mut recipes_by_variant: HashMap<Uuid, Vec<Recipe>> = HashMap::new();
    for recipe in recipes {
        recipes_by_variant.entry(recipe.variant_id).or_default().push(recipe);
    }

    lines
        .iter()
        .map(|line| {
            let variant = variants
                .get(&line.variant_id)
                .filter(|v| is_available(v.is_active, v.deleted_at))
                .ok_or(AppError::VariantsNotFound)?;

            if variant.product_id != line.product_id {
                return Err(AppError::VariantProductMismatch);
            }

            let product = products
                .get(&variant.product_id)
                .ok_or(AppError::VariantsNotFound)?;

            if !is_available(product.is_active, product.deleted_at) {
                return Err(AppError::ProductInactive(product.name.clone()));
            }

            Ok(ResolvedVariant {
                variant: variant.clone(),
                product: product.clone(),
                recipes: recipes_by_variant
                    .get(&variant.id)
                    .cloned()
                    .unwrap_or_default(),
            })
        })
        .collect()
}
