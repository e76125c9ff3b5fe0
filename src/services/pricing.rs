// src/services/pricing.rs
//
// Precificação pura: nenhuma função aqui toca o banco.

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::orders_repo::NewOrderItem,
    models::catalog::ResolvedVariant,
    services::inventory_service::StockUsage,
};

/// Uma linha como o caixa pediu, antes de qualquer consulta ao catálogo.
#[derive(Debug, Clone)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i32,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub notes: String,
    pub finishing: bool,
}

/// Linha precificada: o item a gravar e o fator que escala a receita.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub item: NewOrderItem,
    pub usage_factor: Decimal,
}

#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub items: Vec<NewOrderItem>,
    pub usage: StockUsage,
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
    pub estimated_minutes: i32,
}

fn out_of_range() -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("valor monetário fora do intervalo"))
}

/// Arredonda para a unidade inteira de moeda, meio para longe do zero.
pub fn round_currency(value: Decimal) -> Result<i64, AppError> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(out_of_range)
}

/// total = max(subtotal - desconto + taxa, 0)
pub fn order_total(subtotal: i64, discount: i64, tax: i64) -> i64 {
    subtotal.saturating_sub(discount).saturating_add(tax).max(0)
}

pub fn price_line(line: &LineRequest, resolved: &ResolvedVariant) -> Result<PricedLine, AppError> {
    if line.quantity <= 0 {
        return Err(AppError::NonPositiveQuantity);
    }

    let product = &resolved.product;
    let variant = &resolved.variant;
    let unit_price = Decimal::from(variant.selling_price);
    let quantity = Decimal::from(line.quantity);

    // Unidades por área: o preço é área x preço; a quantidade só escala o consumo.
    let (raw_subtotal, usage_factor, width, height) = if product.pricing_unit.requires_dimensions() {
        let (width, height) = match (line.width, line.height) {
            (Some(w), Some(h)) if w > Decimal::ZERO && h > Decimal::ZERO => (w, h),
            _ => return Err(AppError::DimensionsRequired(product.name.clone())),
        };
        let area = width.checked_mul(height).ok_or_else(out_of_range)?;
        (
            area.checked_mul(unit_price).ok_or_else(out_of_range)?,
            area.checked_mul(quantity).ok_or_else(out_of_range)?,
            Some(width),
            Some(height),
        )
    } else {
        (
            quantity.checked_mul(unit_price).ok_or_else(out_of_range)?,
            quantity,
            None,
            None,
        )
    };

    let finishing_cost = if line.finishing && product.finishing_cost > 0 {
        product.finishing_cost
    } else {
        0
    };

    let subtotal = round_currency(raw_subtotal)?
        .checked_add(finishing_cost)
        .ok_or_else(out_of_range)?;

    Ok(PricedLine {
        item: NewOrderItem {
            product_id: product.id,
            variant_id: variant.id,
            product_name: product.name.clone(),
            variant_name: variant.name.clone(),
            pricing_unit: product.pricing_unit,
            unit_price: variant.selling_price,
            quantity: line.quantity,
            width,
            height,
            notes: line.notes.clone(),
            finishing: line.finishing,
            finishing_cost,
            subtotal,
            estimated_minutes: product.estimated_minutes.saturating_mul(line.quantity),
        },
        usage_factor,
    })
}

/// Precifica todas as linhas e acumula o consumo de material pelas receitas.
/// `resolved[i]` corresponde a `lines[i]`.
pub fn price_order(
    lines: &[LineRequest],
    resolved: &[ResolvedVariant],
    discount: i64,
    tax: i64,
) -> Result<PricedOrder, AppError> {
    if discount < 0 {
        return Err(AppError::NegativeAmount("discount"));
    }
    if tax < 0 {
        return Err(AppError::NegativeAmount("tax"));
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut usage = StockUsage::new();
    let mut subtotal: i64 = 0;
    let mut estimated_minutes: i32 = 0;

    for (line, variant) in lines.iter().zip(resolved) {
        let priced = price_line(line, variant)?;

        for recipe in &variant.recipes {
            let required = recipe
                .usage_per_unit
                .checked_mul(priced.usage_factor)
                .ok_or_else(out_of_range)?;
            usage.add(recipe.material_id, required)?;
        }

        subtotal = subtotal.checked_add(priced.item.subtotal).ok_or_else(out_of_range)?;
        estimated_minutes = estimated_minutes.saturating_add(priced.item.estimated_minutes);
        items.push(priced.item);
    }

    Ok(PricedOrder {
        items,
        usage,
        subtotal,
        discount,
        tax,
        total: order_total(subtotal, discount, tax),
        estimated_minutes,
    })
}
