// src/services/inventory_service.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_serializable, error::AppError},
    db::{
        inventory_repo::{NewMaterial, NewStockMovement},
        InventoryRepository,
    },
    models::{
        catalog::is_available,
        inventory::{
            LedgerCheck, Material, MaterialRequirement, StockDirection, StockMovement,
            StockMovementType,
        },
    },
};

// ---
// Consumo de materiais de um pedido
// ---

/// Mapa material -> quantidade total exigida, somada entre todas as linhas.
/// BTreeMap: toda transação trava as linhas de material na mesma ordem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockUsage(BTreeMap<Uuid, Decimal>);

impl StockUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, material_id: Uuid, quantity: Decimal) -> Result<(), AppError> {
        let total = self.0.entry(material_id).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(quantity)
            .ok_or(AppError::QuantityOutOfRange)?;
        Ok(())
    }

    pub fn get(&self, material_id: Uuid) -> Option<Decimal> {
        self.0.get(&material_id).copied()
    }

    pub fn material_ids(&self) -> Vec<Uuid> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uuid, Decimal)> + '_ {
        self.0.iter().map(|(id, qty)| (*id, *qty))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Cruza o consumo com os materiais lidos. Material ausente ou indisponível
/// invalida o pedido inteiro; saldo curto só marca `sufficient = false`.
pub fn assess_usage(
    usage: &StockUsage,
    materials: &[Material],
) -> Result<Vec<MaterialRequirement>, AppError> {
    let by_id: BTreeMap<Uuid, &Material> = materials.iter().map(|m| (m.id, m)).collect();

    usage
        .iter()
        .map(|(material_id, required)| {
            let material = by_id
                .get(&material_id)
                .filter(|m| is_available(m.is_active, m.deleted_at))
                .ok_or(AppError::RecipeMaterialUnavailable)?;

            Ok(MaterialRequirement {
                material_id,
                material_name: material.name.clone(),
                unit: material.unit.clone(),
                required,
                available: material.current_stock,
                sufficient: material.current_stock >= required,
            })
        })
        .collect()
}

/// Falha no primeiro material sem saldo, nomeando-o.
pub fn ensure_sufficient(requirements: &[MaterialRequirement]) -> Result<(), AppError> {
    match requirements.iter().find(|r| !r.sufficient) {
        Some(short) => Err(AppError::InsufficientStock(short.material_name.clone())),
        None => Ok(()),
    }
}

/// Saldo resultante de aplicar uma movimentação.
/// Saldo negativo vira `AdjustmentBelowZero`; estouro do Decimal, `QuantityOutOfRange`.
pub fn apply_movement(
    current: Decimal,
    direction: StockDirection,
    quantity: Decimal,
) -> Result<Decimal, AppError> {
    let balance = current
        .checked_add(direction.signed(quantity))
        .ok_or(AppError::QuantityOutOfRange)?;

    if balance.is_sign_negative() && !balance.is_zero() {
        return Err(AppError::AdjustmentBelowZero);
    }
    Ok(balance)
}

/// Reconstrói o saldo somando o livro-razão a partir de zero.
pub fn fold_ledger(movements: &[StockMovement]) -> Result<Decimal, AppError> {
    movements.iter().try_fold(Decimal::ZERO, |acc, m| {
        acc.checked_add(m.direction.signed(m.quantity)).ok_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!(
                "saldo do livro-razão fora do intervalo (material {})",
                m.material_id
            ))
        })
    })
}

pub fn checkout_note(order_number: &str) -> String {
    format!("Pemakaian bahan untuk pesanan {}", order_number)
}

pub const OPENING_STOCK_NOTE: &str = "Stok awal";

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    // ---
    // Checkout
    // ---

    /// Pré-checagem fora da transação de escrita. Não trava nada.
    pub async fn precheck(
        &self,
        usage: &StockUsage,
    ) -> Result<Vec<MaterialRequirement>, AppError> {
        if usage.is_empty() {
            return Ok(Vec::new());
        }

        let materials = self
            .inventory_repo
            .find_available_by_ids(&self.pool, &usage.material_ids())
            .await?;

        assess_usage(usage, &materials)
    }

    /// Rechecagem e débito dentro da transação do checkout.
    /// Cada linha é relida com FOR UPDATE antes do cálculo do novo saldo.
    pub async fn consume_for_order(
        &self,
        conn: &mut PgConnection,
        usage: &StockUsage,
        order_id: Uuid,
        order_number: &str,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let notes = checkout_note(order_number);

        for (material_id, quantity) in usage.iter() {
            // Receita com consumo zero: nada a debitar nem a registrar.
            if quantity.is_zero() {
                continue;
            }

            let material = self
                .inventory_repo
                .get_material_for_update(&mut *conn, material_id)
                .await?
                .filter(|m| is_available(m.is_active, m.deleted_at))
                .ok_or(AppError::MaterialVanished)?;

            let new_balance = apply_movement(material.current_stock, StockDirection::Out, quantity)
                .map_err(|e| match e {
                    AppError::AdjustmentBelowZero => AppError::InsufficientStock(material.name.clone()),
                    other => other,
                })?;

            self.inventory_repo
                .set_stock(&mut *conn, material_id, new_balance, false)
                .await?;

            self.inventory_repo
                .record_stock_movement(
                    &mut *conn,
                    &NewStockMovement {
                        material_id,
                        order_id: Some(order_id),
                        user_id,
                        movement_type: StockMovementType::OrderCheckout,
                        direction: StockDirection::Out,
                        quantity,
                        balance_after: new_balance,
                        notes: &notes,
                    },
                )
                .await?;

            tracing::debug!(
                material = %material.name,
                %quantity,
                balance = %new_balance,
                "Baixa de estoque para {}",
                order_number
            );
        }

        Ok(())
    }

    // ---
    // Movimentações manuais
    // ---

    /// Entrada de compra. Também carimba `last_restocked`.
    pub async fn restock(
        &self,
        material_id: Uuid,
        user_id: Uuid,
        quantity: Decimal,
        notes: &str,
    ) -> Result<Material, AppError> {
        self.apply_manual_movement(
            material_id,
            user_id,
            StockMovementType::Restock,
            StockDirection::In,
            quantity,
            notes,
        )
        .await
    }

    /// Ajuste de inventário em qualquer sentido. Saída além do saldo é recusada.
    pub async fn adjust(
        &self,
        material_id: Uuid,
        user_id: Uuid,
        direction: StockDirection,
        quantity: Decimal,
        notes: &str,
    ) -> Result<Material, AppError> {
        self.apply_manual_movement(
            material_id,
            user_id,
            StockMovementType::Adjustment,
            direction,
            quantity,
            notes,
        )
        .await
    }

    async fn apply_manual_movement(
        &self,
        material_id: Uuid,
        user_id: Uuid,
        movement_type: StockMovementType,
        direction: StockDirection,
        quantity: Decimal,
        notes: &str,
    ) -> Result<Material, AppError> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::NonPositiveQuantity);
        }

        let mut tx = begin_serializable(&self.pool).await?;

        let material = self
            .inventory_repo
            .get_material_for_update(&mut *tx, material_id)
            .await?
            .filter(|m| m.deleted_at.is_none())
            .ok_or_else(|| AppError::ResourceNotFound("material".into()))?;

        let new_balance = apply_movement(material.current_stock, direction, quantity)?;

        let updated = self
            .inventory_repo
            .set_stock(
                &mut *tx,
                material_id,
                new_balance,
                movement_type == StockMovementType::Restock,
            )
            .await?;

        self.inventory_repo
            .record_stock_movement(
                &mut *tx,
                &NewStockMovement {
                    material_id,
                    order_id: None,
                    user_id,
                    movement_type,
                    direction,
                    quantity,
                    balance_after: new_balance,
                    notes,
                },
            )
            .await?;

        tx.commit().await?;

        tracing::debug!(
            material = %updated.name,
            ?movement_type,
            ?direction,
            %quantity,
            balance = %new_balance,
            "Movimentação manual de estoque"
        );

        Ok(updated)
    }

    /// Cadastro de material. Estoque inicial entra como ajuste de entrada,
    /// para que o livro-razão feche desde o primeiro lançamento.
    pub async fn create_material(
        &self,
        user_id: Uuid,
        new: &NewMaterial,
    ) -> Result<Material, AppError> {
        if new.current_stock.is_sign_negative() && !new.current_stock.is_zero() {
            return Err(AppError::AdjustmentBelowZero);
        }

        let mut tx = self.pool.begin().await?;

        let material = self
            .inventory_repo
            .create_material(&mut *tx, new, None)
            .await?;

        if material.current_stock > Decimal::ZERO {
            self.inventory_repo
                .record_stock_movement(
                    &mut *tx,
                    &NewStockMovement {
                        material_id: material.id,
                        order_id: None,
                        user_id,
                        movement_type: StockMovementType::Adjustment,
                        direction: StockDirection::In,
                        quantity: material.current_stock,
                        balance_after: material.current_stock,
                        notes: OPENING_STOCK_NOTE,
                    },
                )
                .await?;
        }

        tx.commit().await?;
        Ok(material)
    }

    // ---
    // Consultas do livro-razão
    // ---

    pub async fn list_movements(&self, material_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        self.inventory_repo
            .find_by_id(&self.pool, material_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("material".into()))?;

        self.inventory_repo
            .list_movements(&self.pool, material_id)
            .await
    }

    pub async fn ledger_balance(&self, material_id: Uuid) -> Result<Decimal, AppError> {
        let movements = self.list_movements(material_id).await?;
        fold_ledger(&movements)
    }

    /// Compara o cache com a soma do livro-razão, lidos no mesmo snapshot.
    pub async fn ledger_check(&self, material_id: Uuid) -> Result<LedgerCheck, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let material = self
            .inventory_repo
            .find_by_id(&mut *tx, material_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("material".into()))?;

        let movements = self
            .inventory_repo
            .list_movements(&mut *tx, material_id)
            .await?;

        tx.commit().await?;

        let ledger_balance = fold_ledger(&movements)?;
        Ok(LedgerCheck {
            material_id,
            current_stock: material.current_stock,
            ledger_balance,
            movement_count: movements.len() as i64,
            consistent: ledger_balance == material.current_stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn material(name: &str, stock: Decimal) -> Material {
        Material {
            id: Uuid::new_v4(),
            name: name.into(),
            unit: "ml".into(),
            cost_price: 0,
            selling_price: 0,
            current_stock: stock,
            min_stock: Decimal::ZERO,
            last_restocked: None,
            is_active: true,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    fn movement(direction: StockDirection, quantity: Decimal) -> StockMovement {
        StockMovement {
            id: Uuid::new_v4(),
            material_id: Uuid::nil(),
            order_id: None,
            user_id: Uuid::nil(),
            movement_type: StockMovementType::Adjustment,
            direction,
            quantity,
            balance_after: Decimal::ZERO,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn usage_accumulates_across_lines() {
        let ink = Uuid::new_v4();
        let mut usage = StockUsage::new();
        usage.add(ink, dec!(0.2)).unwrap();
        usage.add(ink, dec!(0.35)).unwrap();

        assert_eq!(usage.get(ink), Some(dec!(0.55)));
        assert_eq!(usage.len(), 1);
    }

    #[test]
    fn shortfall_names_the_material() {
        let flexi = material("Flexi 280gr", dec!(5));
        let mut usage = StockUsage::new();
        usage.add(flexi.id, dec!(10)).unwrap();

        let requirements = assess_usage(&usage, &[flexi]).unwrap();
        assert!(!requirements[0].sufficient);

        match ensure_sufficient(&requirements) {
            Err(AppError::InsufficientStock(name)) => assert_eq!(name, "Flexi 280gr"),
            other => panic!("esperava InsufficientStock, veio {:?}", other),
        }
    }

    #[test]
    fn exact_stock_is_enough() {
        let paper = material("Art Paper", dec!(10));
        let mut usage = StockUsage::new();
        usage.add(paper.id, dec!(10)).unwrap();

        let requirements = assess_usage(&usage, &[paper]).unwrap();
        assert!(ensure_sufficient(&requirements).is_ok());
    }

    #[test]
    fn inactive_or_missing_material_rejects_the_order() {
        let mut ink = material("Tinta", dec!(100));
        ink.is_active = false;
        let mut usage = StockUsage::new();
        usage.add(ink.id, dec!(1)).unwrap();

        assert!(matches!(
            assess_usage(&usage, &[ink]),
            Err(AppError::RecipeMaterialUnavailable)
        ));
        assert!(matches!(
            assess_usage(&usage, &[]),
            Err(AppError::RecipeMaterialUnavailable)
        ));
    }

    #[test]
    fn movements_never_go_below_zero() {
        assert_eq!(apply_movement(dec!(5), StockDirection::Out, dec!(5)).unwrap(), dec!(0));
        assert!(matches!(
            apply_movement(dec!(5), StockDirection::Out, dec!(5.01)),
            Err(AppError::AdjustmentBelowZero)
        ));
        assert_eq!(apply_movement(dec!(5), StockDirection::In, dec!(2.5)).unwrap(), dec!(7.5));
    }

    #[test]
    fn huge_quantities_fail_instead_of_overflowing() {
        let huge = Decimal::MAX - dec!(1);

        assert!(matches!(
            apply_movement(huge, StockDirection::In, huge),
            Err(AppError::QuantityOutOfRange)
        ));

        let mut usage = StockUsage::new();
        let paper = Uuid::new_v4();
        usage.add(paper, huge).unwrap();
        assert!(matches!(usage.add(paper, huge), Err(AppError::QuantityOutOfRange)));
        assert_eq!(usage.get(paper), Some(huge));

        let movements = vec![
            movement(StockDirection::In, huge),
            movement(StockDirection::In, huge),
        ];
        assert!(matches!(
            fold_ledger(&movements),
            Err(AppError::InternalServerError(_))
        ));
    }

    #[test]
    fn fold_matches_running_balance() {
        let movements = vec![
            movement(StockDirection::In, dec!(500)),
            movement(StockDirection::Out, dec!(12.5)),
            movement(StockDirection::In, dec!(100)),
            movement(StockDirection::Out, dec!(0.25)),
        ];
        assert_eq!(fold_ledger(&movements).unwrap(), dec!(587.25));
        assert_eq!(fold_ledger(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn checkout_note_references_the_order() {
        assert_eq!(
            checkout_note("ORD-20250101-007"),
            "Pemakaian bahan untuk pesanan ORD-20250101-007"
        );
    }
}
