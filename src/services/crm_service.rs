// src/services/crm_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{common::error::AppError, db::CrmRepository, models::crm::Customer};

/// Cada 10.000 rupias gastas vale um ponto.
pub const RUPIAH_PER_LOYALTY_POINT: i64 = 10_000;

/// Normaliza para o formato nacional indonésio:
/// 62xxxxxxxxxx -> 0xxxxxxxxxx e 8xxxxxxxxxx -> 08xxxxxxxxx.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if let Some(rest) = digits.strip_prefix("62") {
        format!("0{}", rest)
    } else if digits.starts_with('8') {
        format!("0{}", digits)
    } else {
        digits
    }
}

/// `0` seguido de 8 a 14 dígitos.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.starts_with('0')
        && (9..=15).contains(&phone.len())
        && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Normaliza e valida de uma vez.
pub fn canonical_phone(raw: &str) -> Result<String, AppError> {
    let phone = normalize_phone(raw);
    if is_valid_phone(&phone) {
        Ok(phone)
    } else {
        Err(AppError::InvalidPhone(raw.to_string()))
    }
}

pub fn loyalty_points_for(total: i64) -> i64 {
    total.max(0) / RUPIAH_PER_LOYALTY_POINT
}

#[derive(Clone)]
pub struct CrmService {
    crm_repo: CrmRepository,
    pool: PgPool,
}

impl CrmService {
    pub fn new(crm_repo: CrmRepository, pool: PgPool) -> Self {
        Self { crm_repo, pool }
    }

    /// Cliente referenciado explicitamente; precisa existir e não estar apagado.
    pub async fn find_referenced(
        &self,
        conn: &mut PgConnection,
        customer_id: Uuid,
    ) -> Result<Customer, AppError> {
        self.crm_repo
            .find_customer(&mut *conn, customer_id)
            .await?
            .ok_or(AppError::CustomerReferenceNotFound)
    }

    /// Reconciliação por telefone (já normalizado): mesmo telefone, mesmo cliente.
    pub async fn reconcile_by_phone(
        &self,
        conn: &mut PgConnection,
        name: &str,
        phone: &str,
    ) -> Result<Customer, AppError> {
        self.crm_repo.upsert_by_phone(&mut *conn, name, phone).await
    }

    /// Soma o pedido aos agregados do cliente, na mesma transação do checkout.
    pub async fn record_purchase(
        &self,
        conn: &mut PgConnection,
        customer_id: Uuid,
        order_total: i64,
    ) -> Result<Customer, AppError> {
        self.crm_repo
            .increment_metrics(&mut *conn, customer_id, order_total, loyalty_points_for(order_total))
            .await
    }

    pub async fn find_customer(
        &self,
        conn: &mut PgConnection,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError> {
        self.crm_repo.find_customer(&mut *conn, customer_id).await
    }

    pub async fn lookup_by_phone(&self, raw_phone: &str) -> Result<Customer, AppError> {
        let phone = canonical_phone(raw_phone)?;

        self.crm_repo
            .find_by_phone(&self.pool, &phone)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("customer".into()))
    }
}
