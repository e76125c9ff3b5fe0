// src/services/order_number.rs

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::PgConnection;

use crate::{common::error::AppError, db::OrdersRepository};

/// Relógio da loja. O dia do número do pedido é o dia no fuso da loja, não em UTC.
#[derive(Debug, Clone)]
pub struct ShopClock {
    tz: Tz,
    frozen_at: Option<DateTime<Utc>>,
}

impl ShopClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz, frozen_at: None }
    }

    /// Relógio parado num instante fixo (testes e reprocessamentos).
    pub fn frozen(tz: Tz, at: DateTime<Utc>) -> Self {
        Self { tz, frozen_at: Some(at) }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.frozen_at.unwrap_or_else(Utc::now)
    }

    /// `YYYYMMDD` no fuso da loja.
    pub fn day_code(&self) -> String {
        self.now().with_timezone(&self.tz).format("%Y%m%d").to_string()
    }
}

pub fn order_prefix(day_code: &str) -> String {
    format!("ORD-{}-", day_code)
}

/// Próximo número do dia a partir do maior já emitido.
/// Sem anterior, ou com sufixo ilegível, recomeça em 1.
pub fn next_order_number(day_code: &str, latest: Option<&str>) -> String {
    let sequence = latest
        .and_then(|number| number.rsplit('-').next())
        .and_then(|segment| segment.parse::<u64>().ok())
        .map(|last| last + 1)
        .unwrap_or(1);

    format!("{}{:03}", order_prefix(day_code), sequence)
}

#[derive(Clone)]
pub struct OrderNumberGenerator {
    orders_repo: OrdersRepository,
    clock: ShopClock,
}

impl OrderNumberGenerator {
    pub fn new(orders_repo: OrdersRepository, clock: ShopClock) -> Self {
        Self { orders_repo, clock }
    }

    /// Precisa rodar na mesma transação SERIALIZABLE que insere o pedido.
    pub async fn next(&self, conn: &mut PgConnection) -> Result<String, AppError> {
        let day_code = self.clock.day_code();
        let latest = self
            .orders_repo
            .latest_order_number(&mut *conn, &order_prefix(&day_code))
            .await?;

        Ok(next_order_number(&day_code, latest.as_deref()))
    }
}
