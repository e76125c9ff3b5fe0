// src/common/db_utils.rs

use sqlx::{PgPool, Postgres, Transaction};

use crate::common::error::AppError;

/// Abre uma transação SERIALIZABLE.
/// O SET precisa ser o primeiro comando da transação, antes de qualquer leitura.
pub(crate) async fn begin_serializable(
    pool: &PgPool,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
