// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{CatalogRepository, CrmRepository, InventoryRepository, OrdersRepository, UserRepository},
    services::{
        auth::AuthService,
        catalog_service::CatalogService,
        crm_service::CrmService,
        inventory_service::InventoryService,
        order_number::{OrderNumberGenerator, ShopClock},
        order_service::OrderService,
    },
};

const MIN_JWT_SECRET_LEN: usize = 16;

/// Configuração lida do ambiente (com suporte a `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub app_tz: Tz,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub frontend_origin: String,
}

fn optional_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET precisa de pelo menos {} caracteres", MIN_JWT_SECRET_LEN);
        }

        let app_tz: Tz = optional_var("APP_TZ", "Asia/Jakarta")
            .parse()
            .map_err(|e| anyhow::anyhow!("APP_TZ inválido: {}", e))?;

        let db_max_connections = optional_var("DB_MAX_CONNECTIONS", "10")
            .parse()
            .context("DB_MAX_CONNECTIONS deve ser um inteiro")?;

        let acquire_secs: u64 = optional_var("DB_ACQUIRE_TIMEOUT_SECS", "3")
            .parse()
            .context("DB_ACQUIRE_TIMEOUT_SECS deve ser um inteiro")?;

        Ok(Self {
            database_url,
            jwt_secret,
            app_tz,
            bind_addr: optional_var("BIND_ADDR", "0.0.0.0:4000"),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            frontend_origin: optional_var("FRONTEND_ORIGIN", "http://localhost:8080"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub order_service: OrderService,
    pub inventory_service: InventoryService,
    pub crm_service: CrmService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(settings.db_acquire_timeout)
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::build(
            db_pool,
            settings.jwt_secret.clone(),
            ShopClock::new(settings.app_tz),
        ))
    }

    /// Monta o gráfico de dependências sobre um pool já aberto.
    pub fn build(db_pool: PgPool, jwt_secret: String, clock: ShopClock) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let orders_repo = OrdersRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret);
        let catalog_service = CatalogService::new(catalog_repo, db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo, db_pool.clone());
        let crm_service = CrmService::new(crm_repo, db_pool.clone());
        let order_numbers = OrderNumberGenerator::new(orders_repo.clone(), clock);

        let order_service = OrderService::new(
            db_pool.clone(),
            orders_repo,
            catalog_service,
            inventory_service.clone(),
            crm_service.clone(),
            order_numbers,
        );

        Self {
            db_pool,
            auth_service,
            order_service,
            inventory_service,
            crm_service,
        }
    }
}
