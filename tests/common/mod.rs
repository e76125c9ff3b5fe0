// Infra compartilhada dos testes de integração (PostgreSQL real via DATABASE_URL).
#![allow(dead_code)]

use std::{future::Future, time::Duration};

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use printshop::{
    common::error::AppError,
    config::AppState,
    db::inventory_repo::NewMaterial,
    models::{
        auth::UserRole,
        catalog::PricingUnit,
        inventory::{Material, StockMovement},
        orders::PaymentMethod,
    },
    services::{
        order_number::ShopClock,
        order_service::CreateOrderCommand,
        pricing::LineRequest,
    },
};

pub const JWT_SECRET: &str = "segredo-de-teste-com-32-caracteres";

pub struct TestContext {
    pub pool: PgPool,
    pub state: AppState,
    pub user_id: Uuid,
    pub clock: ShopClock,
}

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Conecta, migra e monta o estado. Sem DATABASE_URL o teste é pulado.
pub async fn setup() -> Option<TestContext> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL não definida; pulando teste de integração");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Falha ao conectar no banco de testes");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Falha ao rodar as migrações");

    // Cada teste ganha um "dia" próprio, para que a numeração dos pedidos
    // de um teste não se misture com a dos outros.
    let offset_days = (Uuid::new_v4().as_u128() % 200_000) as i64;
    let instant = Utc.with_ymd_and_hms(2100, 1, 1, 5, 0, 0).unwrap()
        + chrono::Duration::days(offset_days);
    let clock = ShopClock::frozen(chrono_tz::Asia::Jakarta, instant);

    let state = AppState::build(pool.clone(), JWT_SECRET.to_string(), clock.clone());
    let user_id = seed_user(&pool, UserRole::Kasir).await;

    Some(TestContext {
        pool,
        state,
        user_id,
        clock,
    })
}

pub async fn seed_user(pool: &PgPool, role: UserRole) -> Uuid {
    let (id,): (Uuid,) =
        sqlx::query_as("INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id")
            .bind(format!("user-{}", unique_suffix()))
            .bind(role)
            .fetch_one(pool)
            .await
            .expect("seed user");
    id
}

pub async fn seed_product(
    pool: &PgPool,
    pricing_unit: PricingUnit,
    finishing_cost: i64,
    estimated_minutes: i32,
) -> Uuid {
    let (category_id,): (Uuid,) =
        sqlx::query_as("INSERT INTO product_categories (name) VALUES ($1) RETURNING id")
            .bind(format!("Kategori {}", unique_suffix()))
            .fetch_one(pool)
            .await
            .expect("seed category");

    let (product_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO products (category_id, name, pricing_unit, finishing_cost, estimated_minutes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
        .bind(category_id)
        .bind(format!("Produk {}", unique_suffix()))
        .bind(pricing_unit)
        .bind(finishing_cost)
        .bind(estimated_minutes)
        .fetch_one(pool)
        .await
        .expect("seed product");

    product_id
}

/// Material com estoque inicial lançado no livro-razão.
pub async fn seed_material(ctx: &TestContext, opening_stock: Decimal) -> Material {
    ctx.state
        .inventory_service
        .create_material(
            ctx.user_id,
            &NewMaterial {
                name: format!("Bahan {}", unique_suffix()),
                unit: "m2".into(),
                cost_price: 10_000,
                selling_price: 0,
                current_stock: opening_stock,
                min_stock: Decimal::ZERO,
                is_active: true,
            },
        )
        .await
        .expect("seed material")
}

pub async fn seed_variant(
    pool: &PgPool,
    product_id: Uuid,
    material_id: Uuid,
    selling_price: i64,
    recipes: &[(Uuid, Decimal)],
) -> Uuid {
    let (variant_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO product_material_variants (product_id, material_id, name, selling_price)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
        .bind(product_id)
        .bind(material_id)
        .bind(format!("Varian {}", unique_suffix()))
        .bind(selling_price)
        .fetch_one(pool)
        .await
        .expect("seed variant");

    for (recipe_material, usage) in recipes {
        sqlx::query(
            "INSERT INTO variant_recipes (variant_id, material_id, usage_per_unit) VALUES ($1, $2, $3)",
        )
            .bind(variant_id)
            .bind(recipe_material)
            .bind(usage)
            .execute(pool)
            .await
            .expect("seed recipe");
    }

    variant_id
}

/// Telefone válido e único no formato 08xxxxxxxxxx.
pub fn unique_phone() -> String {
    format!("08{:010}", Uuid::new_v4().as_u128() % 10_000_000_000)
}

pub fn line(product_id: Uuid, variant_id: Uuid, quantity: i32) -> LineRequest {
    LineRequest {
        product_id,
        variant_id,
        quantity,
        width: None,
        height: None,
        notes: String::new(),
        finishing: false,
    }
}

pub fn walk_in_order(name: &str, phone: &str, lines: Vec<LineRequest>) -> CreateOrderCommand {
    CreateOrderCommand {
        customer_id: None,
        customer_name: Some(name.to_string()),
        customer_phone: Some(phone.to_string()),
        payment_method: PaymentMethod::Cash,
        discount: 0,
        tax: 0,
        notes: String::new(),
        deadline: None,
        design_file_url: None,
        lines,
    }
}

/// Repete a operação enquanto o banco devolver conflito de serialização.
/// Quem chama o checkout é responsável pelo retry; os testes fazem esse papel.
pub async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    for _ in 0..10 {
        match op().await {
            Err(AppError::SerializationConflict) => {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            other => return other,
        }
    }
    op().await
}

pub async fn current_stock(pool: &PgPool, material_id: Uuid) -> Decimal {
    let (stock,): (Decimal,) = sqlx::query_as("SELECT current_stock FROM materials WHERE id = $1")
        .bind(material_id)
        .fetch_one(pool)
        .await
        .expect("read stock");
    stock
}

pub async fn movements_of(pool: &PgPool, material_id: Uuid) -> Vec<StockMovement> {
    sqlx::query_as::<_, StockMovement>(
        "SELECT * FROM stock_movements WHERE material_id = $1 ORDER BY created_at, id",
    )
        .bind(material_id)
        .fetch_all(pool)
        .await
        .expect("read movements")
}

pub async fn count(pool: &PgPool, sql: &str, bind: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql)
        .bind(bind)
        .fetch_one(pool)
        .await
        .expect("count");
    n
}
