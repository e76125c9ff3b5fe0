// Checkout ponta a ponta contra um PostgreSQL real.
mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::*;
use printshop::{
    common::error::AppError,
    models::{
        catalog::PricingUnit,
        inventory::{StockDirection, StockMovementType},
        orders::{OrderStatus, PaymentMethod},
    },
    services::{
        inventory_service::{checkout_note, StockUsage},
        pricing::LineRequest,
    },
};

struct BannerFixture {
    product_id: uuid::Uuid,
    variant_id: uuid::Uuid,
    flexi_id: uuid::Uuid,
    ink_id: uuid::Uuid,
}

/// Banner por metro (35.000/m², acabamento 10.000) consumindo lona e tinta.
async fn banner_fixture(ctx: &TestContext, flexi_stock: Decimal) -> BannerFixture {
    let flexi = seed_material(ctx, flexi_stock).await;
    let ink = seed_material(ctx, dec!(10)).await;
    let product_id = seed_product(&ctx.pool, PricingUnit::PerLinearMeter, 10_000, 30).await;
    let variant_id = seed_variant(
        &ctx.pool,
        product_id,
        flexi.id,
        35_000,
        &[(flexi.id, dec!(1)), (ink.id, dec!(0.05))],
    )
    .await;

    BannerFixture {
        product_id,
        variant_id,
        flexi_id: flexi.id,
        ink_id: ink.id,
    }
}

fn banner_line(fixture: &BannerFixture, width: Decimal, height: Decimal) -> LineRequest {
    LineRequest {
        width: Some(width),
        height: Some(height),
        finishing: true,
        ..line(fixture.product_id, fixture.variant_id, 1)
    }
}

#[tokio::test]
async fn checkout_writes_order_items_stock_and_customer_together() {
    let Some(ctx) = setup().await else { return };
    let fixture = banner_fixture(&ctx, dec!(50)).await;
    let phone = unique_phone();

    let cmd = walk_in_order(
        "Budi",
        &phone,
        vec![banner_line(&fixture, dec!(2), dec!(1.5))],
    );
    let detail = with_retry(|| ctx.state.order_service.create_order(ctx.user_id, cmd.clone()))
        .await
        .expect("checkout");

    let order = &detail.header;
    assert!(order
        .order_number
        .starts_with(&format!("ORD-{}-", ctx.clock.day_code())));
    assert_eq!(order.subtotal, 115_000);
    assert_eq!(order.total, 115_000);
    assert_eq!(order.status, OrderStatus::MenungguDesain);
    assert_eq!(order.customer_phone, phone);

    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].finishing_cost, 10_000);
    assert_eq!(detail.items[0].width, Some(dec!(2)));

    // 2 x 1.5 = 3 m² de lona e 0.15 de tinta.
    assert_eq!(current_stock(&ctx.pool, fixture.flexi_id).await, dec!(47));
    assert_eq!(current_stock(&ctx.pool, fixture.ink_id).await, dec!(9.85));

    let flexi_moves = movements_of(&ctx.pool, fixture.flexi_id).await;
    let checkout_move = flexi_moves.last().expect("movimento do checkout");
    assert_eq!(checkout_move.movement_type, StockMovementType::OrderCheckout);
    assert_eq!(checkout_move.direction, StockDirection::Out);
    assert_eq!(checkout_move.quantity, dec!(3));
    assert_eq!(checkout_move.balance_after, dec!(47));
    assert_eq!(checkout_move.order_id, Some(order.id));
    assert_eq!(checkout_move.user_id, ctx.user_id);
    assert_eq!(checkout_move.notes, checkout_note(&order.order_number));

    let customer = detail.customer.expect("cliente vinculado");
    assert_eq!(order.customer_id, Some(customer.id));
    assert_eq!(customer.total_orders, 1);
    assert_eq!(customer.total_spent, 115_000);
    assert_eq!(customer.loyalty_points, 11);
}

#[tokio::test]
async fn insufficient_stock_leaves_no_trace() {
    let Some(ctx) = setup().await else { return };
    let fixture = banner_fixture(&ctx, dec!(2)).await;
    let phone = unique_phone();
    let moves_before = movements_of(&ctx.pool, fixture.flexi_id).await.len();

    let cmd = walk_in_order(
        "Sari",
        &phone,
        vec![banner_line(&fixture, dec!(2), dec!(1.5))],
    );
    let err = with_retry(|| ctx.state.order_service.create_order(ctx.user_id, cmd.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(current_stock(&ctx.pool, fixture.flexi_id).await, dec!(2));
    assert_eq!(current_stock(&ctx.pool, fixture.ink_id).await, dec!(10));
    assert_eq!(movements_of(&ctx.pool, fixture.flexi_id).await.len(), moves_before);
    assert_eq!(
        count(&ctx.pool, "SELECT COUNT(*) FROM orders WHERE customer_phone = $1", &phone).await,
        0
    );
    assert_eq!(
        count(&ctx.pool, "SELECT COUNT(*) FROM customers WHERE phone = $1", &phone).await,
        0
    );
}

#[tokio::test]
async fn stock_drained_after_precheck_fails_at_commit_and_rolls_back() {
    let Some(ctx) = setup().await else { return };
    let inventory = &ctx.state.inventory_service;
    let paper = seed_material(&ctx, dec!(100)).await;
    let flexi = seed_material(&ctx, dec!(5)).await;
    let phone = unique_phone();

    let mut usage = StockUsage::new();
    usage.add(paper.id, dec!(10)).unwrap();
    usage.add(flexi.id, dec!(3)).unwrap();

    // A pré-checagem enxerga saldo suficiente...
    let requirements = inventory.precheck(&usage).await.expect("precheck");
    assert!(requirements.iter().all(|r| r.sufficient));

    // ...e outro caixa consome a lona antes da transação do checkout.
    with_retry(|| inventory.adjust(flexi.id, ctx.user_id, StockDirection::Out, dec!(4), "rusak"))
        .await
        .expect("adjust");

    let paper_moves = movements_of(&ctx.pool, paper.id).await.len();
    let flexi_moves = movements_of(&ctx.pool, flexi.id).await.len();
    let order_number = format!("ORD-{}-RECHECK", ctx.clock.day_code());

    let mut tx = ctx.pool.begin().await.expect("begin");
    let customer = ctx
        .state
        .crm_service
        .reconcile_by_phone(&mut *tx, "Wati", &phone)
        .await
        .expect("customer");
    let (order_id,): (uuid::Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO orders (order_number, customer_id, customer_name, customer_phone,
                            payment_method, subtotal, total)
        VALUES ($1, $2, 'Wati', $3, 'cash', 0, 0)
        RETURNING id
        "#,
    )
        .bind(&order_number)
        .bind(customer.id)
        .bind(&phone)
        .fetch_one(&mut *tx)
        .await
        .expect("order");

    let err = inventory
        .consume_for_order(&mut *tx, &usage, order_id, &order_number, ctx.user_id)
        .await
        .unwrap_err();
    match err {
        AppError::InsufficientStock(name) => assert_eq!(name, flexi.name),
        other => panic!("esperava InsufficientStock, veio {:?}", other),
    }
    tx.rollback().await.expect("rollback");

    assert_eq!(current_stock(&ctx.pool, paper.id).await, dec!(100));
    assert_eq!(current_stock(&ctx.pool, flexi.id).await, dec!(1));
    assert_eq!(movements_of(&ctx.pool, paper.id).await.len(), paper_moves);
    assert_eq!(movements_of(&ctx.pool, flexi.id).await.len(), flexi_moves);
    assert_eq!(
        count(&ctx.pool, "SELECT COUNT(*) FROM orders WHERE order_number = $1", &order_number).await,
        0
    );
    assert_eq!(
        count(&ctx.pool, "SELECT COUNT(*) FROM customers WHERE phone = $1", &phone).await,
        0
    );

    // O checkout completo com o mesmo consumo também não deixa rastro.
    let product_id = seed_product(&ctx.pool, PricingUnit::PerSheet, 0, 5).await;
    let variant_id =
        seed_variant(&ctx.pool, product_id, paper.id, 1_000, &[(paper.id, dec!(1)), (flexi.id, dec!(0.3))]).await;
    let cmd = walk_in_order("Wati", &phone, vec![line(product_id, variant_id, 10)]);
    let err = with_retry(|| ctx.state.order_service.create_order(ctx.user_id, cmd.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(name) if name == flexi.name));
    assert_eq!(current_stock(&ctx.pool, paper.id).await, dec!(100));
    assert_eq!(movements_of(&ctx.pool, paper.id).await.len(), paper_moves);
}

#[tokio::test]
async fn phone_variants_resolve_to_the_same_customer() {
    let Some(ctx) = setup().await else { return };
    let paper = seed_material(&ctx, dec!(1000)).await;
    let product_id = seed_product(&ctx.pool, PricingUnit::PerSheet, 0, 5).await;
    let variant_id =
        seed_variant(&ctx.pool, product_id, paper.id, 2_000, &[(paper.id, dec!(1))]).await;

    let local = unique_phone(); // 08xxxxxxxxxx
    let international = format!("62{}", &local[1..]);
    let bare = local[1..].to_string();

    let mut customer_ids = Vec::new();
    for phone in [&international, &bare, &local] {
        let cmd = walk_in_order("Andi", phone, vec![line(product_id, variant_id, 10)]);
        let detail =
            with_retry(|| ctx.state.order_service.create_order(ctx.user_id, cmd.clone()))
                .await
                .expect("checkout");
        assert_eq!(detail.header.customer_phone, local);
        customer_ids.push(detail.header.customer_id.expect("cliente"));
    }

    assert!(customer_ids.windows(2).all(|w| w[0] == w[1]));

    let customer = ctx
        .state
        .crm_service
        .lookup_by_phone(&international)
        .await
        .expect("lookup");
    assert_eq!(customer.id, customer_ids[0]);
    assert_eq!(customer.total_orders, 3);
    assert_eq!(customer.total_spent, 60_000);
    assert_eq!(customer.loyalty_points, 6);
}

#[tokio::test]
async fn invalid_phone_is_rejected_before_touching_stock() {
    let Some(ctx) = setup().await else { return };
    let fixture = banner_fixture(&ctx, dec!(50)).await;

    let cmd = walk_in_order("Budi", "12345", vec![banner_line(&fixture, dec!(1), dec!(1))]);
    let err = ctx
        .state
        .order_service
        .create_order(ctx.user_id, cmd)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidPhone(_)));
    assert_eq!(current_stock(&ctx.pool, fixture.flexi_id).await, dec!(50));
}

#[tokio::test]
async fn order_numbers_are_sequential_within_the_day() {
    let Some(ctx) = setup().await else { return };
    let paper = seed_material(&ctx, dec!(1000)).await;
    let product_id = seed_product(&ctx.pool, PricingUnit::PerSheet, 0, 5).await;
    let variant_id =
        seed_variant(&ctx.pool, product_id, paper.id, 1_500, &[(paper.id, dec!(1))]).await;

    let prefix = format!("ORD-{}-", ctx.clock.day_code());
    let mut numbers = Vec::new();
    for _ in 0..3 {
        let cmd = walk_in_order("Rina", &unique_phone(), vec![line(product_id, variant_id, 1)]);
        let detail =
            with_retry(|| ctx.state.order_service.create_order(ctx.user_id, cmd.clone()))
                .await
                .expect("checkout");
        numbers.push(detail.header.order_number);
    }

    let sequence: Vec<u32> = numbers
        .iter()
        .map(|n| {
            assert!(n.starts_with(&prefix), "{n} fora do prefixo {prefix}");
            n[prefix.len()..].parse().expect("sufixo numérico")
        })
        .collect();

    assert_eq!(sequence[1], sequence[0] + 1);
    assert_eq!(sequence[2], sequence[1] + 1);
}

#[tokio::test]
async fn concurrent_checkouts_never_oversell() {
    let Some(ctx) = setup().await else { return };
    // Cada pedido consome 6 de 10: só um pode passar.
    let fixture = banner_fixture(&ctx, dec!(10)).await;
    let line_a = banner_line(&fixture, dec!(3), dec!(2));
    let cmd_a = walk_in_order("Dewi", &unique_phone(), vec![line_a.clone()]);
    let cmd_b = walk_in_order("Eko", &unique_phone(), vec![line_a]);

    let service = &ctx.state.order_service;
    let (first, second) = futures::join!(
        service.create_order(ctx.user_id, cmd_a.clone()),
        service.create_order(ctx.user_id, cmd_b.clone()),
    );

    let mut outcomes = Vec::new();
    for (result, cmd) in [(first, cmd_a), (second, cmd_b)] {
        let settled = match result {
            Err(AppError::SerializationConflict) => {
                with_retry(|| service.create_order(ctx.user_id, cmd.clone())).await
            }
            other => other,
        };
        outcomes.push(settled);
    }

    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exatamente um checkout deve passar");
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::InsufficientStock(_))));

    assert_eq!(current_stock(&ctx.pool, fixture.flexi_id).await, dec!(4));
    let check = ctx
        .state
        .inventory_service
        .ledger_check(fixture.flexi_id)
        .await
        .expect("ledger check");
    assert!(check.consistent);
}

#[tokio::test]
async fn receivable_order_must_settle_before_pickup() {
    let Some(ctx) = setup().await else { return };
    let paper = seed_material(&ctx, dec!(100)).await;
    let product_id = seed_product(&ctx.pool, PricingUnit::PerPiece, 0, 10).await;
    let variant_id =
        seed_variant(&ctx.pool, product_id, paper.id, 5_000, &[(paper.id, dec!(1))]).await;

    let mut cmd = walk_in_order("Tono", &unique_phone(), vec![line(product_id, variant_id, 2)]);
    cmd.payment_method = PaymentMethod::Piutang;
    let order_id = with_retry(|| ctx.state.order_service.create_order(ctx.user_id, cmd.clone()))
        .await
        .expect("checkout")
        .header
        .id;

    let orders = &ctx.state.order_service;

    let err = orders
        .advance_status(order_id, OrderStatus::Finishing, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StatusSkip));

    for step in [
        OrderStatus::ProsesCetak,
        OrderStatus::Finishing,
        OrderStatus::Selesai,
    ] {
        let detail = orders.advance_status(order_id, step, None).await.expect("avançar");
        assert_eq!(detail.header.status, step);
    }

    let err = orders
        .advance_status(order_id, OrderStatus::ProsesCetak, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StatusRegression));

    let err = orders
        .advance_status(order_id, OrderStatus::SudahDiambil, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OrderNotSettled));
    assert_eq!(
        orders.get_order(order_id).await.expect("pedido").header.status,
        OrderStatus::Selesai
    );

    let detail = orders
        .advance_status(order_id, OrderStatus::SudahDiambil, Some(PaymentMethod::Qris))
        .await
        .expect("retirada quitada");
    assert_eq!(detail.header.status, OrderStatus::SudahDiambil);
    assert_eq!(detail.header.payment_method, PaymentMethod::Qris);
}

#[tokio::test]
async fn quote_reports_shortfall_without_writing() {
    let Some(ctx) = setup().await else { return };
    let fixture = banner_fixture(&ctx, dec!(2)).await;
    let moves_before = movements_of(&ctx.pool, fixture.flexi_id).await.len();

    let quote = ctx
        .state
        .order_service
        .quote(&[banner_line(&fixture, dec!(2), dec!(1.5))], 5_000, 0)
        .await
        .expect("quote");

    assert_eq!(quote.subtotal, 115_000);
    assert_eq!(quote.total, 110_000);
    assert!(!quote.fulfillable);
    let flexi = quote
        .materials
        .iter()
        .find(|m| m.material_id == fixture.flexi_id)
        .expect("lona no orçamento");
    assert_eq!(flexi.required, dec!(3));
    assert!(!flexi.sufficient);

    assert_eq!(current_stock(&ctx.pool, fixture.flexi_id).await, dec!(2));
    assert_eq!(movements_of(&ctx.pool, fixture.flexi_id).await.len(), moves_before);
}
