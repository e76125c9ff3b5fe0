// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::quote_order,
        handlers::orders::get_order,
        handlers::orders::update_status,

        // --- Materials ---
        handlers::inventory::create_material,
        handlers::inventory::restock_material,
        handlers::inventory::adjust_material,
        handlers::inventory::list_movements,
        handlers::inventory::ledger_check,

        // --- Customers ---
        handlers::crm::lookup_customer,
    ),
    components(
        schemas(
            // --- Catálogo ---
            models::catalog::PricingUnit,

            // --- Orders ---
            models::orders::PaymentMethod,
            models::orders::OrderStatus,
            models::orders::Order,
            models::orders::OrderItem,
            models::orders::OrderDetail,
            models::orders::QuoteLine,
            models::orders::OrderQuote,

            // --- Inventory ---
            models::inventory::Material,
            models::inventory::MaterialView,
            models::inventory::StockMovementType,
            models::inventory::StockDirection,
            models::inventory::StockMovement,
            models::inventory::MaterialRequirement,
            models::inventory::LedgerCheck,

            // --- CRM ---
            models::crm::Customer,

            // --- Payloads ---
            handlers::orders::OrderItemPayload,
            handlers::orders::CreateOrderPayload,
            handlers::orders::QuoteOrderPayload,
            handlers::orders::UpdateStatusPayload,
            handlers::inventory::CreateMaterialPayload,
            handlers::inventory::RestockPayload,
            handlers::inventory::AdjustStockPayload,
        )
    ),
    tags(
        (name = "Orders", description = "Checkout, orçamento e esteira de produção"),
        (name = "Materials", description = "Estoque de materiais e livro-razão"),
        (name = "Customers", description = "Clientes identificados pelo telefone")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
