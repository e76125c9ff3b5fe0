// src/services/order_service.rs

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_serializable, error::AppError},
    db::{orders_repo::NewOrder, OrdersRepository},
    models::{
        crm::Customer,
        orders::{Order, OrderDetail, OrderQuote, OrderStatus, PaymentMethod, QuoteLine},
    },
    services::{
        catalog_service::CatalogService,
        crm_service::{canonical_phone, CrmService},
        inventory_service::{ensure_sufficient, InventoryService},
        order_number::OrderNumberGenerator,
        pricing::{self, LineRequest, PricedOrder},
    },
};

/// Pedido de checkout já validado no formato, ainda não no negócio.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub discount: i64,
    pub tax: i64,
    pub notes: String,
    pub deadline: Option<DateTime<Utc>>,
    pub design_file_url: Option<String>,
    pub lines: Vec<LineRequest>,
}

/// De onde vem o cliente do pedido.
#[derive(Debug, Clone, PartialEq)]
enum CustomerIdentity {
    Existing {
        id: Uuid,
        name: Option<String>,
        phone: Option<String>,
    },
    ByPhone {
        name: String,
        phone: String,
    },
}

/// Passo 1 do checkout: telefone normalizado e dados mínimos presentes.
fn identify_customer(cmd: &CreateOrderCommand) -> Result<CustomerIdentity, AppError> {
    let name = cmd
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let phone = cmd
        .customer_phone
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(canonical_phone)
        .transpose()?;

    match cmd.customer_id {
        Some(id) => Ok(CustomerIdentity::Existing { id, name, phone }),
        None => Ok(CustomerIdentity::ByPhone {
            name: name.ok_or(AppError::MissingCustomerField("customerName"))?,
            phone: phone.ok_or(AppError::MissingCustomerField("customerPhone"))?,
        }),
    }
}

/// Regras de transição de status. Devolve a forma de pagamento que o pedido
/// terá depois da transição.
pub fn plan_status_change(
    current: OrderStatus,
    payment_method: PaymentMethod,
    target: OrderStatus,
    settlement: Option<PaymentMethod>,
) -> Result<PaymentMethod, AppError> {
    let (from, to) = (current.index(), target.index());

    if to < from {
        return Err(AppError::StatusRegression);
    }
    if to == from {
        return Err(AppError::StatusUnchanged);
    }
    if current.next() != Some(target) {
        return Err(AppError::StatusSkip);
    }

    // Piutang só sai da loja quitado.
    if target.is_picked_up() && payment_method.is_receivable() {
        return match settlement {
            Some(method) if !method.is_receivable() => Ok(method),
            _ => Err(AppError::OrderNotSettled),
        };
    }

    Ok(payment_method)
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    orders_repo: OrdersRepository,
    catalog_service: CatalogService,
    inventory_service: InventoryService,
    crm_service: CrmService,
    order_numbers: OrderNumberGenerator,
}

impl OrderService {
    pub fn new(
        pool: PgPool,
        orders_repo: OrdersRepository,
        catalog_service: CatalogService,
        inventory_service: InventoryService,
        crm_service: CrmService,
        order_numbers: OrderNumberGenerator,
    ) -> Self {
        Self {
            pool,
            orders_repo,
            catalog_service,
            inventory_service,
            crm_service,
            order_numbers,
        }
    }

    async fn price(
        &self,
        lines: &[LineRequest],
        discount: i64,
        tax: i64,
    ) -> Result<PricedOrder, AppError> {
        let resolved = self.catalog_service.resolve_lines(lines).await?;
        pricing::price_order(lines, &resolved, discount, tax)
    }

    // =========================================================================
    //  CHECKOUT
    // =========================================================================

    /// Checkout completo: pedido, itens, baixas de estoque e agregados do
    /// cliente entram juntos numa transação SERIALIZABLE, ou nada entra.
    pub async fn create_order(
        &self,
        acting_user_id: Uuid,
        cmd: CreateOrderCommand,
    ) -> Result<OrderDetail, AppError> {
        // 1-4: tudo que pode falhar sem tocar o banco para escrita.
        let identity = identify_customer(&cmd)?;
        let priced = self.price(&cmd.lines, cmd.discount, cmd.tax).await?;
        let requirements = self.inventory_service.precheck(&priced.usage).await?;
        ensure_sufficient(&requirements)?;

        // 5: a transação.
        let mut tx = begin_serializable(&self.pool).await?;

        let (customer, customer_name, customer_phone) = match identity {
            CustomerIdentity::Existing { id, name, phone } => {
                let customer = self.crm_service.find_referenced(&mut *tx, id).await?;
                let name = name.unwrap_or_else(|| customer.name.clone());
                let phone = phone.unwrap_or_else(|| customer.phone.clone());
                (customer, name, phone)
            }
            CustomerIdentity::ByPhone { name, phone } => {
                let customer = self
                    .crm_service
                    .reconcile_by_phone(&mut *tx, &name, &phone)
                    .await?;
                (customer, name, phone)
            }
        };

        let order_number = self.order_numbers.next(&mut *tx).await?;

        let order = self
            .orders_repo
            .insert_order(
                &mut *tx,
                &NewOrder {
                    order_number: order_number.clone(),
                    customer_id: Some(customer.id),
                    customer_name,
                    customer_phone,
                    payment_method: cmd.payment_method,
                    subtotal: priced.subtotal,
                    discount: priced.discount,
                    tax: priced.tax,
                    total: priced.total,
                    notes: cmd.notes,
                    deadline: cmd.deadline,
                    design_file_url: cmd.design_file_url.filter(|url| !url.is_empty()),
                    estimated_minutes: priced.estimated_minutes,
                },
            )
            .await?;

        self.orders_repo
            .insert_items(&mut *tx, order.id, &priced.items)
            .await?;

        self.inventory_service
            .consume_for_order(&mut *tx, &priced.usage, order.id, &order_number, acting_user_id)
            .await?;

        self.crm_service
            .record_purchase(&mut *tx, customer.id, priced.total)
            .await?;

        let detail = self.load_detail(&mut *tx, order.id).await?;

        tx.commit().await?;

        tracing::info!(
            order_number = %detail.header.order_number,
            total = detail.header.total,
            lines = detail.items.len(),
            "🧾 Pedido registrado"
        );

        Ok(detail)
    }

    /// Orçamento: catálogo, preço e pré-checagem de estoque, sem gravar nada.
    pub async fn quote(
        &self,
        lines: &[LineRequest],
        discount: i64,
        tax: i64,
    ) -> Result<OrderQuote, AppError> {
        let priced = self.price(lines, discount, tax).await?;
        let materials = self.inventory_service.precheck(&priced.usage).await?;

        Ok(OrderQuote {
            lines: priced
                .items
                .iter()
                .map(|item| QuoteLine {
                    product_id: item.product_id,
                    variant_id: item.variant_id,
                    product_name: item.product_name.clone(),
                    variant_name: item.variant_name.clone(),
                    pricing_unit: item.pricing_unit,
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                    finishing_cost: item.finishing_cost,
                    subtotal: item.subtotal,
                    estimated_minutes: item.estimated_minutes,
                })
                .collect(),
            subtotal: priced.subtotal,
            discount: priced.discount,
            tax: priced.tax,
            total: priced.total,
            estimated_minutes: priced.estimated_minutes,
            fulfillable: materials.iter().all(|m| m.sufficient),
            materials,
        })
    }

    // =========================================================================
    //  CONSULTA E STATUS
    // =========================================================================

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetail, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.load_detail(&mut conn, order_id).await
    }

    /// Avança um passo na esteira. A linha do pedido fica travada até o commit.
    pub async fn advance_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        settlement: Option<PaymentMethod>,
    ) -> Result<OrderDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .orders_repo
            .find_order_for_update(&mut *tx, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("order".into()))?;

        let payment_method =
            plan_status_change(order.status, order.payment_method, target, settlement)?;

        self.orders_repo
            .update_status(&mut *tx, order_id, target, payment_method)
            .await?;

        let detail = self.load_detail(&mut *tx, order_id).await?;
        tx.commit().await?;

        tracing::info!(
            order_number = %detail.header.order_number,
            from = ?order.status,
            to = ?target,
            "Status do pedido atualizado"
        );

        Ok(detail)
    }

    async fn load_detail(
        &self,
        conn: &mut PgConnection,
        order_id: Uuid,
    ) -> Result<OrderDetail, AppError> {
        let header: Order = self
            .orders_repo
            .find_order(&mut *conn, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("order".into()))?;

        let items = self.orders_repo.list_order_items(&mut *conn, order_id).await?;

        let customer: Option<Customer> = match header.customer_id {
            Some(customer_id) => self.crm_service.find_customer(&mut *conn, customer_id).await?,
            None => None,
        };

        Ok(OrderDetail { header, customer, items })
    }
}
