//! Checkout orders.
//!
//! An order is written once, pending/pending, when the shopper starts paying.
//! Gateway results flip its payment status; staff flip its order status.

use super::{decode_all, ServiceError, ServiceResult};
use crate::types::{
    generate_order_ref, items_total, CustomerInfo, Order, OrderItem, OrderStatus, PaymentMethod,
    PaymentStatus, CURRENCY,
};
use serde_json::json;
use std::sync::Arc;
use wedding_core::document::{encode, Collection, DocumentStore};
use wedding_core::environment::Clock;
use wedding_runtime::metrics::CheckoutMetrics;

/// Default page size for the admin order list
pub const DEFAULT_LIST_LIMIT: usize = 50;

const RESOURCE: &str = "Order";

/// Input for [`OrderService::create`]
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Buyer
    pub customer_info: CustomerInfo,
    /// Items snapshot
    pub items: Vec<OrderItem>,
    /// Gateway that will take the money
    pub payment_method: PaymentMethod,
}

/// Order records in the `orders` collection
#[derive(Clone)]
pub struct OrderService {
    docs: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    /// Create the service over a document store
    #[must_use]
    pub fn new(docs: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { docs, clock }
    }

    /// Validate and store a new pending order.
    ///
    /// The total is computed here from the items; callers cannot set it.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a blank contact field, an empty or
    /// zero-quantity item list; [`ServiceError::Document`] if storing fails.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len(), method = %request.payment_method))]
    pub async fn create(&self, request: NewOrder) -> ServiceResult<Order> {
        if let Some(field) = request.customer_info.first_missing_contact_field() {
            return Err(ServiceError::validation(format!(
                "Missing required customer information: {field}"
            )));
        }
        if request.items.is_empty() {
            return Err(ServiceError::validation("Order must contain at least one item"));
        }
        if request.items.iter().any(|item| item.quantity == 0) {
            return Err(ServiceError::validation("Item quantities must be at least 1"));
        }

        let now = self.clock.now();
        let order_ref = generate_order_ref(now, &mut rand::thread_rng());

        let mut order = Order {
            id: String::new(),
            order_id: order_ref,
            total_amount: items_total(&request.items),
            customer_info: request.customer_info,
            items: request.items,
            currency: CURRENCY.to_string(),
            payment_method: request.payment_method,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            payment_id: None,
            notes: None,
        };

        order.id = self.docs.create(Collection::Orders, encode(&order)?).await?;
        CheckoutMetrics::record_order_created();
        tracing::info!(id = %order.id, order_ref = %order.order_id, total = order.total_amount, "Order created");
        Ok(order)
    }

    /// Set the payment status and gateway payment id.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the order does not exist.
    pub async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        payment_id: Option<&str>,
    ) -> ServiceResult<()> {
        self.patch(
            id,
            json!({
                "paymentStatus": status,
                "paymentId": payment_id,
                "updatedAt": self.clock.now(),
            }),
        )
        .await
    }

    /// Record a gateway result in one write.
    ///
    /// Success marks the order completed and confirmed; anything else marks
    /// the payment failed and leaves the order status alone.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the order does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn settle_payment(&self, id: &str, succeeded: bool, payment_id: &str) -> ServiceResult<()> {
        let patch = if succeeded {
            json!({
                "paymentStatus": PaymentStatus::Completed,
                "orderStatus": OrderStatus::Confirmed,
                "paymentId": payment_id,
                "updatedAt": self.clock.now(),
            })
        } else {
            json!({
                "paymentStatus": PaymentStatus::Failed,
                "paymentId": payment_id,
                "updatedAt": self.clock.now(),
            })
        };
        self.patch(id, patch).await?;
        tracing::info!(succeeded, "Payment settled");
        Ok(())
    }

    /// Move an order to any fulfilment status.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the order does not exist.
    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> ServiceResult<()> {
        self.patch(
            id,
            json!({ "orderStatus": status, "updatedAt": self.clock.now() }),
        )
        .await
    }

    /// Replace the staff notes.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the order does not exist.
    pub async fn add_notes(&self, id: &str, notes: &str) -> ServiceResult<()> {
        self.patch(id, json!({ "notes": notes, "updatedAt": self.clock.now() }))
            .await
    }

    /// Fetch one order by document id.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails or the record is malformed.
    pub async fn get(&self, id: &str) -> ServiceResult<Option<Order>> {
        match self.docs.get(Collection::Orders, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Orders placed with an email, newest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn by_email(&self, email: &str) -> ServiceResult<Vec<Order>> {
        let email = email.trim();
        let mut orders = self.newest_first().await?;
        orders.retain(|order| order.customer_info.email.eq_ignore_ascii_case(email));
        Ok(orders)
    }

    /// Most recent orders, newest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn all(&self, limit: usize) -> ServiceResult<Vec<Order>> {
        let mut orders = self.newest_first().await?;
        orders.truncate(limit);
        Ok(orders)
    }

    /// Orders still awaiting review, newest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn pending(&self) -> ServiceResult<Vec<Order>> {
        let mut orders = self.newest_first().await?;
        orders.retain(|order| order.order_status == OrderStatus::Pending);
        Ok(orders)
    }

    async fn newest_first(&self) -> ServiceResult<Vec<Order>> {
        let docs = self.docs.list(Collection::Orders).await?;
        let mut orders: Vec<Order> = decode_all(RESOURCE, docs);
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn patch(&self, id: &str, patch: serde_json::Value) -> ServiceResult<()> {
        self.docs
            .update(Collection::Orders, id, patch)
            .await
            .map_err(|err| ServiceError::from_document(RESOURCE, err))
    }
}
