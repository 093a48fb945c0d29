//! Gateway status callbacks.
//!
//! The browser reports the gateway's verdict for an order after the hosted
//! payment step; the verdict is written onto the order as-is.

use super::{require, OrderService, ServiceResult};
use serde::Deserialize;
use wedding_gateways::{CaptureStatus, IntentStatus};

/// Card gateway callback body
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCallback {
    /// Payment intent id
    pub payment_intent_id: String,
    /// Order document id
    pub order_id: String,
    /// Intent status as reported (`succeeded`, ...)
    pub status: String,
}

/// Wallet gateway callback body
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCallback {
    /// Gateway order id
    pub paypal_order_id: String,
    /// Order document id
    pub order_id: String,
    /// Capture status as reported (`COMPLETED`, ...)
    pub status: String,
}

/// Outcome recorded by a callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// Order completed and confirmed
    Paid,
    /// Payment marked failed
    Failed,
}

impl Settlement {
    const fn from_success(succeeded: bool) -> Self {
        if succeeded {
            Self::Paid
        } else {
            Self::Failed
        }
    }
}

/// Applies gateway callbacks to orders
#[derive(Clone)]
pub struct PaymentCallbacks {
    orders: OrderService,
}

impl PaymentCallbacks {
    /// Wrap the order service
    #[must_use]
    pub const fn new(orders: OrderService) -> Self {
        Self { orders }
    }

    /// Record a card gateway verdict.
    ///
    /// # Errors
    ///
    /// [`super::ServiceError::Validation`] for blank ids;
    /// [`super::ServiceError::NotFound`] if the order does not exist.
    #[tracing::instrument(skip(self, callback), fields(order_id = %callback.order_id))]
    pub async fn card(&self, callback: CardCallback) -> ServiceResult<Settlement> {
        require("orderId", &callback.order_id)?;
        require("paymentIntentId", &callback.payment_intent_id)?;
        let succeeded = IntentStatus::parse(&callback.status).is_success();
        self.orders
            .settle_payment(&callback.order_id, succeeded, &callback.payment_intent_id)
            .await?;
        Ok(Settlement::from_success(succeeded))
    }

    /// Record a wallet gateway verdict.
    ///
    /// # Errors
    ///
    /// [`super::ServiceError::Validation`] for blank ids;
    /// [`super::ServiceError::NotFound`] if the order does not exist.
    #[tracing::instrument(skip(self, callback), fields(order_id = %callback.order_id))]
    pub async fn wallet(&self, callback: WalletCallback) -> ServiceResult<Settlement> {
        require("orderId", &callback.order_id)?;
        require("paypalOrderId", &callback.paypal_order_id)?;
        let succeeded = CaptureStatus::parse(&callback.status).is_success();
        self.orders
            .settle_payment(&callback.order_id, succeeded, &callback.paypal_order_id)
            .await?;
        Ok(Settlement::from_success(succeeded))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::orders::tests::{customer, item};
    use crate::services::orders::NewOrder;
    use crate::services::ServiceError;
    use crate::types::{OrderStatus, PaymentMethod, PaymentStatus};
    use std::sync::Arc;
    use wedding_testing::{test_clock, InMemoryDocumentStore};

    async fn setup() -> (PaymentCallbacks, OrderService, String) {
        let orders = OrderService::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(test_clock()));
        let order = orders
            .create(NewOrder {
                customer_info: customer(),
                items: vec![item(1)],
                payment_method: PaymentMethod::Card,
            })
            .await
            .unwrap();
        (PaymentCallbacks::new(orders.clone()), orders, order.id)
    }

    #[tokio::test]
    async fn card_success_confirms_the_order() {
        let (callbacks, orders, id) = setup().await;
        let outcome = callbacks
            .card(CardCallback {
                payment_intent_id: "pi_9".into(),
                order_id: id.clone(),
                status: "succeeded".into(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Settlement::Paid);

        let order = orders.get(&id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(order.order_status, OrderStatus::Confirmed);
        assert_eq!(order.payment_id.as_deref(), Some("pi_9"));
    }

    #[tokio::test]
    async fn wallet_anything_but_completed_fails() {
        let (callbacks, orders, id) = setup().await;
        let callback = |status: &str| WalletCallback {
            paypal_order_id: "WAL-1".into(),
            order_id: id.clone(),
            status: status.into(),
        };

        assert_eq!(callbacks.wallet(callback("PENDING")).await.unwrap(), Settlement::Failed);
        let order = orders.get(&id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.order_status, OrderStatus::Pending);

        assert_eq!(callbacks.wallet(callback("completed")).await.unwrap(), Settlement::Paid);
    }

    #[tokio::test]
    async fn unknown_orders_are_not_found() {
        let (callbacks, _, _) = setup().await;
        let err = callbacks
            .card(CardCallback {
                payment_intent_id: "pi_1".into(),
                order_id: "ghost".into(),
                status: "succeeded".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
