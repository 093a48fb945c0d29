//! Direct Aso-Ebi orders: placed by form, paid offline, tracked by staff.

use super::{decode_all, ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::{Arc, LazyLock};
use wedding_core::document::{encode, Collection, DocumentStore};
use wedding_core::environment::Clock;

const RESOURCE: &str = "AsoebiOrder";

const MIN_PHONE_LEN: usize = 10;

#[allow(clippy::expect_used)] // constant pattern
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Fulfilment state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsoebiStatus {
    /// Not yet reviewed
    Pending,
    /// Accepted
    Confirmed,
    /// Being sewn
    Processing,
    /// Handed over
    Delivered,
    /// Called off
    Cancelled,
}

/// Offline payment state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsoebiPaymentStatus {
    /// Awaiting transfer
    Pending,
    /// Money received
    Paid,
    /// Transfer bounced
    Failed,
}

/// Line on a direct order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsoebiLine {
    /// Catalog item id
    pub item_id: String,
    /// Item name
    pub item_name: String,
    /// Units
    pub quantity: u32,
    /// Size
    pub size: String,
    /// Colour
    pub color: String,
    /// Unit price in kobo
    pub price: i64,
}

/// A stored direct order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsoebiOrder {
    /// Document id
    #[serde(default)]
    pub id: String,
    /// Buyer name
    pub customer_name: String,
    /// Buyer email
    pub customer_email: String,
    /// Buyer phone
    pub customer_phone: String,
    /// Lines
    pub items: Vec<AsoebiLine>,
    /// Total in kobo, as submitted
    pub total_amount: i64,
    /// Free-form address
    pub delivery_address: String,
    /// Placed at
    pub order_date: DateTime<Utc>,
    /// Fulfilment
    pub status: AsoebiStatus,
    /// Payment
    pub payment_status: AsoebiPaymentStatus,
    /// Staff notes
    #[serde(default)]
    pub notes: String,
}

/// Order form submission
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsoebiOrder {
    /// Buyer name
    #[serde(default)]
    pub customer_name: String,
    /// Buyer email
    #[serde(default)]
    pub customer_email: String,
    /// Buyer phone
    #[serde(default)]
    pub customer_phone: String,
    /// Lines
    #[serde(default)]
    pub items: Vec<AsoebiLine>,
    /// Total in kobo
    #[serde(default)]
    pub total_amount: i64,
    /// Free-form address
    #[serde(default)]
    pub delivery_address: String,
    /// Buyer notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Staff changes; at least one field must be set
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsoebiUpdate {
    /// New fulfilment state
    #[serde(default)]
    pub status: Option<AsoebiStatus>,
    /// New payment state
    #[serde(default)]
    pub payment_status: Option<AsoebiPaymentStatus>,
    /// Replacement notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Whether an email has the `local@domain.tld` shape.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Direct order records in the `asoebi_orders` collection
#[derive(Clone)]
pub struct AsoebiService {
    docs: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl AsoebiService {
    /// Create the service over a document store
    #[must_use]
    pub fn new(docs: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { docs, clock }
    }

    /// Validate and store a direct order, pending/pending.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a missing field, an empty item
    /// list, a non-positive total, a malformed email or a short phone.
    #[tracing::instrument(skip(self, order), fields(items = order.items.len()))]
    pub async fn create(&self, order: NewAsoebiOrder) -> ServiceResult<AsoebiOrder> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&order.customer_name)
            || blank(&order.customer_email)
            || blank(&order.customer_phone)
            || blank(&order.delivery_address)
            || order.items.is_empty()
            || order.total_amount <= 0
        {
            return Err(ServiceError::validation(
                "Missing required fields: customerName, customerEmail, customerPhone, items, totalAmount, deliveryAddress",
            ));
        }
        if !is_valid_email(&order.customer_email) {
            return Err(ServiceError::validation("Invalid email format"));
        }
        if order.customer_phone.chars().count() < MIN_PHONE_LEN {
            return Err(ServiceError::validation("Invalid phone number"));
        }

        let mut record = AsoebiOrder {
            id: String::new(),
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            items: order.items,
            total_amount: order.total_amount,
            delivery_address: order.delivery_address,
            order_date: self.clock.now(),
            status: AsoebiStatus::Pending,
            payment_status: AsoebiPaymentStatus::Pending,
            notes: order.notes.unwrap_or_default(),
        };
        record.id = self.docs.create(Collection::AsoebiOrders, encode(&record)?).await?;
        tracing::info!(id = %record.id, "Aso-Ebi order placed");
        Ok(record)
    }

    /// Orders, optionally with one status, newest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Document`] if the read fails.
    pub async fn list(&self, status: Option<AsoebiStatus>) -> ServiceResult<Vec<AsoebiOrder>> {
        let docs = self.docs.list(Collection::AsoebiOrders).await?;
        let mut orders: Vec<AsoebiOrder> = decode_all(RESOURCE, docs);
        if let Some(status) = status {
            orders.retain(|order| order.status == status);
        }
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    /// Apply staff changes.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] when nothing is set;
    /// [`ServiceError::NotFound`] if the order does not exist.
    pub async fn update(&self, id: &str, update: AsoebiUpdate) -> ServiceResult<()> {
        let mut patch = Map::new();
        if let Some(status) = update.status {
            patch.insert("status".into(), json!(status));
        }
        if let Some(payment_status) = update.payment_status {
            patch.insert("paymentStatus".into(), json!(payment_status));
        }
        if let Some(notes) = update.notes {
            patch.insert("notes".into(), Value::String(notes));
        }
        if patch.is_empty() {
            return Err(ServiceError::validation("No valid fields to update"));
        }

        self.docs
            .update(Collection::AsoebiOrders, id, Value::Object(patch))
            .await
            .map_err(|err| ServiceError::from_document(RESOURCE, err))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wedding_testing::{test_clock, InMemoryDocumentStore};

    fn form() -> NewAsoebiOrder {
        NewAsoebiOrder {
            customer_name: "Ada Obi".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: "08030000000".into(),
            items: vec![AsoebiLine {
                item_id: "5".into(),
                item_name: "Gele & Ipele Set".into(),
                quantity: 2,
                size: "One Size".into(),
                color: "Gold".into(),
                price: 1_500_000,
            }],
            total_amount: 3_000_000,
            delivery_address: "1 Marina, Lagos".into(),
            notes: None,
        }
    }

    fn service() -> AsoebiService {
        AsoebiService::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(test_clock()))
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@c.d"));
    }

    #[tokio::test]
    async fn create_starts_pending() {
        let order = service().create(form()).await.unwrap();
        assert_eq!(order.status, AsoebiStatus::Pending);
        assert_eq!(order.payment_status, AsoebiPaymentStatus::Pending);
        assert_eq!(order.notes, "");
        assert_eq!(order.order_date, test_clock().now());
    }

    #[tokio::test]
    async fn create_validation() {
        let asoebi = service();
        let reject = |order: NewAsoebiOrder| {
            let asoebi = asoebi.clone();
            async move { asoebi.create(order).await.unwrap_err().to_string() }
        };

        let mut no_items = form();
        no_items.items.clear();
        assert!(reject(no_items).await.starts_with("Missing required fields"));

        let mut zero_total = form();
        zero_total.total_amount = 0;
        assert!(reject(zero_total).await.starts_with("Missing required fields"));

        let mut bad_email = form();
        bad_email.customer_email = "ada-at-example".into();
        assert_eq!(reject(bad_email).await, "Invalid email format");

        let mut short_phone = form();
        short_phone.customer_phone = "0803".into();
        assert_eq!(reject(short_phone).await, "Invalid phone number");
    }

    #[tokio::test]
    async fn update_and_status_filter() {
        let asoebi = service();
        let first = asoebi.create(form()).await.unwrap();
        let _second = asoebi.create(form()).await.unwrap();

        assert!(matches!(
            asoebi.update(&first.id, AsoebiUpdate::default()).await,
            Err(ServiceError::Validation(ref m)) if m == "No valid fields to update"
        ));

        asoebi
            .update(
                &first.id,
                AsoebiUpdate {
                    status: Some(AsoebiStatus::Confirmed),
                    payment_status: Some(AsoebiPaymentStatus::Paid),
                    notes: Some("paid by transfer".into()),
                },
            )
            .await
            .unwrap();

        let confirmed = asoebi.list(Some(AsoebiStatus::Confirmed)).await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].payment_status, AsoebiPaymentStatus::Paid);
        assert_eq!(confirmed[0].notes, "paid by transfer");
        assert_eq!(asoebi.list(None).await.unwrap().len(), 2);

        assert!(matches!(
            asoebi
                .update(
                    "missing",
                    AsoebiUpdate {
                        notes: Some(String::new()),
                        ..AsoebiUpdate::default()
                    }
                )
                .await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
