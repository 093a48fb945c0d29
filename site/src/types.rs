//! Domain types shared by the store, checkout and order services.
//!
//! Money is always an integer count of kobo (1 NGN = 100 kobo).

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Money
// ============================================================================

/// Kobo per naira.
pub const KOBO_PER_NAIRA: i64 = 100;

/// Order currency.
pub const CURRENCY: &str = "NGN";

/// Convert whole naira to kobo.
#[must_use]
pub const fn naira(amount: i64) -> i64 {
    amount * KOBO_PER_NAIRA
}

/// Render a kobo amount as `₦45,000.00`.
#[must_use]
pub fn format_naira(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    let whole = (abs / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}₦{grouped}.{:02}", abs % 100)
}

// ============================================================================
// Order enums
// ============================================================================

/// Which gateway pays for an order.
///
/// Stored as `stripe` / `paypal` so existing order documents keep parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Card gateway
    #[serde(rename = "stripe", alias = "card")]
    Card,
    /// Wallet gateway
    #[serde(rename = "paypal", alias = "wallet")]
    Wallet,
}

impl PaymentMethod {
    /// Stored name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "stripe",
            Self::Wallet => "paypal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No money taken yet
    Pending,
    /// Gateway reported success
    Completed,
    /// Gateway reported failure
    Failed,
    /// Money returned
    Refunded,
}

/// Fulfilment state of an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting payment or review
    Pending,
    /// Paid and accepted
    Confirmed,
    /// Being prepared
    Processing,
    /// On its way
    Shipped,
    /// Handed over
    Delivered,
    /// Called off
    Cancelled,
}

// ============================================================================
// Customer
// ============================================================================

fn default_country() -> String {
    "Nigeria".to_string()
}

/// Delivery address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street and house number
    #[serde(default)]
    pub street: String,
    /// City
    #[serde(default)]
    pub city: String,
    /// State
    #[serde(default)]
    pub state: String,
    /// Postal code (optional in Nigeria)
    #[serde(default)]
    pub zip_code: String,
    /// Country
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: default_country(),
        }
    }
}

/// Buyer contact details collected in the first checkout step
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone: String,
    /// Delivery address
    #[serde(default)]
    pub address: Address,
}

impl CustomerInfo {
    /// The first required field that is blank, by its wire name.
    #[must_use]
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("street", &self.address.street),
            ("city", &self.address.city),
            ("state", &self.address.state),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }

    /// The first blank contact field, ignoring the address.
    #[must_use]
    pub fn first_missing_contact_field(&self) -> Option<&'static str> {
        self.first_missing_field()
            .filter(|field| matches!(*field, "firstName" | "lastName" | "email" | "phone"))
    }

    /// `First Last`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Line item snapshot stored on an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Catalog item id
    pub id: u32,
    /// Item name at purchase time
    pub name: String,
    /// Price per unit in kobo
    pub unit_price: i64,
    /// Units bought
    pub quantity: u32,
    /// Chosen size
    pub size: String,
    /// Chosen colour
    pub color: String,
    /// Catalog category
    #[serde(default)]
    pub category: String,
    /// Product image
    #[serde(default)]
    pub image: String,
}

impl OrderItem {
    /// `unit_price * quantity`
    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// Sum of line totals in kobo.
#[must_use]
pub fn items_total(items: &[OrderItem]) -> i64 {
    items.iter().map(OrderItem::line_total).sum()
}

/// A stored Aso-Ebi checkout order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Document id
    #[serde(default)]
    pub id: String,
    /// Human reference (`ORD-...`)
    pub order_id: String,
    /// Buyer
    pub customer_info: CustomerInfo,
    /// Items snapshot
    pub items: Vec<OrderItem>,
    /// Total in kobo
    pub total_amount: i64,
    /// Always `NGN`
    pub currency: String,
    /// Gateway used
    pub payment_method: PaymentMethod,
    /// Payment state
    pub payment_status: PaymentStatus,
    /// Fulfilment state
    pub order_status: OrderStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
    /// Gateway payment id once settled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Staff notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Build a human order reference: `ORD-{epochMillis}-{9 base36 chars}`.
#[must_use]
pub fn generate_order_ref<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..9)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("ORD-{}-{suffix}", now.timestamp_millis())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn format_naira_groups_thousands() {
        assert_eq!(format_naira(naira(45_000)), "₦45,000.00");
        assert_eq!(format_naira(123_456_789), "₦1,234,567.89");
        assert_eq!(format_naira(5), "₦0.05");
        assert_eq!(format_naira(-naira(100)), "-₦100.00");
    }

    #[test]
    fn payment_method_uses_stored_names() {
        assert_eq!(serde_json::to_value(PaymentMethod::Card).unwrap(), json!("stripe"));
        assert_eq!(serde_json::to_value(PaymentMethod::Wallet).unwrap(), json!("paypal"));
        let wallet: PaymentMethod = serde_json::from_value(json!("wallet")).unwrap();
        assert_eq!(wallet, PaymentMethod::Wallet);
    }

    #[test]
    fn first_missing_field_follows_form_order() {
        let mut info = CustomerInfo {
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            email: "ada@example.com".into(),
            phone: String::new(),
            address: Address::default(),
        };
        assert_eq!(info.first_missing_field(), Some("phone"));

        info.phone = "08030000000".into();
        assert_eq!(info.first_missing_field(), Some("street"));
        assert_eq!(info.first_missing_contact_field(), None);

        info.address.street = "1 Marina".into();
        info.address.city = "Lagos".into();
        info.address.state = "   ".into();
        assert_eq!(info.first_missing_field(), Some("state"));
    }

    #[test]
    fn address_country_defaults_to_nigeria() {
        let address: Address = serde_json::from_value(json!({ "street": "1 Marina" })).unwrap();
        assert_eq!(address.country, "Nigeria");
    }

    #[test]
    fn order_ref_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = DateTime::parse_from_rfc3339("2025-06-14T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let reference = generate_order_ref(now, &mut rng);

        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
