//! HTTP API handlers, grouped by resource.
//!
//! - Catalog, cart and checkout: scoped to the shopper session in `X-Session-ID`
//! - Payments: gateway status callbacks
//! - Orders, RSVPs, content and Aso-Ebi orders: admin and guest CRUD

use serde::{Deserialize, Serialize};

pub mod asoebi;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod content;
pub mod orders;
pub mod payments;
pub mod rsvps;

/// `{ "success": true }`
#[derive(Debug, Serialize)]
pub struct Success {
    /// Always true; failures render as error bodies
    pub success: bool,
}

impl Success {
    /// The success body
    #[must_use]
    pub const fn ok() -> Self {
        Self { success: true }
    }
}

/// `?id=` for deletes
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    /// Target document id
    #[serde(default)]
    pub id: Option<String>,
}

impl IdQuery {
    /// The id, or a 400 when it is missing.
    ///
    /// # Errors
    ///
    /// Bad request if `id` is absent or blank.
    pub fn require(self) -> Result<String, wedding_web::AppError> {
        self.id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| wedding_web::AppError::bad_request("id is required"))
    }
}
