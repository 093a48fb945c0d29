//! # Wedding Payment Gateways
//!
//! HTTP clients for the two payment rails used at checkout:
//!
//! - [`card`]: a Stripe-compatible payment-intent API (create, confirm, retrieve)
//! - [`wallet`]: a PayPal-compatible orders API (create with approval link, capture)
//!
//! Both rails are exposed as object-safe traits so the checkout can be driven
//! against test doubles.
//!
//! ## Example
//!
//! ```no_run
//! use wedding_gateways::{CardGateway, CreateIntent, StripeClient};
//!
//! # async fn example() -> Result<(), wedding_gateways::GatewayError> {
//! let card = StripeClient::new("sk_test_...");
//! let intent = card
//!     .create_intent(CreateIntent {
//!         amount_minor: 4_500_000,
//!         currency: "ngn".to_string(),
//!         order_id: "order-doc-id".to_string(),
//!     })
//!     .await?;
//! println!("client secret: {}", intent.client_secret);
//! # Ok(())
//! # }
//! ```

pub mod card;
pub mod error;
pub mod wallet;

pub use card::{CardGateway, CreateIntent, IntentStatus, PaymentIntent, StripeClient};
pub use error::GatewayError;
pub use wallet::{
    CaptureStatus, CreateWalletOrder, PayPalClient, WalletGateway, WalletMode, WalletOrder,
};
