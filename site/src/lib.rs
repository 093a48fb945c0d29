//! Wedding website back end.
//!
//! Each shopper session is one [`wedding_runtime::Store`] holding the Aso-Ebi
//! cart and the three-step checkout:
//!
//! ```text
//! CustomerInfo ──► PaymentMethod ──► Payment
//!                                      │
//!                      orders.create ──┤
//!                                      ├── card:   create intent ► confirm
//!                                      └── wallet: create order  ► approve ► capture
//! ```
//!
//! Gateway and storage calls run as effects; their results come back to the
//! reducer as actions. Everything else (RSVPs, gallery, headers, comments,
//! table groups, direct Aso-Ebi orders) is plain CRUD over the
//! [`wedding_core::document::DocumentStore`].

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod server;
pub mod services;
pub mod session;
pub mod sessions;
pub mod storage;
pub mod types;

pub use config::Config;
pub use server::{build_router, AppState};
