//! HTTP handlers shared by every service built on this crate.

pub mod health;

pub use health::{health_check, readiness, CheckBody, ReadinessBody};
