//! Storefront Checkout Library
//!
//! This crate provides the cart and checkout core of the storefront client:
//! line-item management with a durable write-through mirror, coupon
//! application against the remote pricing authority, totals computation,
//! and the order submission lifecycle (cash, card, and bank-deposit
//! branching). All persistence and business authority live behind remote
//! services; this crate owns the client-side state machine in front of them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod authority;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod invoice;
pub mod models;
pub mod store;

pub use authority::{ApiClient, CouponGrant, OrderAuthority, PricingAuthority};
pub use config::{init_tracing, load_config, AppConfig, DepositInstructions};
pub use engine::{AppliedDiscount, CheckoutEngine, CheckoutPhase};
pub use errors::CheckoutError;
pub use events::{Event, EventSender};
pub use invoice::{Invoice, InvoiceLine};
pub use models::cart::{Cart, CouponApplication, LineItem};
pub use models::checkout::{
    CartTotals, CheckoutRequest, Identity, PaymentMethod, SubmissionOutcome,
};
pub use store::{DurableStore, FileStore, MemoryStore, CART_STORAGE_KEY};
