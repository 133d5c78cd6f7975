use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CheckoutError;
use crate::models::checkout::{CheckoutRequest, Identity, SubmissionOutcome};

mod http;
pub use http::ApiClient;

/// A validated discount grant returned by the pricing authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponGrant {
    pub coupon_ref: String,
    pub discount: Decimal,
    pub prize_name: Option<String>,
}

/// Remote authority over coupon eligibility and discount amounts.
///
/// The cart subtotal travels with the code; the authority independently
/// recomputes eligibility against its own rules (minimum-spend thresholds,
/// usage limits) and is authoritative over the discount it grants.
#[async_trait]
pub trait PricingAuthority: Send + Sync {
    async fn validate_coupon(
        &self,
        identity: &Identity,
        code: &str,
        cart_subtotal: Decimal,
    ) -> Result<CouponGrant, CheckoutError>;
}

/// Remote authority that accepts and persists a finalized checkout request.
///
/// A rejection is an `Ok(SubmissionOutcome::Rejected)` — the order was
/// refused, but the round-trip itself worked. Transport trouble is the
/// `Err` path.
#[async_trait]
pub trait OrderAuthority: Send + Sync {
    async fn submit_order(
        &self,
        identity: &Identity,
        request: &CheckoutRequest,
    ) -> Result<SubmissionOutcome, CheckoutError>;
}
