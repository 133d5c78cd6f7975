use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::CheckoutError;
use crate::models::cart::LineItem;

/// Authenticated customer handle supplied by the session layer.
///
/// The engine never stores or refreshes tokens; it only checks that one is
/// present and forwards it to the remote authorities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub bearer_token: String,
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        !self.bearer_token.trim().is_empty()
    }
}

/// Closed set of payment methods the storefront accepts.
///
/// Card is part of the set so it parses and displays, but checkout gates it
/// behind a deliberate not-implemented failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Deposit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Deposit => "deposit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "deposit" => Ok(PaymentMethod::Deposit),
            other => Err(CheckoutError::UnsupportedPaymentMethod(other.to_string())),
        }
    }
}

/// Totals derived from the current cart and coupon state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub discount_amount: Decimal,
    pub grand_total: Decimal,
}

/// Immutable snapshot of the order intent submitted for creation.
///
/// The items are a deep copy taken at build time, so later cart mutations
/// never alter an in-flight request. Constructed only at the moment of a
/// checkout attempt and discarded once the submission resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutRequest {
    /// Client-generated correlation id for logging; the server never sees it
    /// as an identifier and assigns its own order id.
    pub request_id: Uuid,
    pub items: Vec<LineItem>,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub discount_amount: Decimal,
    pub grand_total: Decimal,
    pub coupon_ref: Option<String>,
    pub customer_id: String,
}

/// Verdict of the order authority on a submitted checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    Accepted { order_id: String },
    Rejected { reason: String },
}
