//! Shared harness for checkout engine integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use storefront_checkout::{
    AppConfig, CheckoutEngine, CheckoutError, CouponGrant, Event, EventSender, Identity,
    MemoryStore, PricingAuthority,
};

/// Pricing authority stub with scripted responses, consumed in order.
pub struct ScriptedPricing {
    responses: Mutex<Vec<Result<CouponGrant, CheckoutError>>>,
}

impl ScriptedPricing {
    pub fn new(mut responses: Vec<Result<CouponGrant, CheckoutError>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl PricingAuthority for ScriptedPricing {
    async fn validate_coupon(
        &self,
        _identity: &Identity,
        _code: &str,
        _cart_subtotal: Decimal,
    ) -> Result<CouponGrant, CheckoutError> {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .expect("no scripted pricing response left")
    }
}

pub struct TestHarness {
    pub engine: CheckoutEngine,
    pub store: Arc<MemoryStore>,
    pub events: mpsc::Receiver<Event>,
}

/// Builds an engine over a fresh in-memory store with the default config
/// (350.00 delivery fee) and the given scripted pricing responses.
pub fn harness(responses: Vec<Result<CouponGrant, CheckoutError>>) -> TestHarness {
    harness_on(Arc::new(MemoryStore::new()), responses)
}

pub fn harness_on(
    store: Arc<MemoryStore>,
    responses: Vec<Result<CouponGrant, CheckoutError>>,
) -> TestHarness {
    let (tx, rx) = mpsc::channel(64);
    let engine = CheckoutEngine::new(
        store.clone(),
        Arc::new(ScriptedPricing::new(responses)),
        EventSender::new(tx),
        Arc::new(AppConfig::default()),
    );
    TestHarness {
        engine,
        store,
        events: rx,
    }
}

pub fn grant(
    discount: Decimal,
    coupon_ref: &str,
    prize_name: &str,
) -> Result<CouponGrant, CheckoutError> {
    Ok(CouponGrant {
        coupon_ref: coupon_ref.to_string(),
        discount,
        prize_name: Some(prize_name.to_string()),
    })
}

pub fn identity() -> Identity {
    Identity {
        user_id: "u-1".into(),
        name: "Test Customer".into(),
        email: "test@example.com".into(),
        bearer_token: "token-abc".into(),
    }
}
