use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::authority::PricingAuthority;
use crate::config::AppConfig;
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};
use crate::models::cart::{Cart, CouponApplication, LineItem};
use crate::models::checkout::{
    CartTotals, CheckoutRequest, Identity, PaymentMethod, SubmissionOutcome,
};
use crate::store::{DurableStore, CART_STORAGE_KEY};

/// Where the engine sits in the checkout lifecycle.
///
/// `CheckoutPending` and `AwaitingDepositAck` are first-class states so the
/// shell (and tests) can assert on them instead of tracking loading flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Shopping,
    CheckoutPending,
    AwaitingDepositAck,
}

/// Discount feedback returned after a successful coupon application, for
/// the shell to present.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscount {
    pub discount: Decimal,
    pub prize_name: Option<String>,
}

/// Cart and checkout engine for the storefront client.
///
/// Owns the shopping cart, computes totals, applies and removes coupons via
/// the pricing authority, and produces the immutable checkout request the
/// shell hands to the order authority. Single-threaded and event-driven:
/// operations are invoked from UI handlers or network-completion callbacks,
/// never in parallel.
///
/// Every cart mutation is mirrored to the durable store; the in-memory cart
/// stays the source of truth, and the mirror is read only at construction.
pub struct CheckoutEngine {
    cart: Cart,
    coupon: Option<CouponApplication>,
    phase: CheckoutPhase,
    last_order_id: Option<String>,
    store: Arc<dyn DurableStore>,
    pricing: Arc<dyn PricingAuthority>,
    event_sender: EventSender,
    config: Arc<AppConfig>,
}

impl CheckoutEngine {
    /// Builds an engine, restoring any cart persisted by a previous session.
    ///
    /// A missing document starts an empty cart; an unreadable one is
    /// discarded with a warning rather than failing startup.
    pub fn new(
        store: Arc<dyn DurableStore>,
        pricing: Arc<dyn PricingAuthority>,
        event_sender: EventSender,
        config: Arc<AppConfig>,
    ) -> Self {
        let cart = match store.get(CART_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Cart>(&raw) {
                Ok(cart) => cart,
                Err(e) => {
                    warn!("Discarding unreadable persisted cart: {}", e);
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!("Failed to read persisted cart: {}", e);
                Cart::new()
            }
        };

        if !cart.is_empty() {
            info!("Restored cart with {} items", cart.len());
        }

        let engine = Self {
            cart,
            coupon: None,
            phase: CheckoutPhase::Shopping,
            last_order_id: None,
            store,
            pricing,
            event_sender,
            config,
        };
        engine.event_sender.send_or_log(Event::CartRestored {
            item_count: engine.cart.len(),
        });
        engine
    }

    pub fn items(&self) -> &[LineItem] {
        self.cart.items()
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    pub fn coupon(&self) -> Option<&CouponApplication> {
        self.coupon.as_ref()
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Server id of the most recently accepted order, if any.
    pub fn last_order_id(&self) -> Option<&str> {
        self.last_order_id.as_deref()
    }

    /// Adds one unit of a product to the cart, merging into an existing line
    /// when the product is already present. Always succeeds; the catalog is
    /// responsible for handing over valid prices.
    pub fn add_line_item(
        &mut self,
        product_id: &str,
        name: &str,
        unit_price: Decimal,
        image_ref: Option<String>,
    ) {
        let quantity = self.cart.add(product_id, name, unit_price, image_ref);
        self.persist();
        self.event_sender.send_or_log(Event::CartItemAdded {
            product_id: product_id.to_string(),
            quantity,
        });
        info!("Added {} to cart (quantity now {})", product_id, quantity);
    }

    /// Sets the quantity for a product. Zero or negative removes the line
    /// entirely; an unknown product is a no-op.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i32) {
        if quantity <= 0 {
            self.remove_line_item(product_id);
            return;
        }

        if self.cart.set_quantity(product_id, quantity as u32) {
            self.persist();
            self.event_sender.send_or_log(Event::CartItemUpdated {
                product_id: product_id.to_string(),
                quantity: quantity as u32,
            });
        }
    }

    /// Removes a product's line from the cart; a no-op when absent.
    pub fn remove_line_item(&mut self, product_id: &str) {
        if self.cart.remove(product_id) {
            self.persist();
            self.event_sender.send_or_log(Event::CartItemRemoved {
                product_id: product_id.to_string(),
            });
            info!("Removed {} from cart", product_id);
        }
    }

    /// Empties the cart and drops any active coupon.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.coupon = None;
        self.persist();
        self.event_sender.send_or_log(Event::CartCleared);
        info!("Cleared cart");
    }

    /// Validates a coupon against the pricing authority and applies the
    /// returned discount.
    ///
    /// Replace-semantics: applying while a coupon is active first drops the
    /// old one, and any failure — rejection or transport — leaves the cart
    /// with no coupon at all. A failed check is treated as "no coupon",
    /// never as an unknown state.
    #[instrument(skip(self, identity))]
    pub async fn apply_coupon(
        &mut self,
        code: &str,
        identity: Option<&Identity>,
    ) -> Result<AppliedDiscount, CheckoutError> {
        let identity = authenticated(identity)?;

        let code = code.trim();
        if code.is_empty() {
            return Err(CheckoutError::MissingCode);
        }
        let code = code.to_uppercase();

        // Discounts never stack: the old grant is gone before the round-trip.
        self.coupon = None;

        let subtotal = self.cart.subtotal();
        match self.pricing.validate_coupon(identity, &code, subtotal).await {
            Ok(grant) => {
                info!("Coupon {} applied: discount {}", code, grant.discount);
                self.coupon = Some(CouponApplication {
                    code: code.clone(),
                    discount_amount: grant.discount,
                    coupon_ref: grant.coupon_ref,
                    prize_name: grant.prize_name.clone(),
                    applied_at: Utc::now(),
                });
                self.event_sender.send_or_log(Event::CouponApplied {
                    code,
                    discount: grant.discount,
                });
                Ok(AppliedDiscount {
                    discount: grant.discount,
                    prize_name: grant.prize_name,
                })
            }
            Err(err) => {
                warn!("Coupon {} not applied: {}", code, err);
                Err(err)
            }
        }
    }

    /// Drops the active coupon. Local and unconditional; no network call.
    pub fn remove_coupon(&mut self) {
        if self.coupon.take().is_some() {
            self.event_sender.send_or_log(Event::CouponRemoved);
            info!("Coupon removed");
        }
    }

    /// Totals derived fresh from the current cart and coupon.
    ///
    /// The authority bounds discounts by the subtotal, so a discount
    /// exceeding it is an anomaly: the grand total is floored at the
    /// fee-only amount and the condition logged rather than trusted.
    pub fn compute_totals(&self) -> CartTotals {
        let subtotal = self.cart.subtotal();
        let delivery_fee = self.config.delivery_fee;
        let discount_amount = self
            .coupon
            .as_ref()
            .map(|c| c.discount_amount)
            .unwrap_or(Decimal::ZERO);

        let grand_total = if discount_amount > subtotal {
            warn!(
                "Discount {} exceeds subtotal {}; flooring grand total at the delivery fee",
                discount_amount, subtotal
            );
            delivery_fee
        } else {
            subtotal + delivery_fee - discount_amount
        };

        CartTotals {
            subtotal,
            delivery_fee,
            discount_amount,
            grand_total,
        }
    }

    /// Snapshots the current cart into an immutable checkout request.
    ///
    /// Preconditions are checked in order and the first failure wins:
    /// authentication, a non-blank address, a recognized payment method,
    /// and the card feature gate. Card payment is deliberately unsupported;
    /// the failure leaves cart and coupon untouched, like every other
    /// precondition failure here.
    ///
    /// Submission is the caller's step: hand the request to the order
    /// authority, then report the verdict via [`finalize_after_submission`].
    ///
    /// [`finalize_after_submission`]: CheckoutEngine::finalize_after_submission
    pub fn build_checkout_request(
        &mut self,
        address: &str,
        payment_method: &str,
        identity: Option<&Identity>,
    ) -> Result<CheckoutRequest, CheckoutError> {
        let identity = authenticated(identity)?;

        let address = address.trim();
        if address.is_empty() {
            return Err(CheckoutError::MissingAddress);
        }

        let payment_method = PaymentMethod::from_str(payment_method)?;
        if payment_method == PaymentMethod::Card {
            return Err(CheckoutError::NotImplemented(
                "card payment is not yet available".to_string(),
            ));
        }

        let totals = self.compute_totals();
        let request = CheckoutRequest {
            request_id: uuid::Uuid::new_v4(),
            items: self.cart.items().to_vec(),
            delivery_address: address.to_string(),
            payment_method,
            subtotal: totals.subtotal,
            delivery_fee: totals.delivery_fee,
            discount_amount: totals.discount_amount,
            grand_total: totals.grand_total,
            coupon_ref: self.coupon.as_ref().map(|c| c.coupon_ref.clone()),
            customer_id: identity.user_id.clone(),
        };

        self.phase = CheckoutPhase::CheckoutPending;
        self.event_sender
            .send_or_log(Event::CheckoutRequested { payment_method });
        info!(
            "Checkout request {} built: {} items, grand total {}",
            request.request_id,
            request.items.len(),
            request.grand_total
        );
        Ok(request)
    }

    /// Reacts to the order authority's verdict on a submitted request.
    ///
    /// Cash orders settle immediately. Deposit orders hold the cart until
    /// the customer acknowledges the transfer instructions via
    /// [`confirm_deposit_acknowledged`]. A rejection leaves everything in
    /// place so the customer can retry without re-entering items.
    ///
    /// [`confirm_deposit_acknowledged`]: CheckoutEngine::confirm_deposit_acknowledged
    pub fn finalize_after_submission(
        &mut self,
        payment_method: PaymentMethod,
        outcome: &SubmissionOutcome,
    ) {
        if self.phase != CheckoutPhase::CheckoutPending {
            warn!("finalize_after_submission called outside a pending checkout; ignoring");
            return;
        }

        match outcome {
            SubmissionOutcome::Accepted { order_id } => {
                self.last_order_id = Some(order_id.clone());
                self.event_sender.send_or_log(Event::OrderAccepted {
                    order_id: order_id.clone(),
                });

                if payment_method == PaymentMethod::Deposit {
                    info!("Order {} accepted; awaiting deposit acknowledgement", order_id);
                    self.phase = CheckoutPhase::AwaitingDepositAck;
                } else {
                    info!("Order {} accepted; cart settled", order_id);
                    self.cart.clear();
                    self.coupon = None;
                    self.persist();
                    self.phase = CheckoutPhase::Shopping;
                }
            }
            SubmissionOutcome::Rejected { reason } => {
                warn!("Order rejected: {}", reason);
                self.event_sender.send_or_log(Event::OrderRejected {
                    reason: reason.clone(),
                });
                self.phase = CheckoutPhase::Shopping;
            }
        }
    }

    /// Completes a deposit order once the customer has seen the bank
    /// transfer instructions, clearing the cart and coupon. Ignored outside
    /// the deposit-acknowledgement state.
    pub fn confirm_deposit_acknowledged(&mut self) {
        if self.phase != CheckoutPhase::AwaitingDepositAck {
            warn!("confirm_deposit_acknowledged called without a pending deposit; ignoring");
            return;
        }

        if let Some(order_id) = self.last_order_id.clone() {
            self.event_sender
                .send_or_log(Event::DepositAcknowledged { order_id });
        }
        self.cart.clear();
        self.coupon = None;
        self.persist();
        self.phase = CheckoutPhase::Shopping;
    }

    /// Write-through mirror of the in-memory cart. Failures are logged, not
    /// propagated: the in-memory cart stays authoritative.
    fn persist(&self) {
        let serialized = match serde_json::to_string(&self.cart) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize cart for persistence: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(CART_STORAGE_KEY, &serialized) {
            warn!("Failed to persist cart: {}", e);
        }
    }
}

fn authenticated<'a>(identity: Option<&'a Identity>) -> Result<&'a Identity, CheckoutError> {
    match identity {
        Some(id) if id.is_authenticated() => Ok(id),
        _ => Err(CheckoutError::AuthenticationRequired),
    }
}
