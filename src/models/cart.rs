use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product entry in the cart.
///
/// The unit price is fixed at the moment the item is added and already
/// includes any modifier surcharges baked into the display name
/// (e.g. "Double Smash + Extra Cheese"). The image reference is an opaque
/// asset handle for the shell; the engine never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl LineItem {
    /// Builds a single-quantity line item. The unit price is expected to be
    /// non-negative; the catalog resolves prices before they reach the cart.
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        image_ref: Option<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity: 1,
            image_ref,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The current, unsubmitted order.
///
/// Insertion order is display order and carries no pricing meaning. The
/// subtotal is always recomputed from the items, never stored, so it cannot
/// drift after a mutation. At most one line item exists per product id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn find(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Merge-increments an existing line or appends a new one with
    /// quantity 1. Returns the resulting quantity for the product.
    pub(crate) fn add(
        &mut self,
        product_id: &str,
        name: &str,
        unit_price: Decimal,
        image_ref: Option<String>,
    ) -> u32 {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity += 1;
            existing.quantity
        } else {
            self.items
                .push(LineItem::new(product_id, name, unit_price, image_ref));
            1
        }
    }

    /// Sets the quantity for a product. Returns false when the product is
    /// not in the cart. Zero is not a valid quantity here; callers route
    /// non-positive quantities through removal instead.
    pub(crate) fn set_quantity(&mut self, product_id: &str, quantity: u32) -> bool {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes a product's line. Returns false when it was not present.
    pub(crate) fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

/// A discount grant validated by the pricing authority.
///
/// The discount amount and the authority's coupon reference are set together
/// or not at all; the reference is forwarded verbatim on checkout so the
/// authority can mark the coupon consumed. At most one application is active
/// per cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponApplication {
    pub code: String,
    pub discount_amount: Decimal,
    pub coupon_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_name: Option<String>,
    pub applied_at: DateTime<Utc>,
}
