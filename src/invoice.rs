use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::cart::LineItem;
use crate::models::checkout::{CheckoutRequest, Identity};

/// One priced row of an invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<&LineItem> for InvoiceLine {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
        }
    }
}

/// Structured invoice data for an accepted order.
///
/// The engine assembles the numbers; rendering (PDF, print view) is the
/// shell's concern and happens outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub order_id: String,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub delivery_address: String,
    pub issued_at: DateTime<Utc>,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub discount_amount: Decimal,
    pub grand_total: Decimal,
    pub currency: String,
}

impl Invoice {
    /// Assembles invoice data for an order the authority has accepted.
    pub fn for_order(
        order_id: &str,
        request: &CheckoutRequest,
        customer: &Identity,
        currency: &str,
    ) -> Self {
        Self {
            order_id: order_id.to_string(),
            invoice_number: format!("#{}", short_reference(order_id)),
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            delivery_address: request.delivery_address.clone(),
            issued_at: Utc::now(),
            lines: request.items.iter().map(InvoiceLine::from).collect(),
            subtotal: request.subtotal,
            delivery_fee: request.delivery_fee,
            discount_amount: request.discount_amount,
            grand_total: request.grand_total,
            currency: currency.to_string(),
        }
    }
}

/// Last six characters of a server order id, the human-facing reference
/// printed on invoices and quoted on bank transfers.
pub fn short_reference(order_id: &str) -> String {
    let chars: Vec<char> = order_id.chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checkout::PaymentMethod;
    use rust_decimal_macros::dec;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            request_id: uuid::Uuid::new_v4(),
            items: vec![
                LineItem {
                    product_id: "b-1".into(),
                    name: "Classic Smash".into(),
                    unit_price: dec!(750.00),
                    quantity: 2,
                    image_ref: None,
                },
                LineItem {
                    product_id: "b-2".into(),
                    name: "Mushroom Melt".into(),
                    unit_price: dec!(850.00),
                    quantity: 1,
                    image_ref: None,
                },
            ],
            delivery_address: "12 Galle Road, Colombo".into(),
            payment_method: PaymentMethod::Cash,
            subtotal: dec!(2350.00),
            delivery_fee: dec!(350.00),
            discount_amount: dec!(200.00),
            grand_total: dec!(2500.00),
            coupon_ref: Some("coupon-1".into()),
            customer_id: "u-1".into(),
        }
    }

    fn customer() -> Identity {
        Identity {
            user_id: "u-1".into(),
            name: "Test Customer".into(),
            email: "test@example.com".into(),
            bearer_token: "tok".into(),
        }
    }

    #[test]
    fn invoice_mirrors_the_request_totals() {
        let invoice = Invoice::for_order("64fa11aa0b1c2d3e4f5a6b7c", &request(), &customer(), "LKR");

        assert_eq!(invoice.invoice_number, "#5a6b7c");
        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.lines[0].line_total, dec!(1500.00));
        assert_eq!(invoice.subtotal, dec!(2350.00));
        assert_eq!(invoice.grand_total, dec!(2500.00));
        assert_eq!(invoice.currency, "LKR");
    }

    #[test]
    fn short_reference_handles_short_ids() {
        assert_eq!(short_reference("abc"), "abc");
        assert_eq!(short_reference("64fa11aa0b1c2d3e4f5a6b7c"), "5a6b7c");
    }
}
