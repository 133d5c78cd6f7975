pub mod cart;
pub mod checkout;

pub use cart::{Cart, CouponApplication, LineItem};
pub use checkout::{CartTotals, CheckoutRequest, Identity, PaymentMethod, SubmissionOutcome};
