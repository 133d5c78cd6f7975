use serde::Serialize;

/// Failures surfaced by the checkout engine and its collaborators.
///
/// Every variant is recoverable by the user; the consuming shell decides
/// presentation. The engine never panics on internal anomalies — the one
/// defensive case (a discount exceeding the subtotal) is logged and floored
/// rather than raised.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum CheckoutError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Missing coupon code")]
    MissingCode,

    #[error("Missing delivery address")]
    MissingAddress,

    #[error("Coupon rejected: {0}")]
    CouponRejected(String),

    #[error("Unsupported payment method: {0}")]
    UnsupportedPaymentMethod(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for CheckoutError {
    fn from(err: reqwest::Error) -> Self {
        CheckoutError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Serialization(err.to_string())
    }
}

impl CheckoutError {
    /// Returns the message suitable for direct user presentation.
    /// Infrastructure errors return generic messages to avoid leaking
    /// implementation details.
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Serialization(_) => "Something went wrong".to_string(),
            Self::Network(_) => "Could not connect to server".to_string(),
            _ => self.to_string(),
        }
    }

    /// True for failures the user can fix by changing their input, as
    /// opposed to transport or infrastructure trouble.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(
            self,
            Self::Network(_) | Self::Storage(_) | Self::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_condition() {
        assert_eq!(
            CheckoutError::AuthenticationRequired.to_string(),
            "Authentication required"
        );
        assert_eq!(
            CheckoutError::CouponRejected("expired".into()).to_string(),
            "Coupon rejected: expired"
        );
        assert_eq!(
            CheckoutError::UnsupportedPaymentMethod("crypto".into()).to_string(),
            "Unsupported payment method: crypto"
        );
    }

    #[test]
    fn user_message_hides_infrastructure_details() {
        assert_eq!(
            CheckoutError::Storage("permission denied on /var/data".into()).user_message(),
            "Something went wrong"
        );
        assert_eq!(
            CheckoutError::Network("dns lookup failed".into()).user_message(),
            "Could not connect to server"
        );

        // User-facing errors keep the actual message
        assert_eq!(
            CheckoutError::MissingAddress.user_message(),
            "Missing delivery address"
        );
    }

    #[test]
    fn user_correctable_classification() {
        assert!(CheckoutError::MissingCode.is_user_correctable());
        assert!(CheckoutError::CouponRejected("x".into()).is_user_correctable());
        assert!(!CheckoutError::Network("x".into()).is_user_correctable());
        assert!(!CheckoutError::Storage("x".into()).is_user_correctable());
    }
}
