use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::CheckoutError;
use crate::models::checkout::{CheckoutRequest, Identity, SubmissionOutcome};

use super::{CouponGrant, OrderAuthority, PricingAuthority};

/// HTTP client for the storefront order API, implementing both remote
/// authority seams against the same base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client with the configured base URL and request timeout.
    pub fn from_config(config: &AppConfig) -> Result<Self, CheckoutError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                CheckoutError::Network(format!("failed to construct http client: {}", e))
            })?;

        Ok(Self::with_client(config.api_base_url.clone(), client))
    }

    /// Builds a client from an existing `reqwest::Client` (useful for
    /// testing against a local mock server).
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateCouponBody<'a> {
    code: &'a str,
    cart_total: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateCouponReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    discount: Option<Decimal>,
    #[serde(default)]
    coupon_id: Option<String>,
    #[serde(default)]
    prize_name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemBody<'a> {
    name: &'a str,
    quantity: u32,
    price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitOrderBody<'a> {
    items: Vec<OrderItemBody<'a>>,
    total: Decimal,
    user_id: &'a str,
    address: &'a str,
    payment_method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    coupon_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitOrderReply {
    order_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorReply {
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl PricingAuthority for ApiClient {
    #[instrument(skip(self, identity))]
    async fn validate_coupon(
        &self,
        identity: &Identity,
        code: &str,
        cart_subtotal: Decimal,
    ) -> Result<CouponGrant, CheckoutError> {
        let response = self
            .client
            .post(self.endpoint("/orders/apply-coupon"))
            .bearer_auth(&identity.bearer_token)
            .json(&ValidateCouponBody {
                code,
                cart_total: cart_subtotal,
            })
            .send()
            .await?;

        let status = response.status();
        let reply: ValidateCouponReply = response.json().await?;

        if status.is_success() && reply.success {
            match (reply.discount, reply.coupon_id) {
                (Some(discount), Some(coupon_ref)) => {
                    info!("Coupon {} validated: discount {}", code, discount);
                    Ok(CouponGrant {
                        coupon_ref,
                        discount,
                        prize_name: reply.prize_name,
                    })
                }
                _ => Err(CheckoutError::CouponRejected(
                    "pricing authority returned an incomplete grant".to_string(),
                )),
            }
        } else {
            let reason = reply
                .message
                .unwrap_or_else(|| "Coupon could not be applied".to_string());
            warn!("Coupon {} rejected: {}", code, reason);
            Err(CheckoutError::CouponRejected(reason))
        }
    }
}

#[async_trait]
impl OrderAuthority for ApiClient {
    #[instrument(skip(self, identity, request))]
    async fn submit_order(
        &self,
        identity: &Identity,
        request: &CheckoutRequest,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        let items = request
            .items
            .iter()
            .map(|item| OrderItemBody {
                name: &item.name,
                quantity: item.quantity,
                price: item.unit_price,
                image: item.image_ref.as_deref(),
            })
            .collect();

        let body = SubmitOrderBody {
            items,
            total: request.grand_total,
            user_id: &request.customer_id,
            address: &request.delivery_address,
            payment_method: request.payment_method.as_str(),
            coupon_id: request.coupon_ref.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint("/orders"))
            .bearer_auth(&identity.bearer_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let reply: SubmitOrderReply = response.json().await?;
            info!("Order accepted: {}", reply.order_id);
            Ok(SubmissionOutcome::Accepted {
                order_id: reply.order_id,
            })
        } else {
            let reply: ApiErrorReply = response.json().await.unwrap_or_default();
            let reason = reply
                .message
                .unwrap_or_else(|| format!("order submission failed with status {}", status));
            warn!("Order rejected: {}", reason);
            Ok(SubmissionOutcome::Rejected { reason })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cart::LineItem;
    use crate::models::checkout::PaymentMethod;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity() -> Identity {
        Identity {
            user_id: "u-1".into(),
            name: "Test Customer".into(),
            email: "test@example.com".into(),
            bearer_token: "token-abc".into(),
        }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            request_id: uuid::Uuid::new_v4(),
            items: vec![LineItem {
                product_id: "b-1".into(),
                name: "Classic Smash".into(),
                unit_price: dec!(750.00),
                quantity: 2,
                image_ref: Some("/img/classic.png".into()),
            }],
            delivery_address: "12 Galle Road, Colombo".into(),
            payment_method: PaymentMethod::Cash,
            subtotal: dec!(1500.00),
            delivery_fee: dec!(350.00),
            discount_amount: dec!(0.00),
            grand_total: dec!(1850.00),
            coupon_ref: None,
            customer_id: "u-1".into(),
        }
    }

    #[tokio::test]
    async fn validate_coupon_maps_a_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/apply-coupon"))
            .and(header("authorization", "Bearer token-abc"))
            .and(body_partial_json(json!({"code": "SAVE200"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "discount": 200.0,
                "couponId": "coupon-1",
                "prizeName": "Free Delivery Week"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::with_client(server.uri(), Client::new());
        let grant = client
            .validate_coupon(&identity(), "SAVE200", dec!(2350.00))
            .await
            .unwrap();

        assert_eq!(grant.coupon_ref, "coupon-1");
        assert_eq!(grant.discount, dec!(200.0));
        assert_eq!(grant.prize_name.as_deref(), Some("Free Delivery Week"));
    }

    #[tokio::test]
    async fn validate_coupon_surfaces_the_rejection_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/apply-coupon"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Coupon expired"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::with_client(server.uri(), Client::new());
        let err = client
            .validate_coupon(&identity(), "OLD", dec!(1000.00))
            .await
            .unwrap_err();

        assert_matches!(err, CheckoutError::CouponRejected(reason) if reason == "Coupon expired");
    }

    #[tokio::test]
    async fn validate_coupon_rejects_incomplete_grants() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/apply-coupon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "discount": 200.0
            })))
            .mount(&server)
            .await;

        let client = ApiClient::with_client(server.uri(), Client::new());
        let err = client
            .validate_coupon(&identity(), "SAVE200", dec!(2350.00))
            .await
            .unwrap_err();

        assert_matches!(err, CheckoutError::CouponRejected(_));
    }

    #[tokio::test]
    async fn submit_order_returns_the_server_order_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(body_partial_json(json!({
                "paymentMethod": "cash",
                "userId": "u-1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "orderId": "64fa11aa0b1c2d3e4f5a6b7c"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::with_client(server.uri(), Client::new());
        let outcome = client.submit_order(&identity(), &request()).await.unwrap();

        assert_eq!(
            outcome,
            SubmissionOutcome::Accepted {
                order_id: "64fa11aa0b1c2d3e4f5a6b7c".into()
            }
        );
    }

    #[tokio::test]
    async fn submit_order_maps_failures_to_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Store is closed"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::with_client(server.uri(), Client::new());
        let outcome = client.submit_order(&identity(), &request()).await.unwrap();

        assert_eq!(
            outcome,
            SubmissionOutcome::Rejected {
                reason: "Store is closed".into()
            }
        );
    }

    #[tokio::test]
    async fn transport_failure_is_a_network_error() {
        // Nothing is listening on this port.
        let client = ApiClient::with_client("http://127.0.0.1:9", Client::new());
        let err = client
            .validate_coupon(&identity(), "SAVE200", dec!(100.00))
            .await
            .unwrap_err();

        assert_matches!(err, CheckoutError::Network(_));
    }
}
