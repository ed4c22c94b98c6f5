use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::gateway_trait::{ChargeOutcome, ChargeRequest, PaymentGateway};
use crate::core::{AppError, Result};

/// Payment gateway reached over HTTP
///
/// `POST {base_url}/v1/charges` with a JSON body, authenticated with the API
/// key as basic auth username.
pub struct HttpPaymentGateway {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::HttpClient)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn charges_url(&self) -> String {
        format!("{}/v1/charges", self.base_url)
    }
}

#[derive(Serialize)]
struct ChargeBody {
    invoice_id: i64,
    customer_id: i64,
    amount: String,
    currency: String,
}

#[derive(Deserialize)]
struct ChargeResponseBody {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> ChargeOutcome {
        if let Err(reason) = request.currency.validate_amount(request.amount) {
            return ChargeOutcome::declined(reason);
        }

        let body = ChargeBody {
            invoice_id: request.invoice_id,
            customer_id: request.customer_id,
            amount: request.amount.to_string(),
            currency: request.currency.to_string(),
        };

        let response = match self
            .client
            .post(self.charges_url())
            .basic_auth(&self.api_key, Some(""))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(invoice_id = request.invoice_id, error = %e, "Gateway request failed");
                return ChargeOutcome::unreachable(e.to_string());
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return ChargeOutcome::unreachable(format!("Failed to read response: {}", e)),
        };

        debug!(invoice_id = request.invoice_id, status = %status, "Gateway responded");
        let outcome = classify_response(status, &text);

        if is_request_rejected(status, &outcome) {
            error!(
                invoice_id = request.invoice_id,
                status = %status,
                base_url = %self.base_url,
                "Gateway rejected the request, check GATEWAY_BASE_URL and GATEWAY_API_KEY"
            );
        }

        outcome
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Map a gateway HTTP response onto a charge outcome
///
/// Only 402, or a 4xx body reporting `"status":"declined"`, is the gateway
/// refusing the charge. Every other 4xx (401, 403, 404, ...) is a problem with
/// our request or credentials and says nothing about the customer, so it is
/// retried like 408, 429 and 5xx.
pub fn classify_response(status: StatusCode, body: &str) -> ChargeOutcome {
    let parsed = serde_json::from_str::<ChargeResponseBody>(body);

    if status.is_success() {
        return match parsed {
            Ok(parsed) => match parsed.status.to_lowercase().as_str() {
                "paid" | "succeeded" => ChargeOutcome::Paid,
                "declined" => ChargeOutcome::declined(
                    parsed.reason.unwrap_or_else(|| "declined".to_string()),
                ),
                other => ChargeOutcome::unreachable(format!("Unrecognised charge status '{}'", other)),
            },
            Err(e) => ChargeOutcome::unreachable(format!("Unparseable gateway response: {}", e)),
        };
    }

    if status.is_client_error() {
        let declined_body = parsed
            .ok()
            .filter(|parsed| parsed.status.eq_ignore_ascii_case("declined"));

        if status == StatusCode::PAYMENT_REQUIRED || declined_body.is_some() {
            let reason = declined_body
                .and_then(|parsed| parsed.reason)
                .unwrap_or_else(|| format!("Gateway returned {}", status));
            return ChargeOutcome::declined(reason);
        }
    }

    ChargeOutcome::unreachable(format!("Gateway returned {}", status))
}

/// 4xx answers that are not declines point at configuration, not at the charge
fn is_request_rejected(status: StatusCode, outcome: &ChargeOutcome) -> bool {
    status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS
        && matches!(outcome, ChargeOutcome::Unreachable { .. })
}
