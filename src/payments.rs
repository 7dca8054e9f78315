//! Minimal payment-intent passthrough for the hosted processor, plus
//! webhook signature verification.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// A payment intent as returned by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Processor-assigned identifier.
    pub id: String,
    /// Client-side confirmation secret, when the processor returns one.
    pub client_secret: Option<String>,
    /// Current intent status.
    pub status: String,
    /// Amount in minor currency units (cents).
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Metadata echoed back by the processor.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorBody {
    error: ProcessorErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorDetail {
    message: Option<String>,
}

/// Thin client for the processor's REST API. Holds the secret key; the base
/// URL is injectable so tests can point it at a local stub.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl PaymentClient {
    /// Creates a client against the production API.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_base_url(secret_key, STRIPE_API_BASE)
    }

    /// Creates a client against an explicit base URL.
    pub fn with_base_url(secret_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Creates a card payment intent for `amount_cents`, forwarding any
    /// caller-supplied metadata.
    pub async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<PaymentIntent, ApiError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".into(), amount_cents.to_string()),
            ("currency".into(), currency.to_owned()),
            ("payment_method_types[]".into(), "card".into()),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let response = self
            .http
            .post(format!("{}/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|err| ApiError::Payment(err.to_string()))?;

        Self::decode(response).await
    }

    /// Retrieves an existing payment intent.
    pub async fn get_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, ApiError> {
        let response = self
            .http
            .get(format!(
                "{}/payment_intents/{payment_intent_id}",
                self.base_url
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|err| ApiError::Payment(err.to_string()))?;

        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<PaymentIntent, ApiError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Payment(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ProcessorErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error.message)
                .unwrap_or_else(|| format!("payment processor returned {status}"));
            return Err(ApiError::Payment(message));
        }

        serde_json::from_slice(&body).map_err(|err| ApiError::Payment(err.to_string()))
    }
}

/// Verifies a `Stripe-Signature` header (`t=…,v1=…`) against the raw request
/// body: HMAC-SHA256 over `"{t}.{payload}"` with the webhook secret, checked
/// in constant time against every `v1` candidate.
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
) -> Result<(), ApiError> {
    let mut timestamp: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for pair in header.split(',') {
        let Some((key, value)) = pair.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(ApiError::InvalidSignature)?;
    if secret.is_empty() || candidates.is_empty() {
        return Err(ApiError::InvalidSignature);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| ApiError::InvalidSignature)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    for candidate in candidates {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        if mac.clone().verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }
    Err(ApiError::InvalidSignature)
}

/// Computes the `v1` signature value for a timestamp and payload. Exposed
/// for webhook tests and local delivery tooling.
pub fn sign_webhook_payload(secret: &str, timestamp: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
