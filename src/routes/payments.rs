use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    payments::{PaymentClient, verify_webhook_signature},
    state::AppState,
};

/// Body of a payment-intent creation request.
#[derive(Deserialize)]
pub struct CreateIntentRequest {
    /// Amount in major currency units; must be positive.
    amount: Option<f64>,
    /// ISO currency code; defaults to `usd`.
    currency: Option<String>,
    /// Metadata forwarded to the processor.
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Serialize)]
struct CreateIntentResponse {
    #[serde(rename = "clientSecret")]
    client_secret: Option<String>,
    #[serde(rename = "paymentIntentId")]
    payment_intent_id: String,
}

#[derive(Serialize)]
struct PaymentDetails {
    status: String,
    amount: f64,
    currency: String,
    metadata: HashMap<String, String>,
}

#[derive(Serialize)]
struct WebhookAck {
    received: bool,
}

#[derive(Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: WebhookData,
}

#[derive(Default, Deserialize)]
struct WebhookData {
    #[serde(default)]
    object: WebhookObject,
}

#[derive(Default, Deserialize)]
struct WebhookObject {
    #[serde(default)]
    id: String,
}

/// POST `/api/payments/intent` — create a card payment intent. Amounts are
/// taken in major units and converted to cents.
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateIntentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let amount = request
        .amount
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .ok_or(ApiError::InvalidAmount)?;
    let amount_cents = (amount * 100.0).round() as i64;
    let currency = request.currency.as_deref().unwrap_or("usd");

    let intent = client(&state)?
        .create_intent(amount_cents, currency, &request.metadata)
        .await?;

    Ok(Json(CreateIntentResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
    }))
}

/// GET `/api/payments/:payment_intent_id` — current status of an intent.
pub async fn get_payment_details(
    State(state): State<Arc<AppState>>,
    Path(payment_intent_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let intent = client(&state)?.get_intent(&payment_intent_id).await?;

    Ok(Json(PaymentDetails {
        status: intent.status,
        amount: intent.amount as f64 / 100.0,
        currency: intent.currency,
        metadata: intent.metadata,
    }))
}

/// POST `/api/payments/webhook` — signed event deliveries from the
/// processor. The signature is verified over the raw body before the JSON
/// is decoded.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingSignature)?;

    verify_webhook_signature(&state.config.stripe_webhook_secret, signature, &body)?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| ApiError::InvalidWebhookPayload(err.to_string()))?;

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            info!(payment_intent = %event.data.object.id, "payment succeeded");
        }
        "payment_intent.payment_failed" => {
            warn!(payment_intent = %event.data.object.id, "payment failed");
        }
        other => {
            info!(event = other, "unhandled webhook event type");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

fn client(state: &AppState) -> Result<&PaymentClient, ApiError> {
    state
        .payments
        .as_ref()
        .ok_or_else(|| ApiError::Payment("Stripe is not configured".to_owned()))
}
