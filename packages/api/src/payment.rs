use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lectern_types::{Result, anyhow};
use stripe::{EventObject, EventType};

/// Everything the checkout collaborator needs to build a payment session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Ledger row this session pays for, round-tripped through the callback
    pub purchase_id: String,
    pub course_title: String,
    pub amount_cents: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Payment-collaborator callback, already signature-verified and reduced
/// to the events this service acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    CheckoutCompleted {
        event_id: String,
        purchase_id: String,
        payment_intent_id: Option<String>,
    },
    CheckoutExpired {
        event_id: String,
        purchase_id: String,
    },
    Other {
        event_id: String,
        event_type: String,
    },
}

impl GatewayEvent {
    pub fn id(&self) -> &str {
        match self {
            GatewayEvent::CheckoutCompleted { event_id, .. } => event_id,
            GatewayEvent::CheckoutExpired { event_id, .. } => event_id,
            GatewayEvent::Other { event_id, .. } => event_id,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            GatewayEvent::CheckoutCompleted { .. } => "checkout.completed",
            GatewayEvent::CheckoutExpired { .. } => "checkout.expired",
            GatewayEvent::Other { event_type, .. } => event_type,
        }
    }
}

/// Capability interface for the external payment collaborator. The ledger
/// never talks to the gateway SDK directly, which keeps purchase logic
/// testable against fakes.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession>;

    /// Verify a raw webhook delivery against its signature header and map
    /// it into a typed event.
    fn verify_event(&self, payload: &str, signature: &str) -> Result<GatewayEvent>;
}

pub type DynPaymentGateway = Arc<dyn PaymentGateway>;

pub struct StripeGateway {
    client: stripe::Client,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| anyhow!("STRIPE_SECRET_KEY must be set"))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| anyhow!("STRIPE_WEBHOOK_SECRET must be set"))?;
        Ok(Self {
            client: stripe::Client::new(secret_key),
            webhook_secret,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let currency: stripe::Currency = lectern_types::json::from_value(
            lectern_types::Value::String(request.currency.to_lowercase()),
        )
        .map_err(|_| anyhow!("Unsupported currency: {}", request.currency))?;

        let mut metadata = HashMap::new();
        metadata.insert("purchase_id".to_string(), request.purchase_id.clone());

        let mut params = stripe::CreateCheckoutSession::new();
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.mode = Some(stripe::CheckoutSessionMode::Payment);
        // client_reference_id is how the webhook finds the ledger row
        params.client_reference_id = Some(&request.purchase_id);

        let line_item = stripe::CreateCheckoutSessionLineItems {
            price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
                currency,
                product_data: Some(stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: request.course_title.clone(),
                    ..Default::default()
                }),
                unit_amount: Some(request.amount_cents),
                ..Default::default()
            }),
            quantity: Some(1),
            ..Default::default()
        };
        params.line_items = Some(vec![line_item]);
        params.metadata = Some(metadata);

        let session = stripe::CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| anyhow!("Failed to create checkout session: {}", e))?;

        let url = session
            .url
            .ok_or_else(|| anyhow!("Checkout session has no redirect URL"))?;

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url,
        })
    }

    fn verify_event(&self, payload: &str, signature: &str) -> Result<GatewayEvent> {
        let event = stripe::Webhook::construct_event(payload, signature, &self.webhook_secret)
            .map_err(|e| anyhow!("Failed to verify webhook signature: {}", e))?;

        let event_id = event.id.to_string();
        match event.type_ {
            EventType::CheckoutSessionCompleted => {
                if let EventObject::CheckoutSession(session) = &event.data.object {
                    let purchase_id = session
                        .client_reference_id
                        .clone()
                        .ok_or_else(|| anyhow!("Missing client_reference_id"))?;
                    Ok(GatewayEvent::CheckoutCompleted {
                        event_id,
                        purchase_id,
                        payment_intent_id: session
                            .payment_intent
                            .as_ref()
                            .map(|pi| pi.id().to_string()),
                    })
                } else {
                    Err(anyhow!("Unexpected payload for checkout.session.completed"))
                }
            }
            EventType::CheckoutSessionExpired => {
                if let EventObject::CheckoutSession(session) = &event.data.object {
                    let purchase_id = session
                        .client_reference_id
                        .clone()
                        .ok_or_else(|| anyhow!("Missing client_reference_id"))?;
                    Ok(GatewayEvent::CheckoutExpired {
                        event_id,
                        purchase_id,
                    })
                } else {
                    Err(anyhow!("Unexpected payload for checkout.session.expired"))
                }
            }
            other => Ok(GatewayEvent::Other {
                event_id,
                event_type: other.to_string(),
            }),
        }
    }
}
