use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{event, Level};

use crate::{
    domain::Order,
    dtos::{CallbackAck, Response, StkCallback},
    repositories::{CartRepository, CheckoutSessionRepository, OrderRepository},
};

// traits
pub trait Command{}

pub trait CommandHandler<C: Command, R: Response>{
    async fn handle(&self, input: &C) -> Result<R, CallbackError>;
}

/// Failures the callback route reports back to the caller. Everything else is
/// acknowledged with the success envelope so the provider does not retry.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("Cart not found")]
    CartNotFound,
    #[error("Error creating order")]
    OrderCreation(String),
    #[error("Invalid request")]
    InvalidPayload,
    #[error("Internal server error")]
    Store(String),
}

#[derive(Serialize, Deserialize)]
pub struct ProcessMpesaCallbackCommand {
    pub payload: Value,
}
impl Command for ProcessMpesaCallbackCommand{}

pub struct ProcessMpesaCallbackCommandHandler {
    order_repository: Arc<dyn OrderRepository + Send + Sync>,
    cart_repository: Arc<dyn CartRepository + Send + Sync>,
    session_repository: Arc<dyn CheckoutSessionRepository + Send + Sync>,
    always_ack_provider: bool,
}

impl ProcessMpesaCallbackCommandHandler {
    pub fn new(
        order_repository: Arc<dyn OrderRepository + Send + Sync>,
        cart_repository: Arc<dyn CartRepository + Send + Sync>,
        session_repository: Arc<dyn CheckoutSessionRepository + Send + Sync>,
        always_ack_provider: bool,
    ) -> Self {
        ProcessMpesaCallbackCommandHandler {
            order_repository: order_repository,
            cart_repository: cart_repository,
            session_repository: session_repository,
            always_ack_provider: always_ack_provider,
        }
    }

    fn acknowledge_invalid(&self) -> Result<CallbackAck, CallbackError> {
        if self.always_ack_provider {
            Ok(CallbackAck::success())
        } else {
            Err(CallbackError::InvalidPayload)
        }
    }
}

impl CommandHandler<ProcessMpesaCallbackCommand, CallbackAck> for ProcessMpesaCallbackCommandHandler {
    async fn handle(&self, input: &ProcessMpesaCallbackCommand) -> Result<CallbackAck, CallbackError> {
        let stk_callback = match StkCallback::from_payload(&input.payload) {
            Some(stk_callback) => stk_callback,
            None => {
                event!(Level::WARN, "Invalid data received");
                return self.acknowledge_invalid();
            }
        };

        let result_code = match stk_callback.result_code {
            Some(result_code) => result_code,
            None => {
                event!(Level::WARN, "Invalid data received: missing result code");
                return self.acknowledge_invalid();
            }
        };

        if result_code != 0 {
            event!(
                Level::INFO,
                "Payment failed with result code {}: {}",
                result_code,
                stk_callback.result_desc.as_deref().unwrap_or("no description")
            );
            return Ok(CallbackAck::success());
        }

        event!(Level::INFO, "Payment was successful");

        let amount = stk_callback.metadata_value("Amount");
        let phone_number = stk_callback.metadata_value("PhoneNumber");

        let checkout_request_id = match stk_callback.checkout_request_id {
            Some(checkout_request_id) => checkout_request_id,
            None => {
                event!(Level::WARN, "Invalid data received: missing checkout request id");
                return self.acknowledge_invalid();
            }
        };

        // Duplicate delivery of the same callback must not create a second order.
        match self
            .order_repository
            .find_by_checkout_request_id(&checkout_request_id)
            .await
        {
            Ok(Some(existing_order)) => {
                event!(
                    Level::INFO,
                    "Order {} already exists for checkout request {}, skipping",
                    existing_order.id,
                    checkout_request_id
                );
                return Ok(CallbackAck::success());
            },
            Ok(None) => {},
            Err(e) => {
                return Err(CallbackError::Store(e));
            }
        }

        let session = match self.session_repository.resolve(&checkout_request_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                event!(
                    Level::WARN,
                    "No checkout session for request {} (merchant request {})",
                    checkout_request_id,
                    stk_callback.merchant_request_id.as_deref().unwrap_or("unknown")
                );
                return self.acknowledge_invalid();
            },
            Err(e) => {
                return Err(CallbackError::Store(e));
            }
        };

        let cart = match self
            .cart_repository
            .read(&session.user_id, &session.cart_id)
            .await
        {
            Ok(Some(cart)) => cart,
            Ok(None) => {
                event!(Level::WARN, "Cart not found");
                return Err(CallbackError::CartNotFound);
            },
            Err(e) => {
                return Err(CallbackError::Store(e));
            }
        };

        event!(Level::DEBUG, "Fetched cart {} for user {}", cart.id, cart.user_id);

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            cart_id: session.cart_id,
            user_id: session.user_id,
            payment_mode: String::from("M-Pesa"),
            amount_paid: amount,
            phone_number: phone_number,
            status: String::from("Paid"),
            timestamp: chrono::Utc::now().to_rfc3339(),
            products: cart.products,
            checkout_request_id: checkout_request_id,
        };

        match self.order_repository.create(order).await {
            Ok(created_order) => {
                event!(Level::INFO, "Order {} created successfully", created_order.id);
                Ok(CallbackAck::success())
            },
            Err(e) => {
                event!(Level::WARN, "Order creation error: {}", e);
                Err(CallbackError::OrderCreation(e))
            }
        }
    }
}
