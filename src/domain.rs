use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub cart_id: String,
    pub user_id: String,
    pub payment_mode: String,
    pub amount_paid: Option<Value>,
    pub phone_number: Option<Value>,
    pub status: String,
    pub timestamp: String,
    pub products: Vec<Value>,
    pub checkout_request_id: String,
}

/// Cart contents as read from the document store. Products stay opaque JSON so the
/// order snapshot matches the stored list verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub products: Vec<Value>,
}

/// Correlation record written when a payment is initiated, keyed by the provider's
/// CheckoutRequestID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub checkout_request_id: String,
    pub user_id: String,
    pub cart_id: String,
}
