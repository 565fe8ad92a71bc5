use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::{Cart, CheckoutSession, Order};

#[derive(Debug)]
pub struct SupabaseInitializationInfo {
    pub base_url: String,
    pub service_key: String,
}

#[derive(Debug)]
pub struct FirestoreInitializationInfo {
    pub documents_url: String,
}

#[async_trait]
pub trait OrderRepository {
    async fn create(&self, order: Order) -> Result<Order, String>;
    async fn find_by_checkout_request_id(&self, checkout_request_id: &str) -> Result<Option<Order>, String>;
}

#[async_trait]
pub trait CartRepository {
    async fn read(&self, user_id: &str, cart_id: &str) -> Result<Option<Cart>, String>;
}

#[async_trait]
pub trait CheckoutSessionRepository {
    async fn resolve(&self, checkout_request_id: &str) -> Result<Option<CheckoutSession>, String>;
}

#[derive(Clone)]
pub struct InMemoryOrderRepository {
    orders: Arc<Mutex<HashMap<String, Order>>>,
}

#[derive(Clone)]
pub struct InMemoryCartRepository {
    carts: Arc<Mutex<HashMap<(String, String), Cart>>>,
}

#[derive(Clone)]
pub struct InMemoryCheckoutSessionRepository {
    sessions: Arc<Mutex<HashMap<String, CheckoutSession>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        InMemoryOrderRepository {
            orders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn read_all(&self) -> Vec<Order> {
        let lock = self.orders.lock().await;
        lock.values().cloned().collect()
    }
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        InMemoryCartRepository {
            carts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, cart: Cart) {
        let mut lock = self.carts.lock().await;
        lock.insert((cart.user_id.clone(), cart.id.clone()), cart);
    }
}

impl InMemoryCheckoutSessionRepository {
    pub fn new() -> Self {
        InMemoryCheckoutSessionRepository {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, session: CheckoutSession) {
        let mut lock = self.sessions.lock().await;
        lock.insert(session.checkout_request_id.clone(), session);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: Order) -> Result<Order, String> {
        let mut lock = self.orders.lock().await;
        lock.insert(order.id.clone(), order.clone());
        match lock.get(order.id.as_str()) {
            Some(x) => {
                Ok(x.clone())
            },
            None => {
                Err(format!("Order with id {} did not exist", order.id))
            }
        }
    }

    async fn find_by_checkout_request_id(&self, checkout_request_id: &str) -> Result<Option<Order>, String> {
        let lock = self.orders.lock().await;
        Ok(lock
            .values()
            .find(|order| order.checkout_request_id == checkout_request_id)
            .cloned())
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn read(&self, user_id: &str, cart_id: &str) -> Result<Option<Cart>, String> {
        let lock = self.carts.lock().await;
        Ok(lock.get(&(user_id.to_string(), cart_id.to_string())).cloned())
    }
}

#[async_trait]
impl CheckoutSessionRepository for InMemoryCheckoutSessionRepository {
    async fn resolve(&self, checkout_request_id: &str) -> Result<Option<CheckoutSession>, String> {
        let lock = self.sessions.lock().await;
        Ok(lock.get(checkout_request_id).cloned())
    }
}

/// Cart reads against the Firestore-style document REST API. A document response
/// without a `fields` container means the cart does not exist.
#[derive(Clone)]
pub struct FirestoreCartRepository {
    http: reqwest::Client,
    documents_url: String,
}

impl FirestoreCartRepository {
    pub fn new(http: reqwest::Client, info: &FirestoreInitializationInfo) -> Self {
        FirestoreCartRepository {
            http: http,
            documents_url: String::from(info.documents_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl CartRepository for FirestoreCartRepository {
    async fn read(&self, user_id: &str, cart_id: &str) -> Result<Option<Cart>, String> {
        let url = format!("{}/customers/{}/cart/{}", self.documents_url, user_id, cart_id);

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                return Err(format!("Failed to fetch Cart {}: {}", cart_id, e));
            }
        };

        let document: Value = match response.json().await {
            Ok(d) => d,
            Err(e) => {
                return Err(format!("Failed to decode Cart {}: {}", cart_id, e));
            }
        };

        match document.get("fields") {
            Some(fields) => {
                let products = fields
                    .get("products")
                    .and_then(|p| p.as_array())
                    .cloned()
                    .unwrap_or_default();

                Ok(Some(Cart {
                    id: String::from(cart_id),
                    user_id: String::from(user_id),
                    products: products,
                }))
            },
            None => Ok(None)
        }
    }
}

/// Order writes and dedup lookups against the relational store's `orders` resource.
#[derive(Clone)]
pub struct SupabaseOrderRepository {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseOrderRepository {
    pub fn new(http: reqwest::Client, info: &SupabaseInitializationInfo) -> Self {
        SupabaseOrderRepository {
            http: http,
            base_url: String::from(info.base_url.trim_end_matches('/')),
            service_key: info.service_key.clone(),
        }
    }
}

fn store_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => {
            match v.get("message").and_then(|m| m.as_str()) {
                Some(message) => String::from(message),
                None => String::from(body)
            }
        },
        Err(_) => String::from(body)
    }
}

#[async_trait]
impl OrderRepository for SupabaseOrderRepository {
    async fn create(&self, order: Order) -> Result<Order, String> {
        let url = format!("{}/rest/v1/orders", self.base_url);

        let response = match self
            .http
            .post(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=representation")
            .json(&vec![&order])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Err(format!("Failed to insert Order: {}", e));
            }
        };

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Failed to insert Order: {}", store_error_message(&body)));
        }

        match response.json::<Vec<Order>>().await {
            Ok(mut created) => {
                match created.pop() {
                    Some(created_order) => Ok(created_order),
                    None => Err(format!("Insert of Order {} returned no rows", order.id))
                }
            },
            Err(e) => {
                Err(format!("Failed to decode inserted Order: {}", e))
            }
        }
    }

    async fn find_by_checkout_request_id(&self, checkout_request_id: &str) -> Result<Option<Order>, String> {
        let url = format!(
            "{}/rest/v1/orders?checkout_request_id=eq.{}&select=*",
            self.base_url, checkout_request_id
        );

        let response = match self
            .http
            .get(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Err(format!("Failed to find Orders: {}", e));
            }
        };

        match response.json::<Vec<Order>>().await {
            Ok(mut found_orders) => Ok(found_orders.pop()),
            Err(e) => Err(format!("Failed to decode Orders: {}", e))
        }
    }
}

/// Correlation lookups against the `checkout_sessions` resource, written when the
/// STK push is initiated.
#[derive(Clone)]
pub struct SupabaseCheckoutSessionRepository {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseCheckoutSessionRepository {
    pub fn new(http: reqwest::Client, info: &SupabaseInitializationInfo) -> Self {
        SupabaseCheckoutSessionRepository {
            http: http,
            base_url: String::from(info.base_url.trim_end_matches('/')),
            service_key: info.service_key.clone(),
        }
    }
}

#[async_trait]
impl CheckoutSessionRepository for SupabaseCheckoutSessionRepository {
    async fn resolve(&self, checkout_request_id: &str) -> Result<Option<CheckoutSession>, String> {
        let url = format!(
            "{}/rest/v1/checkout_sessions?checkout_request_id=eq.{}&select=*",
            self.base_url, checkout_request_id
        );

        let response = match self
            .http
            .get(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Err(format!("Failed to find CheckoutSession {}: {}", checkout_request_id, e));
            }
        };

        match response.json::<Vec<CheckoutSession>>().await {
            Ok(mut found_sessions) => Ok(found_sessions.pop()),
            Err(e) => Err(format!("Failed to decode CheckoutSession {}: {}", checkout_request_id, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn in_memory_order_repository_finds_by_checkout_request_id() {
        let repository = InMemoryOrderRepository::new();
        let order = Order {
            id: String::from("order-1"),
            cart_id: String::from("cart-1"),
            user_id: String::from("user-1"),
            payment_mode: String::from("M-Pesa"),
            amount_paid: Some(json!(500)),
            phone_number: Some(json!(254700000000u64)),
            status: String::from("Paid"),
            timestamp: String::from("2026-08-30T00:00:00Z"),
            products: vec![json!({"id": "p1", "qty": 1})],
            checkout_request_id: String::from("ws_CO_0001"),
        };

        repository.create(order).await.unwrap();

        let found = repository.find_by_checkout_request_id("ws_CO_0001").await.unwrap();
        assert_eq!(found.unwrap().id, "order-1");

        let missing = repository.find_by_checkout_request_id("ws_CO_9999").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn in_memory_cart_repository_reads_by_user_and_cart() {
        let repository = InMemoryCartRepository::new();
        repository
            .insert(Cart {
                id: String::from("cart-1"),
                user_id: String::from("user-1"),
                products: vec![json!({"id": "p1", "qty": 1})],
            })
            .await;

        let found = repository.read("user-1", "cart-1").await.unwrap().unwrap();
        assert_eq!(found.products.len(), 1);

        assert!(repository.read("user-2", "cart-1").await.unwrap().is_none());
        assert!(repository.read("user-1", "cart-2").await.unwrap().is_none());
    }

    #[test]
    fn store_error_message_prefers_the_message_field() {
        assert_eq!(
            store_error_message("{\"message\":\"duplicate key\"}"),
            "duplicate key"
        );
        assert_eq!(store_error_message("not json"), "not json");
    }
}
