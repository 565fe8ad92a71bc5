use serde::{Deserialize, Serialize};
use serde_json::Value;

pub trait Response{}

/// Acknowledgment envelope the payment provider expects on every accepted callback.
#[derive(Serialize, Deserialize)]
pub struct CallbackAck {
    pub status: String
}
impl Response for CallbackAck{}

impl CallbackAck {
    pub fn success() -> Self {
        CallbackAck {
            status: String::from("success")
        }
    }
}

/// Inner stkCallback payload of the provider webhook. Every field is optional so a
/// structurally unexpected body surfaces as an absent value rather than a parse
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "ResultCode")]
    pub result_code: Option<i64>,
    #[serde(rename = "ResultDesc")]
    pub result_desc: Option<String>,
    #[serde(rename = "CallbackMetadata")]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub item: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: Option<Value>,
}

impl StkCallback {
    /// Pulls the stkCallback object out of the raw webhook body, if present.
    pub fn from_payload(payload: &Value) -> Option<StkCallback> {
        let inner = payload.pointer("/Body/stkCallback")?;
        serde_json::from_value(inner.clone()).ok()
    }

    /// Lenient metadata lookup: a missing item resolves to None, never an error.
    pub fn metadata_value(&self, name: &str) -> Option<Value> {
        self.callback_metadata
            .as_ref()?
            .item
            .iter()
            .find(|item| item.name == name)
            .and_then(|item| item.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_stk_callback_from_provider_body() {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            { "Name": "Amount", "Value": 500 },
                            { "Name": "PhoneNumber", "Value": 254700000000u64 }
                        ]
                    }
                }
            }
        });

        let stk = StkCallback::from_payload(&payload).unwrap();
        assert_eq!(stk.result_code, Some(0));
        assert_eq!(stk.checkout_request_id.as_deref(), Some("ws_CO_191220191020363925"));
        assert_eq!(stk.metadata_value("Amount"), Some(json!(500)));
        assert_eq!(stk.metadata_value("PhoneNumber"), Some(json!(254700000000u64)));
    }

    #[test]
    fn missing_metadata_items_resolve_to_none() {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "ResultCode": 0
                }
            }
        });

        let stk = StkCallback::from_payload(&payload).unwrap();
        assert_eq!(stk.metadata_value("Amount"), None);
        assert_eq!(stk.metadata_value("PhoneNumber"), None);
    }

    #[test]
    fn body_without_stk_callback_yields_none() {
        let payload = json!({ "Body": { "unexpected": true } });
        assert!(StkCallback::from_payload(&payload).is_none());

        let payload = json!({ "something": "else" });
        assert!(StkCallback::from_payload(&payload).is_none());
    }
}
