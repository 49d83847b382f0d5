use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::session::SessionParams;

/// Dialogflow CX webhook request (the subset we read).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogflowRequest {
    #[serde(default)]
    pub intent_info: Option<IntentInfo>,
    #[serde(default)]
    pub session_info: Option<SessionInfo>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentInfo {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default)]
    pub parameters: SessionParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogflowResponse {
    pub fulfillment_response: FulfillmentResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_info: Option<SessionInfo>,
}

#[derive(Debug, Serialize)]
pub struct FulfillmentResponse {
    pub messages: Vec<ResponseMessage>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMessage {
    pub text: ResponseText,
}

#[derive(Debug, Serialize)]
pub struct ResponseText {
    pub text: Vec<String>,
}

impl DialogflowResponse {
    pub fn new(message: String, session_info: Option<SessionInfo>) -> Self {
        Self {
            fulfillment_response: FulfillmentResponse {
                messages: vec![ResponseMessage {
                    text: ResponseText {
                        text: vec![message],
                    },
                }],
            },
            session_info,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub session_id: String,
    pub intent: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_envelope_shape() {
        let mut params = SessionParams::new();
        params.insert("cookingMode".into(), json!(true));
        let res = DialogflowResponse::new(
            "Hello".into(),
            Some(SessionInfo {
                session: None,
                parameters: params,
            }),
        );
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({
                "fulfillmentResponse": {"messages": [{"text": {"text": ["Hello"]}}]},
                "sessionInfo": {"parameters": {"cookingMode": true}}
            })
        );
    }

    #[test]
    fn request_tolerates_missing_fields() {
        let req: DialogflowRequest = serde_json::from_value(json!({"text": "hi"})).unwrap();
        assert!(req.intent_info.is_none());
        assert_eq!(req.text.as_deref(), Some("hi"));
    }
}
