//! OCPP 1.6-J message framing
//!
//! OCPP-J carries RPC frames as JSON arrays over WebSocket text messages:
//! - CALL: [2, messageId, action, payload]
//! - CALLRESULT: [3, messageId, payload]
//! - CALLERROR: [4, messageId, errorCode, errorDescription, errorDetails]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::types::*;

/// OCPP-J message type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Call = 2,
    CallResult = 3,
    CallError = 4,
}

/// OCPP 1.6 error codes (FormationViolation spelling is OCPP 1.6's)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    FormationViolation,
    GenericError,
    InternalError,
    NotImplemented,
    NotSupported,
    OccurenceConstraintViolation,
    PropertyConstraintViolation,
    ProtocolError,
    SecurityError,
    TypeConstraintViolation,
}

/// Actions this charge point sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    BootNotification,
    Heartbeat,
    Authorize,
    StartTransaction,
    StopTransaction,
    StatusNotification,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for Action {
    type Err = OcppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BootNotification" => Ok(Action::BootNotification),
            "Heartbeat" => Ok(Action::Heartbeat),
            "Authorize" => Ok(Action::Authorize),
            "StartTransaction" => Ok(Action::StartTransaction),
            "StopTransaction" => Ok(Action::StopTransaction),
            "StatusNotification" => Ok(Action::StatusNotification),
            _ => Err(OcppError::UnknownAction(s.to_string())),
        }
    }
}

/// Errors in OCPP message handling
#[derive(Debug, Error)]
pub enum OcppError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid message format")]
    InvalidFormat,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(i64),

    #[error("OCPP error from central system: {code:?} - {description}")]
    RemoteError {
        code: ErrorCode,
        description: String,
        details: Value,
    },

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,
}

/// OCPP CALL message (request)
#[derive(Debug, Clone)]
pub struct Call {
    pub message_id: String,
    pub action: Action,
    pub payload: Value,
}

impl Call {
    /// Create a new CALL message with auto-generated ID
    pub fn new(action: Action, payload: impl Serialize) -> Result<Self, OcppError> {
        Ok(Self {
            message_id: Uuid::new_v4().to_string(),
            action,
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Create BootNotification call
    pub fn boot_notification(request: BootNotificationRequest) -> Result<Self, OcppError> {
        Self::new(Action::BootNotification, request)
    }

    /// Create Heartbeat call
    pub fn heartbeat() -> Result<Self, OcppError> {
        Self::new(Action::Heartbeat, HeartbeatRequest {})
    }

    /// Create Authorize call
    pub fn authorize(id_tag: impl Into<String>) -> Result<Self, OcppError> {
        Self::new(
            Action::Authorize,
            AuthorizeRequest {
                id_tag: id_tag.into(),
            },
        )
    }

    /// Create StartTransaction call
    pub fn start_transaction(request: StartTransactionRequest) -> Result<Self, OcppError> {
        Self::new(Action::StartTransaction, request)
    }

    /// Create StopTransaction call
    pub fn stop_transaction(request: StopTransactionRequest) -> Result<Self, OcppError> {
        Self::new(Action::StopTransaction, request)
    }

    /// Create StatusNotification call
    pub fn status_notification(
        connector_id: i32,
        error_code: ChargePointErrorCode,
        status: ChargePointStatus,
    ) -> Result<Self, OcppError> {
        Self::new(
            Action::StatusNotification,
            StatusNotificationRequest {
                connector_id,
                error_code,
                status,
                timestamp: Some(chrono::Utc::now()),
                info: None,
            },
        )
    }

    /// Serialize to wire format: [2, messageId, action, payload]
    pub fn to_bytes(&self) -> Result<Vec<u8>, OcppError> {
        let frame = serde_json::json!([
            MessageType::Call as i32,
            &self.message_id,
            self.action.to_string(),
            &self.payload
        ]);
        Ok(serde_json::to_vec(&frame)?)
    }
}

/// OCPP CALLRESULT message (success response)
#[derive(Debug, Clone)]
pub struct CallResult {
    pub message_id: String,
    pub payload: Value,
}

impl CallResult {
    /// Serialize to wire format: [3, messageId, payload]
    pub fn to_bytes(&self) -> Result<Vec<u8>, OcppError> {
        let frame = serde_json::json!([
            MessageType::CallResult as i32,
            &self.message_id,
            &self.payload
        ]);
        Ok(serde_json::to_vec(&frame)?)
    }

    /// Parse the payload as a specific response type
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, OcppError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// OCPP CALLERROR message (error response)
#[derive(Debug, Clone)]
pub struct CallError {
    pub message_id: String,
    pub error_code: ErrorCode,
    pub error_description: String,
    pub error_details: Value,
}

impl CallError {
    /// Create a new CALLERROR message
    pub fn new(
        message_id: impl Into<String>,
        error_code: ErrorCode,
        error_description: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            error_code,
            error_description: error_description.into(),
            error_details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Serialize to wire format: [4, messageId, errorCode, errorDescription, errorDetails]
    pub fn to_bytes(&self) -> Result<Vec<u8>, OcppError> {
        let frame = serde_json::json!([
            MessageType::CallError as i32,
            &self.message_id,
            format!("{:?}", self.error_code),
            &self.error_description,
            &self.error_details
        ]);
        Ok(serde_json::to_vec(&frame)?)
    }
}

/// Parsed OCPP message (any frame kind)
#[derive(Debug, Clone)]
pub enum OcppMessage {
    Call(Call),
    CallResult(CallResult),
    CallError(CallError),
}

fn frame_str(value: &Value) -> Result<String, OcppError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(OcppError::InvalidFormat)
}

impl OcppMessage {
    /// Parse an OCPP-J frame from JSON bytes
    pub fn parse(bytes: &[u8]) -> Result<Self, OcppError> {
        let frame: Vec<Value> = serde_json::from_slice(bytes)?;
        let (kind, rest) = frame.split_first().ok_or(OcppError::InvalidFormat)?;
        let kind = kind.as_i64().ok_or(OcppError::InvalidFormat)?;

        match (kind, rest) {
            (2, [message_id, action, payload]) => Ok(OcppMessage::Call(Call {
                message_id: frame_str(message_id)?,
                action: frame_str(action)?.parse()?,
                payload: payload.clone(),
            })),
            (3, [message_id, payload]) => Ok(OcppMessage::CallResult(CallResult {
                message_id: frame_str(message_id)?,
                payload: payload.clone(),
            })),
            (4, [message_id, code, description, details]) => {
                let error_code = frame_str(code)
                    .and_then(|s| serde_json::from_value(Value::String(s)).map_err(OcppError::from))
                    .unwrap_or(ErrorCode::GenericError);

                Ok(OcppMessage::CallError(CallError {
                    message_id: frame_str(message_id)?,
                    error_code,
                    error_description: description.as_str().unwrap_or("").to_string(),
                    error_details: details.clone(),
                }))
            }
            (2..=4, _) => Err(OcppError::InvalidFormat),
            _ => Err(OcppError::UnknownMessageType(kind)),
        }
    }

    /// Get the message ID
    pub fn message_id(&self) -> &str {
        match self {
            OcppMessage::Call(c) => &c.message_id,
            OcppMessage::CallResult(r) => &r.message_id,
            OcppMessage::CallError(e) => &e.message_id,
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, OcppError> {
        match self {
            OcppMessage::Call(c) => c.to_bytes(),
            OcppMessage::CallResult(r) => r.to_bytes(),
            OcppMessage::CallError(e) => e.to_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_serialization() {
        let call = Call::authorize("FED4269").unwrap();
        let text = String::from_utf8(call.to_bytes().unwrap()).unwrap();

        assert!(text.starts_with("[2,"));
        assert!(text.contains("\"Authorize\""));
        assert!(text.contains("\"idTag\":\"FED4269\""));
    }

    #[test]
    fn test_call_parsing() {
        let json = r#"[2, "msg-7", "Heartbeat", {}]"#;
        let msg = OcppMessage::parse(json.as_bytes()).unwrap();

        match msg {
            OcppMessage::Call(call) => {
                assert_eq!(call.message_id, "msg-7");
                assert_eq!(call.action, Action::Heartbeat);
            }
            _ => panic!("Expected Call"),
        }
    }

    #[test]
    fn test_call_result_parsing() {
        let json = r#"[3, "msg-7", {"idTagInfo": {"status": "Accepted"}, "transactionId": 9}]"#;
        let msg = OcppMessage::parse(json.as_bytes()).unwrap();

        match msg {
            OcppMessage::CallResult(result) => {
                assert_eq!(result.message_id, "msg-7");
                let resp: StartTransactionResponse = result.parse_payload().unwrap();
                assert_eq!(resp.transaction_id, 9);
            }
            _ => panic!("Expected CallResult"),
        }
    }

    #[test]
    fn test_call_error_parsing() {
        let json = r#"[4, "msg-7", "NotImplemented", "Action not supported", {}]"#;
        let msg = OcppMessage::parse(json.as_bytes()).unwrap();

        match msg {
            OcppMessage::CallError(error) => {
                assert_eq!(error.message_id, "msg-7");
                assert_eq!(error.error_code, ErrorCode::NotImplemented);
            }
            _ => panic!("Expected CallError"),
        }
    }

    #[test]
    fn test_unknown_error_code_degrades_to_generic() {
        let json = r#"[4, "msg-7", "NoSuchCode", "weird", {}]"#;
        let msg = OcppMessage::parse(json.as_bytes()).unwrap();

        match msg {
            OcppMessage::CallError(error) => {
                assert_eq!(error.error_code, ErrorCode::GenericError);
            }
            _ => panic!("Expected CallError"),
        }
    }

    #[test]
    fn test_malformed_frames_rejected() {
        assert!(matches!(
            OcppMessage::parse(br#"[2, "msg-7", "Heartbeat"]"#),
            Err(OcppError::InvalidFormat)
        ));
        assert!(matches!(
            OcppMessage::parse(br#"[9, "msg-7", {}]"#),
            Err(OcppError::UnknownMessageType(9))
        ));
        assert!(matches!(
            OcppMessage::parse(br#"[2, "msg-7", "FlashFirmware", {}]"#),
            Err(OcppError::UnknownAction(_))
        ));
    }
}
