//! OCPP 1.6 message types
//!
//! Implements the data types for the charge-point-initiated actions:
//! - BootNotification / Heartbeat
//! - Authorize
//! - StartTransaction / StopTransaction
//! - StatusNotification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Registration status for BootNotification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RegistrationStatus {
    Accepted,
    Pending,
    Rejected,
}

/// Authorization status carried in idTagInfo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AuthorizationStatus {
    Accepted,
    Blocked,
    Expired,
    Invalid,
    ConcurrentTx,
}

/// Connector status reported in StatusNotification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePointStatus {
    Available,
    Preparing,
    Charging,
    SuspendedEVSE,
    SuspendedEV,
    Finishing,
    Reserved,
    Unavailable,
    Faulted,
}

/// Error code reported in StatusNotification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePointErrorCode {
    ConnectorLockFailure,
    EVCommunicationError,
    GroundFailure,
    HighTemperature,
    InternalError,
    LocalListConflict,
    NoError,
    OtherError,
    OverCurrentFailure,
    PowerMeterFailure,
    PowerSwitchFailure,
    ReaderFailure,
    ResetFailure,
    UnderVoltage,
    OverVoltage,
    WeakSignal,
}

/// Reason a transaction was stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    DeAuthorized,
    EmergencyStop,
    EVDisconnected,
    HardReset,
    Local,
    Other,
    PowerLoss,
    Reboot,
    Remote,
    SoftReset,
    UnlockCommand,
}

// ============================================================================
// Complex Types
// ============================================================================

/// Authorization info attached to Authorize/Start/Stop responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTagInfo {
    pub status: AuthorizationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id_tag: Option<String>,
}

impl IdTagInfo {
    /// Shorthand for the only branch the charge point cares about
    pub fn accepted(&self) -> bool {
        self.status == AuthorizationStatus::Accepted
    }
}

// ============================================================================
// Request Messages (CP -> CS)
// ============================================================================

/// BootNotification request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationRequest {
    pub charge_point_vendor: String,
    pub charge_point_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_box_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_point_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iccid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imsi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_type: Option<String>,
}

/// Heartbeat request (no payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRequest {}

/// Authorize request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    pub id_tag: String,
}

/// StartTransaction request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionRequest {
    pub connector_id: i32,
    pub id_tag: String,
    pub meter_start: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i32>,
}

/// StopTransaction request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTransactionRequest {
    pub transaction_id: i32,
    pub meter_stop: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StopReason>,
}

/// StatusNotification request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotificationRequest {
    pub connector_id: i32,
    pub error_code: ChargePointErrorCode,
    pub status: ChargePointStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

// ============================================================================
// Response Messages (CS -> CP)
// ============================================================================

/// BootNotification response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationResponse {
    pub status: RegistrationStatus,
    pub current_time: DateTime<Utc>,
    /// Heartbeat interval in seconds assigned by the central system
    pub interval: i32,
}

/// Heartbeat response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub current_time: DateTime<Utc>,
}

/// Authorize response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub id_tag_info: IdTagInfo,
}

/// StartTransaction response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionResponse {
    pub id_tag_info: IdTagInfo,
    pub transaction_id: i32,
}

/// StopTransaction response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTransactionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_tag_info: Option<IdTagInfo>,
}

/// StatusNotification response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusNotificationResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_request_wire_shape() {
        let req = BootNotificationRequest {
            charge_point_vendor: "Elektrokombinacija".to_string(),
            charge_point_model: "EK3-CP".to_string(),
            charge_box_serial_number: Some("EK3-BOX-001".to_string()),
            charge_point_serial_number: None,
            firmware_version: Some("0.1.0".to_string()),
            iccid: None,
            imsi: None,
            meter_serial_number: None,
            meter_type: None,
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"chargePointVendor\":\"Elektrokombinacija\""));
        assert!(json.contains("\"chargeBoxSerialNumber\""));
        // Absent optionals must be omitted, not null
        assert!(!json.contains("chargePointSerialNumber"));
        assert!(!json.contains("meterType"));
    }

    #[test]
    fn test_boot_response_parsing() {
        let json = r#"{"status": "Accepted", "currentTime": "2026-02-01T10:00:00Z", "interval": 300}"#;
        let resp: BootNotificationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, RegistrationStatus::Accepted);
        assert_eq!(resp.interval, 300);
    }

    #[test]
    fn test_authorize_response_parsing() {
        let json = r#"{"idTagInfo": {"status": "Accepted"}}"#;
        let resp: AuthorizeResponse = serde_json::from_str(json).unwrap();
        assert!(resp.id_tag_info.accepted());

        let json = r#"{"idTagInfo": {"status": "ConcurrentTx"}}"#;
        let resp: AuthorizeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id_tag_info.status, AuthorizationStatus::ConcurrentTx);
        assert!(!resp.id_tag_info.accepted());
    }

    #[test]
    fn test_start_transaction_round_trip() {
        let req = StartTransactionRequest {
            connector_id: 1,
            id_tag: "FED4269".to_string(),
            meter_start: 0,
            timestamp: Utc::now(),
            reservation_id: None,
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"connectorId\":1"));
        assert!(json.contains("\"idTag\":\"FED4269\""));
        assert!(!json.contains("reservationId"));

        let resp: StartTransactionResponse = serde_json::from_str(
            r#"{"idTagInfo": {"status": "Accepted"}, "transactionId": 42}"#,
        )
        .unwrap();
        assert_eq!(resp.transaction_id, 42);
    }

    #[test]
    fn test_stop_response_without_id_tag_info() {
        // Central systems may omit idTagInfo entirely
        let resp: StopTransactionResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.id_tag_info.is_none());
    }
}
