//! Charge point configuration
//!
//! Station identity for BootNotification plus the knobs of the three
//! orchestration tasks.

use std::time::Duration;

use crate::ocpp::BootNotificationRequest;

/// Complete charge point configuration
#[derive(Debug, Clone)]
pub struct ChargePointConfig {
    /// Central system WebSocket URL (without station ID)
    pub csms_url: String,

    /// Station ID (appended to URL)
    pub station_id: String,

    /// Vendor name for BootNotification
    pub vendor: String,

    /// Model name for BootNotification
    pub model: String,

    /// Charge box serial number (optional)
    pub charge_box_serial: Option<String>,

    /// Charge point serial number (optional)
    pub charge_point_serial: Option<String>,

    /// Firmware version (optional)
    pub firmware_version: Option<String>,

    /// SIM card ICCID (optional)
    pub iccid: Option<String>,

    /// SIM card IMSI (optional)
    pub imsi: Option<String>,

    /// Energy meter serial number (optional)
    pub meter_serial: Option<String>,

    /// Energy meter type (optional)
    pub meter_type: Option<String>,

    /// Connector used for transactions
    pub connector_id: i32,

    /// Heartbeat cadence until the central system assigns one
    pub heartbeat_interval: Duration,

    /// Request timeout
    pub request_timeout: Duration,

    /// Only the tag that opened a transaction may close it
    pub require_matching_tag: bool,
}

impl Default for ChargePointConfig {
    fn default() -> Self {
        Self {
            csms_url: "ws://localhost:8180/steve/websocket/CentralSystemService".to_string(),
            station_id: "EK3-001".to_string(),
            vendor: "Elektrokombinacija".to_string(),
            model: "EK3-CP".to_string(),
            charge_box_serial: None,
            charge_point_serial: None,
            firmware_version: Some("0.1.0".to_string()),
            iccid: None,
            imsi: None,
            meter_serial: None,
            meter_type: None,
            connector_id: 1,
            heartbeat_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            require_matching_tag: false,
        }
    }
}

impl ChargePointConfig {
    /// Create config with basic parameters
    pub fn new(station_id: impl Into<String>, csms_url: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            csms_url: csms_url.into(),
            ..Default::default()
        }
    }

    /// Set vendor info
    pub fn with_vendor(mut self, vendor: impl Into<String>, model: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self.model = model.into();
        self
    }

    /// Set serial numbers
    pub fn with_serials(
        mut self,
        charge_box: impl Into<String>,
        charge_point: impl Into<String>,
    ) -> Self {
        self.charge_box_serial = Some(charge_box.into());
        self.charge_point_serial = Some(charge_point.into());
        self
    }

    /// Set firmware version
    pub fn with_firmware(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = Some(version.into());
        self
    }

    /// Set SIM identity
    pub fn with_sim(mut self, iccid: impl Into<String>, imsi: impl Into<String>) -> Self {
        self.iccid = Some(iccid.into());
        self.imsi = Some(imsi.into());
        self
    }

    /// Set energy meter identity
    pub fn with_meter(mut self, serial: impl Into<String>, meter_type: impl Into<String>) -> Self {
        self.meter_serial = Some(serial.into());
        self.meter_type = Some(meter_type.into());
        self
    }

    /// Set heartbeat cadence
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Require the opening tag to close the transaction
    pub fn with_matching_tag_required(mut self) -> Self {
        self.require_matching_tag = true;
        self
    }

    /// Assemble the BootNotification payload from the identity fields
    pub fn boot_request(&self) -> BootNotificationRequest {
        BootNotificationRequest {
            charge_point_vendor: self.vendor.clone(),
            charge_point_model: self.model.clone(),
            charge_box_serial_number: self.charge_box_serial.clone(),
            charge_point_serial_number: self.charge_point_serial.clone(),
            firmware_version: self.firmware_version.clone(),
            iccid: self.iccid.clone(),
            imsi: self.imsi.clone(),
            meter_serial_number: self.meter_serial.clone(),
            meter_type: self.meter_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ChargePointConfig::new("CP_3", "ws://localhost:9000")
            .with_vendor("Elektrokombinacija", "EK3-CP")
            .with_serials("EK3-BOX-001", "EK3-CP-001")
            .with_sim("FED42", "1234ABCD")
            .with_heartbeat_interval(Duration::from_secs(5));

        assert_eq!(config.station_id, "CP_3");
        assert_eq!(config.csms_url, "ws://localhost:9000");
        assert_eq!(config.vendor, "Elektrokombinacija");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert!(!config.require_matching_tag);
    }

    #[test]
    fn test_boot_request_carries_identity() {
        let config = ChargePointConfig::default()
            .with_serials("EK3-BOX-001", "EK3-CP-001")
            .with_meter("1A2B3C4D", "iskra-wm3");

        let req = config.boot_request();
        assert_eq!(req.charge_point_vendor, "Elektrokombinacija");
        assert_eq!(req.charge_box_serial_number.as_deref(), Some("EK3-BOX-001"));
        assert_eq!(req.meter_type.as_deref(), Some("iskra-wm3"));
        assert!(req.iccid.is_none());
    }
}
