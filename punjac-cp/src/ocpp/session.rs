//! Charge point session state
//!
//! One `Session` per connection, shared behind `Arc<RwLock<_>>` by the boot,
//! heartbeat and charging tasks. The charging phase is mutated only from the
//! authorization state machine; the boot task touches only the registration
//! fields.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Outcome of the boot handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// BootNotification not yet answered
    Unregistered,
    /// Central system accepted the station
    Accepted,
    /// Central system refused the station
    Rejected,
}

/// The open energy-delivery transaction
#[derive(Debug, Clone)]
pub struct ActiveTransaction {
    /// Transaction id assigned by the central system
    pub transaction_id: i32,
    /// Tag that opened the transaction
    pub id_tag: String,
    /// Meter register at start (Wh)
    pub meter_start: i32,
    pub started_at: DateTime<Utc>,
}

/// Charging phase. The open transaction lives inside the `Charging`
/// variant: a transaction id exists iff the station is charging.
#[derive(Debug, Clone)]
enum ChargePhase {
    Idle,
    Charging(ActiveTransaction),
}

/// Session state for one connection to the central system
#[derive(Debug)]
pub struct Session {
    registration: RegistrationState,
    heartbeat_interval: Duration,
    phase: ChargePhase,
    meter_wh: i32,
}

impl Session {
    /// Create a session with the configured heartbeat cadence
    pub fn new(heartbeat_interval: Duration) -> Self {
        Self {
            registration: RegistrationState::Unregistered,
            heartbeat_interval,
            phase: ChargePhase::Idle,
            meter_wh: 0,
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn registration(&self) -> RegistrationState {
        self.registration
    }

    /// Record an accepted registration; a positive server interval replaces
    /// the configured heartbeat cadence
    pub fn registration_accepted(&mut self, interval_secs: i32) {
        self.registration = RegistrationState::Accepted;
        if interval_secs > 0 {
            self.heartbeat_interval = Duration::from_secs(interval_secs as u64);
        }
        info!(
            "Registered with central system, heartbeat interval: {}s",
            self.heartbeat_interval.as_secs()
        );
    }

    pub fn registration_rejected(&mut self) {
        self.registration = RegistrationState::Rejected;
        warn!("Central system rejected the registration");
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    // ------------------------------------------------------------------
    // Charging phase
    // ------------------------------------------------------------------

    pub fn charging(&self) -> bool {
        matches!(self.phase, ChargePhase::Charging(_))
    }

    pub fn transaction(&self) -> Option<&ActiveTransaction> {
        match &self.phase {
            ChargePhase::Idle => None,
            ChargePhase::Charging(tx) => Some(tx),
        }
    }

    pub fn transaction_id(&self) -> Option<i32> {
        self.transaction().map(|tx| tx.transaction_id)
    }

    /// Open a transaction; called once the central system has accepted
    /// StartTransaction
    pub fn begin_transaction(&mut self, transaction_id: i32, id_tag: &str, meter_start: i32) {
        if let ChargePhase::Charging(old) = &self.phase {
            warn!(
                "Transaction {} still open, replacing with {}",
                old.transaction_id, transaction_id
            );
        }

        self.phase = ChargePhase::Charging(ActiveTransaction {
            transaction_id,
            id_tag: id_tag.to_string(),
            meter_start,
            started_at: Utc::now(),
        });
    }

    /// Close the open transaction and return it
    pub fn end_transaction(&mut self) -> Option<ActiveTransaction> {
        match std::mem::replace(&mut self.phase, ChargePhase::Idle) {
            ChargePhase::Idle => None,
            ChargePhase::Charging(tx) => Some(tx),
        }
    }

    // ------------------------------------------------------------------
    // Meter
    // ------------------------------------------------------------------

    /// Current energy register (Wh)
    pub fn meter_reading(&self) -> i32 {
        self.meter_wh
    }

    /// Advance the energy register; driven from outside the core
    pub fn add_energy(&mut self, wh: i32) {
        self.meter_wh += wh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_adopts_server_interval() {
        let mut session = Session::new(Duration::from_secs(10));
        assert_eq!(session.registration(), RegistrationState::Unregistered);

        session.registration_accepted(300);
        assert_eq!(session.registration(), RegistrationState::Accepted);
        assert_eq!(session.heartbeat_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_registration_keeps_interval_when_server_sends_zero() {
        let mut session = Session::new(Duration::from_secs(10));
        session.registration_accepted(0);
        assert_eq!(session.heartbeat_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_transaction_id_present_iff_charging() {
        let mut session = Session::new(Duration::from_secs(10));
        assert!(!session.charging());
        assert_eq!(session.transaction_id(), None);

        session.begin_transaction(7, "FED4269", 0);
        assert!(session.charging());
        assert_eq!(session.transaction_id(), Some(7));

        let tx = session.end_transaction().unwrap();
        assert_eq!(tx.transaction_id, 7);
        assert_eq!(tx.id_tag, "FED4269");
        assert!(!session.charging());
        assert_eq!(session.transaction_id(), None);
    }

    #[test]
    fn test_end_transaction_while_idle_is_none() {
        let mut session = Session::new(Duration::from_secs(10));
        assert!(session.end_transaction().is_none());
        assert!(!session.charging());
    }

    #[test]
    fn test_meter_register() {
        let mut session = Session::new(Duration::from_secs(10));
        assert_eq!(session.meter_reading(), 0);

        session.add_energy(11);
        session.add_energy(11);
        assert_eq!(session.meter_reading(), 22);
    }
}
