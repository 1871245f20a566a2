//! Charge point orchestration
//!
//! Three long-running tasks share one channel and one session for the
//! lifetime of the connection:
//! - boot sequence: registration handshake, runs once
//! - heartbeat loop: periodic liveness signal
//! - session loop: authorization-gated transaction toggle
//!
//! Only the session loop mutates the charging phase; the boot sequence
//! touches the registration fields. A channel failure in any task propagates
//! out of `run` and tears the charge point down; remote rejections are
//! ordinary branches and never faults.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ChargePointConfig;
use crate::ocpp::{
    Call, ChargePointErrorCode, ChargePointStatus, OcppError, ProtocolChannel, RegistrationStatus,
    Session, StartTransactionRequest, StopTransactionRequest,
};
use crate::ocpp::{
    AuthorizeResponse, BootNotificationResponse, HeartbeatResponse, StartTransactionResponse,
    StopReason, StopTransactionResponse,
};

/// Provider of the next credential presented at the station
pub trait IdTagSource: Send + 'static {
    /// Wait for the next tag (card swipe, app action, ...)
    fn next_tag(&mut self) -> impl Future<Output = String> + Send;
}

/// Stand-in for a real input device: a fixed tag on a fixed cadence
pub struct FixedDelayTagSource {
    tag: String,
    delay: Duration,
}

impl FixedDelayTagSource {
    pub fn new(tag: impl Into<String>, delay: Duration) -> Self {
        Self {
            tag: tag.into(),
            delay,
        }
    }
}

impl IdTagSource for FixedDelayTagSource {
    async fn next_tag(&mut self) -> String {
        tokio::time::sleep(self.delay).await;
        self.tag.clone()
    }
}

/// An OCPP 1.6 charge point bound to one channel
pub struct ChargePoint<C: ProtocolChannel> {
    config: ChargePointConfig,
    channel: C,
    session: Arc<RwLock<Session>>,
}

impl<C: ProtocolChannel> ChargePoint<C> {
    /// Create a charge point over an established channel
    pub fn new(config: ChargePointConfig, channel: C) -> Self {
        let session = Arc::new(RwLock::new(Session::new(config.heartbeat_interval)));
        Self {
            config,
            channel,
            session,
        }
    }

    /// Shared handle to the session state
    pub fn session(&self) -> Arc<RwLock<Session>> {
        self.session.clone()
    }

    /// Run the boot sequence, heartbeat loop and session loop until the
    /// first channel failure
    pub async fn run<S: IdTagSource>(&self, tags: S) -> Result<(), OcppError> {
        tokio::try_join!(
            async {
                self.boot_sequence().await?;
                Ok::<(), OcppError>(())
            },
            self.heartbeat_loop(),
            self.session_loop(tags),
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Boot sequence
    // ------------------------------------------------------------------

    /// Registration handshake. A refused registration is recorded and
    /// reported through the returned status, not as an error; the other
    /// tasks keep running.
    pub async fn boot_sequence(&self) -> Result<RegistrationStatus, OcppError> {
        let call = Call::boot_notification(self.config.boot_request())?;
        let result = self.channel.call(call).await?;
        let response: BootNotificationResponse = result.parse_payload()?;

        match response.status {
            RegistrationStatus::Accepted => {
                info!("Connected to central system");
                self.session
                    .write()
                    .await
                    .registration_accepted(response.interval);
                self.report_status(ChargePointStatus::Available).await?;
            }
            status => {
                warn!("Central system refused the registration: {:?}", status);
                self.session.write().await.registration_rejected();
            }
        }

        Ok(response.status)
    }

    /// Report connector status to the central system
    async fn report_status(&self, status: ChargePointStatus) -> Result<(), OcppError> {
        let call = Call::status_notification(
            self.config.connector_id,
            ChargePointErrorCode::NoError,
            status,
        )?;
        self.channel.call(call).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Heartbeat loop
    // ------------------------------------------------------------------

    /// Send a heartbeat, sleep, repeat. Any channel failure terminates the
    /// loop immediately; restart policy belongs to the caller.
    pub async fn heartbeat_loop(&self) -> Result<(), OcppError> {
        loop {
            let result = self.channel.call(Call::heartbeat()?).await?;
            let response: HeartbeatResponse = result.parse_payload()?;
            debug!("Heartbeat acknowledged at {}", response.current_time);

            let interval = self.session.read().await.heartbeat_interval();
            tokio::time::sleep(interval).await;
        }
    }

    // ------------------------------------------------------------------
    // Session state machine
    // ------------------------------------------------------------------

    /// Feed every tag from the source into `authorize`
    pub async fn session_loop<S: IdTagSource>(&self, mut tags: S) -> Result<(), OcppError> {
        loop {
            let id_tag = tags.next_tag().await;
            self.authorize(&id_tag).await?;
        }
    }

    /// Authorize a tag and toggle the charging session: an accepted tag
    /// starts a transaction while idle and stops the open one while
    /// charging. Returns the transaction id when one was started.
    pub async fn authorize(&self, id_tag: &str) -> Result<Option<i32>, OcppError> {
        let result = self.channel.call(Call::authorize(id_tag)?).await?;
        let response: AuthorizeResponse = result.parse_payload()?;

        if !response.id_tag_info.accepted() {
            info!(
                "Authorization unsuccessful for {}: {:?}",
                id_tag, response.id_tag_info.status
            );
            return Ok(None);
        }

        info!("Authorization successful for {}", id_tag);

        let open_tag = {
            let session = self.session.read().await;
            session.transaction().map(|tx| tx.id_tag.clone())
        };

        match open_tag {
            None => self.start_transaction(id_tag).await,
            Some(opened_by) => {
                if self.config.require_matching_tag && opened_by != id_tag {
                    warn!(
                        "Tag {} may not stop the transaction opened by {}",
                        id_tag, opened_by
                    );
                    return Ok(None);
                }
                self.stop_transaction().await?;
                Ok(None)
            }
        }
    }

    /// Ask the central system to open a transaction
    async fn start_transaction(&self, id_tag: &str) -> Result<Option<i32>, OcppError> {
        let meter_start = self.session.read().await.meter_reading();
        let call = Call::start_transaction(StartTransactionRequest {
            connector_id: self.config.connector_id,
            id_tag: id_tag.to_string(),
            meter_start,
            timestamp: Utc::now(),
            reservation_id: None,
        })?;

        let result = self.channel.call(call).await?;
        let response: StartTransactionResponse = result.parse_payload()?;

        if !response.id_tag_info.accepted() {
            warn!(
                "Central system refused to start a transaction: {:?}",
                response.id_tag_info.status
            );
            return Ok(None);
        }

        self.session
            .write()
            .await
            .begin_transaction(response.transaction_id, id_tag, meter_start);
        info!("Charging started, transaction {}", response.transaction_id);

        Ok(Some(response.transaction_id))
    }

    /// Close the open transaction. The charging phase clears whatever the
    /// response status says; a non-accepted idTagInfo is logged as a
    /// warning.
    async fn stop_transaction(&self) -> Result<(), OcppError> {
        let (tx, meter_stop) = {
            let session = self.session.read().await;
            match session.transaction().cloned() {
                Some(tx) => (tx, session.meter_reading()),
                None => {
                    warn!("No open transaction to stop");
                    return Ok(());
                }
            }
        };

        let call = Call::stop_transaction(StopTransactionRequest {
            transaction_id: tx.transaction_id,
            meter_stop,
            timestamp: Utc::now(),
            id_tag: Some(tx.id_tag.clone()),
            reason: Some(StopReason::Local),
        })?;

        let result = self.channel.call(call).await?;
        let response: StopTransactionResponse = result.parse_payload()?;

        if let Some(info) = response.id_tag_info {
            if !info.accepted() {
                warn!("Central system flagged the stop: {:?}", info.status);
            }
        }

        if let Some(closed) = self.session.write().await.end_transaction() {
            info!(
                "Charging stopped, transaction {}, energy {} Wh",
                closed.transaction_id,
                meter_stop - closed.meter_start
            );
        }

        Ok(())
    }
}
