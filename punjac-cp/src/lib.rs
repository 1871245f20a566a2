//! # PUNJAC Charge Point
//!
//! OCPP 1.6 charge point client for the PUNJAC charging stack.
//!
//! The crate implements the client side of the charging session lifecycle: a
//! station registers with the central system, keeps the connection alive with
//! heartbeats, and opens/closes energy-delivery transactions gated on remote
//! authorization decisions.
//!
//! ## Architecture
//!
//! ```text
//! Central System (backend)
//!       │ WebSocket, OCPP 1.6-J
//!       ▼
//! ┌──────────────────────────────────────┐
//! │  WsChannel                           │
//! │  framing + request/response matching │
//! └──────┬───────────┬───────────┬───────┘
//!        │           │           │
//!   ┌────▼────┐ ┌────▼────┐ ┌────▼─────┐
//!   │  Boot   │ │Heartbeat│ │ Session  │
//!   │sequence │ │  loop   │ │  loop    │
//!   └────┬────┘ └────┬────┘ └────┬─────┘
//!        └───────────┴───────────┘
//!                    │
//!            Arc<RwLock<Session>>
//! ```
//!
//! The three tasks run concurrently over one channel. The session loop is
//! the only writer of the charging phase: each accepted authorization
//! toggles between StartTransaction and StopTransaction.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use punjac_cp::{ChargePoint, ChargePointConfig, FixedDelayTagSource, WsChannel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChargePointConfig::new("EK3-001", "ws://localhost:8180/steve/websocket/CentralSystemService");
//!
//!     let channel = WsChannel::connect(&config.csms_url, &config.station_id, config.request_timeout).await?;
//!     let charge_point = ChargePoint::new(config, channel);
//!
//!     let tags = FixedDelayTagSource::new("FED4269", Duration::from_secs(5));
//!     charge_point.run(tags).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod charge_point;
pub mod config;
pub mod ocpp;

pub use charge_point::{ChargePoint, FixedDelayTagSource, IdTagSource};
pub use config::ChargePointConfig;

// Re-export key types
pub use ocpp::{
    AuthorizationStatus, Call, CallResult, OcppError, ProtocolChannel, RegistrationState,
    RegistrationStatus, Session, WsChannel,
};
