//! OCPP 1.6 protocol layer
//!
//! - `types`: OCPP message types and data structures
//! - `messages`: OCPP-J framing (CALL, CALLRESULT, CALLERROR)
//! - `channel`: call-and-wait channel trait and its WebSocket implementation
//! - `session`: per-connection session state

pub mod channel;
pub mod messages;
pub mod session;
pub mod types;

pub use channel::{build_ws_url, ProtocolChannel, WsChannel};
pub use messages::*;
pub use session::{ActiveTransaction, RegistrationState, Session};
pub use types::*;
