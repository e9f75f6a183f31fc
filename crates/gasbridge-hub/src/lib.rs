//! Hub actor for the gas-monitor bridge.
//!
//! A single task owns the device state, the notification history, the live
//! client set and the reconnect supervisor. Everything else talks to it
//! through a `HubHandle`.

pub mod clients;
pub mod envelope;
pub mod error;
pub mod event;
pub mod handle;
pub mod task;

pub use clients::LiveClientSet;
pub use envelope::Envelope;
pub use error::{HubError, HubResult};
pub use event::{ClientId, HubEvent, HubHealth, Query};
pub use handle::{ClientSession, HubHandle};
pub use task::{spawn_hub, HubConfig, HubTask};
