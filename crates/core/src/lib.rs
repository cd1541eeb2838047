//! Session-gated real-time control channel for the Zombload upload scheduler.
//!
//! The crate is organised leaves first:
//!
//! - [`session`]: authentication state and its durable marker
//! - [`supervisor`]: lifecycle of the single real-time channel, plus the
//!   [`CommandDispatcher`] that writes control intents onto it
//! - [`store`]: reducers folding channel events into derived state
//! - [`transport`]: Socket.IO-over-WebSocket transport and an in-memory fake
//! - [`panel`]: the composition root owning exactly one session and one channel
//! - [`api`]: request/response client for profiles, media and text pools
//!
//! # Example
//!
//! ```ignore
//! let config = PanelConfig::load(None)?;
//! let backend = HttpBackend::new(config.base_url()?)?;
//! let mut panel = Panel::with_http(&config, backend)?;
//!
//! panel.login("admin", "admin").await?;
//! let mut updates = panel.subscribe();
//! updates.wait_for(|snapshot| snapshot.connected).await?;
//! panel.request_start();
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod marker;
pub mod panel;
pub mod session;
pub mod store;
pub mod supervisor;
pub mod transport;

pub use api::PanelApi;
pub use auth::{AuthCollaborator, Credentials, HttpAuth, StaticAuth};
pub use config::PanelConfig;
pub use error::{Error, Result};
pub use http::HttpBackend;
pub use marker::{FileMarker, MarkerStore, MemoryMarker, SessionMarker};
pub use panel::Panel;
pub use session::{Session, SessionManager};
pub use store::{LOG_CAPACITY, LogBuffer, PanelSnapshot, SchedulerRunState, StateStore};
pub use supervisor::{ChannelPhase, ChannelSupervisor, CommandDispatcher};
pub use transport::{Backoff, Connector, TransportDriver, TransportParts};
pub use zombload_protocol as protocol;
