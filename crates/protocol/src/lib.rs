//! Wire types for the Zombload scheduler service.
//!
//! This crate contains the serde-serializable types exchanged with the
//! scheduler backend, both over the real-time Socket.IO channel and over the
//! request/response REST API. These types represent the "protocol layer": the
//! shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond (de)serialization and framing
//! * 1:1 with the backend: event names and field names are the wire contract
//! * Stable: Changes only when the backend protocol changes
//!
//! Session handling, channel supervision and derived state live in
//! `zombload-core`.

pub mod api;
pub mod events;
pub mod packet;

pub use api::*;
pub use events::*;
pub use packet::{OpenHandshake, Packet, PacketError, SocketPacket};
