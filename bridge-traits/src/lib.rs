//! # Host Bridge Traits
//!
//! Host capability traits that the PVR core consumes but does not implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the player core and the host
//! application embedding it. Each trait represents a capability the core
//! requires but that the host owns.
//!
//! ## Traits
//!
//! - [`SettingsStore`](settings::SettingsStore) - Boolean preference lookups
//!   (e.g. whether radio RDS decoding is enabled)
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Host
//! implementations should convert their own storage or transport errors into
//! `BridgeError` with an actionable message.
//!
//! ## Thread Safety
//!
//! On native targets bridge traits require `Send + Sync` (see
//! [`platform`]) because the player reads them from its demux thread.

pub mod error;
pub mod platform;
pub mod settings;

pub use error::BridgeError;

pub use platform::{PlatformSend, PlatformSendSync};
pub use settings::{MemorySettingsStore, SettingsStore};
