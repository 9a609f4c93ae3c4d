//! Workspace placeholder crate.
//!
//! This crate exists to expose a feature flag that maps to the PVR core crate.
//! Host players can depend on `pvr-workspace` and enable `pvr` without wiring
//! `core-pvr` individually.

#[cfg(feature = "pvr")]
pub use core_pvr as pvr;
