//! Core types for the tunnel failover controller.
//!
//! Identifiers, candidate path descriptors, provisioning status, and the
//! configuration error taxonomy shared by every other crate.

mod error;
mod identifiers;
mod path;
mod status;

pub use error::ConfigError;
pub use identifiers::{FecId, Label, LspId, TunnelId};
pub use path::{CandidatePath, SenderDescriptor, SessionDescriptor};
pub use status::{FecBinding, PathState, PathStatus};
