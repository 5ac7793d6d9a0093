//! Core abstractions for the tunnel controller.
//!
//! - [`Event`]: everything the controller reacts to
//! - [`Action`]: deferred work for the runner (timers, notifications)
//! - [`StateMachine`]: the synchronous, deterministic processing contract
//! - [`PathProvisioningGateway`] / [`FecRebindGateway`]: the external
//!   collaborators the controller queries and commands synchronously

mod action;
mod command;
mod event;
mod traits;

pub use action::{Action, PathSwitch, TimerId};
pub use command::{OperatorCommand, RerouteAction};
pub use event::Event;
pub use traits::{FecRebindGateway, PathProvisioningGateway, StateMachine};
