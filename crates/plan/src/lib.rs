//! Static tunnel plan.
//!
//! This crate provides the [`TunnelPlan`]: the ordered candidate path table
//! for every tunnel, plus the [`TunnelLspIndex`] reverse lookup derived from
//! it. Both are built once from [`PlanConfig`] at startup and never change.
//!
//! # Components
//!
//! - [`TunnelPlan`] - Per-tunnel ordered candidate paths (primary first)
//! - [`TunnelLspIndex`] - tunnel → (lspId → position)
//! - [`PlanConfig`] - TOML configuration surface

mod config;
mod index;
mod plan;

pub use config::{PathConfig, PlanConfig, TunnelConfig};
pub use index::TunnelLspIndex;
pub use plan::{TunnelPlan, PRIMARY_INDEX};
