//! Commands module - service layer for tunnel access operations

mod apply;
mod destroy;
pub(crate) mod service;

pub use service::{RunReport, TunnelAccessService};
