//! Installation reconciliation: per-team idempotent install and batch fan-out.

pub mod fanout;
pub mod installer;

pub use fanout::{FanOutCoordinator, InstallErrorStream, TeamStatus};
pub use installer::IdempotentInstaller;
