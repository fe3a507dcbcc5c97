//! Node-side glue: configuration, logging, the governance scheduler jobs,
//! and chain-notification dispatch.

pub mod config;
pub mod logging;
pub mod notifications;
pub mod scheduler;

pub use config::NodeConfig;
pub use logging::{init_logging, LogFormat};
pub use notifications::{ChainEvent, ChainNotificationHandler};
pub use scheduler::GovernanceScheduler;
