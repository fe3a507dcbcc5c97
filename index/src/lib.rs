//! Map-point index.
//!
//! A block-driven secondary index over geospatial points published through
//! unspendable data-carrier outputs, tracking subsequent ownership transfers
//! with full support for chain reorganization.

pub mod db;
pub mod error;
pub mod index;
pub mod payload;
pub mod runtime;

pub use db::{MapPointInfo, PointRecord, TransferInfo, TransferRecord};
pub use error::IndexError;
pub use index::{MapPointIndex, UndoProvider};
pub use runtime::{BlockSource, IndexRuntime};
