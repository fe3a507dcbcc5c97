//! JSON/RPC surface for map points and governance status.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcContext, RpcServer};
