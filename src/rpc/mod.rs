//! The RPC front end: album procedures carried over RESP frames on a plain TCP socket.

pub mod client;
pub mod procedures;
pub mod server;
pub mod wire;

pub use client::{ClientError, RpcClient};
pub use server::RpcServer;
