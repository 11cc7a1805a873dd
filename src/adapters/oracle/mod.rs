//! HTTP adapter for the inference oracle.

pub mod client;
pub mod retry;

pub use client::OracleClient;
pub use retry::RetryPolicy;
