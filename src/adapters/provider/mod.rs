//! HTTP adapter for the external game source.

pub mod client;

pub use client::HttpGameProvider;
