// gatepass-api: Async Rust client for the visitor pass REST backend

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
mod passes;
pub mod transport;

pub use client::PassClient;
pub use error::Error;
pub use models::{CreatePassRequest, PassRecord, VerifyResponse};
pub use transport::{TlsMode, TransportConfig};
