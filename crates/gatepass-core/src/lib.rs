//! Visitor pass lifecycle engine and reactive client state.
//!
//! This crate owns the logic with a precise contract: generating access
//! codes, fixing expiry, encoding the QR payload, and deriving a live
//! countdown from an absolute expiry instant.
//!
//! - **[`lifecycle`]**: Pure functions: code generator, expiry calculator,
//!   QR payload encoder/renderer, countdown and urgency tiers.
//!
//! - **[`PassManager`]**: Session facade. [`connect()`](PassManager::connect)
//!   builds the REST client and spawns the shared ticker, the 30-second
//!   expiry sweep, the optional background refresh, and the command
//!   processor. [`PassManager::oneshot()`] suits single CLI invocations.
//!
//! - **[`PassStore`]**: `DashMap` + `watch` storage holding the displayed
//!   passes. Optimistic local changes, reconciled against the backend.
//!
//! - **[`Ticker`]**: One timer, many subscribers. Every displayed pass
//!   recomputes `expiresAt - now` on each tick; nothing is decremented.
//!
//! Client-side expiry is cosmetic. The backend decides validity at the gate.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod store;
pub mod stream;
pub mod ticker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{ClientConfig, TlsVerification};
pub use controller::{ConnectionState, PassManager};
pub use error::CoreError;
pub use lifecycle::{CountdownView, PassPayload, Phase, QrImage, UrgencyTier};
pub use model::{PassId, PassStatus, Role, UserContext, Verification, VisitorPass};
pub use store::{PassStore, ReconcileReport};
pub use stream::PassStream;
pub use ticker::{Clock, ManualClock, SystemClock, TickReceiver, Ticker};
