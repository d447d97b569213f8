//! Visitor pass lifecycle: code generation, expiry arithmetic, QR payloads,
//! and countdown derivation.
//!
//! The pieces compose linearly: [`code::generate_code`] →
//! [`expiry::expires_at`] → [`qr::PassPayload`] / [`qr::render`] →
//! [`countdown::countdown`] on every tick. All of it is pure and local.

pub mod code;
pub mod countdown;
pub mod expiry;
pub mod qr;

pub use code::{CODE_ALPHABET, DEFAULT_CODE_LENGTH, generate_code, generate_code_with, normalize_code};
pub use countdown::{
    CountdownTracker, CountdownView, EXPIRED_LABEL, Phase, UrgencyTier, countdown, countdown_stream,
    countdown_str, format_remaining, urgency_tier, view_for_secs,
};
pub use expiry::{
    PASS_VALIDITY_SECS, expires_at, format_instant, is_expired, parse_instant, remaining,
    remaining_secs,
};
pub use qr::{PassPayload, QrError, QrImage, render, render_payload};
