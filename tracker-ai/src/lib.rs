//! Generative-AI access for the daily tracker.
//!
//! `KeyRing` rotates API keys round-robin and benches a failing key for a
//! cooldown (60 seconds by default); `GenerativeClient` uses it to fail over
//! between keys on rate limits and server errors.

pub mod client;
pub mod keys;

pub use client::{AiError, GenerativeClient};
pub use keys::{KeyLease, KeyRing, DEFAULT_COOLDOWN};
