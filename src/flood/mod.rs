//! Flood detection and mitigation.
//!
//! - `store` - in-memory burst counters per (chat, user)
//! - `evaluator` - decides Ignore / Continue / Breach for each message
//! - `action` - turns a breach into moderation calls
//! - `provider` - where per-chat settings come from

pub mod action;
pub mod evaluator;
pub mod provider;
pub mod store;

pub use action::{ActionDispatcher, ModerationClient, Offender};
pub use evaluator::{Decision, FloodEvaluator};
pub use provider::SettingsProvider;
pub use store::FloodCounterStore;
