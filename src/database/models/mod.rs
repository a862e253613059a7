//! Database model exports.

pub mod antiflood;

pub use antiflood::{FloodAction, FloodSettings, FloodSettingsRecord, SettingsUpdate};
