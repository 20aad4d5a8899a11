//! programma - Telegram workout program builder
//!
//! Users pick a weekly split, then exercises for every muscle subgroup.
//! The finished program is stored per user in SQLite.

pub mod bot;
pub mod catalog;
pub mod db;
pub mod error;
pub mod format;
pub mod keyboard;
pub mod template;
pub mod tui;
pub mod wizard;

pub use catalog::Catalog;
pub use db::Database;
