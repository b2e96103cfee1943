//! Telegram integration: bot construction, update handlers, messenger

pub mod bot;
pub mod handlers;
pub mod messenger;

/// Bot type used throughout the crate
pub type Bot = teloxide::Bot;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{extract_first_url, schema, HandlerDeps, HandlerError};
pub use messenger::{build_file_url, TelegramMessenger};
