//! tunebot - Telegram front end of tunerelay
//!
//! - `cli`: command line arguments
//! - `telegram`: bot construction, update handlers, the teloxide `Messenger`
//! - `console`: a `Messenger` printing to the terminal, for one-off downloads

pub mod cli;
pub mod console;
pub mod telegram;
