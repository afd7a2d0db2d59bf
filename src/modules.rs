//! Modules that define the bot's functionality.

pub mod basic;
pub mod chat;
pub mod copy_buttons;
pub mod media;
