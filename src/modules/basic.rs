use std::fmt::Write;
use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, ParseMode};
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;

use crate::common::{filter_command, is_command, BotEnv, UpdateHandler};
use crate::formatting::language::SUPPORTED_LANGUAGES;
use crate::utils::BotExt;

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "start the conversation.")]
    Start,

    #[command(description = "display this text.")]
    Help,

    #[command(description = "show information about the bot.")]
    Info,

    #[command(description = "clear the conversation history.")]
    Clear,

    #[command(description = "show usage statistics.")]
    Stats,
}

pub fn command_handler() -> UpdateHandler {
    dptree::filter_map(filter_command::<Command>).endpoint(start)
}

/// Catch-all for commands no other handler recognized.
pub fn unknown_command_handler() -> UpdateHandler {
    dptree::filter(|msg: Message| is_command(&msg)).endpoint(unknown_command)
}

async fn start(
    bot: Bot,
    env: Arc<BotEnv>,
    msg: Message,
    command: Command,
) -> Result<()> {
    let model_name = escape(&env.config.services.openrouter.model_name);
    match command {
        Command::Start => {
            let keyboard = KeyboardMarkup::new([
                [KeyboardButton::new("/help"), KeyboardButton::new("/clear")],
                [KeyboardButton::new("/info"), KeyboardButton::new("/stats")],
            ])
            .resize_keyboard(true);
            bot.reply_message(&msg, welcome_text(&model_name))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await?;
        }
        Command::Help => {
            let mut text = escape(&Command::descriptions().to_string());
            write!(
                text,
                "\n\nSend me a message as <b>text, voice or photo</b> to \
                 start chatting. Code in answers is detected automatically \
                 and sent with copy buttons.\n\n\
                 🧠 <b>Current model:</b> {model_name}"
            )?;
            bot.reply_message(&msg, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Info => {
            bot.reply_message(&msg, info_text(&model_name))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Clear => {
            env.conversations.reset(msg.chat.id).await;
            log::info!("Conversation in {} cleared", msg.chat.id);
            bot.reply_message(&msg, "✅ Conversation history cleared!").await?;
        }
        Command::Stats => {
            let turns = env.conversations.get(msg.chat.id).await.len();
            bot.reply_message(&msg, stats_text(&model_name, turns))
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}

async fn unknown_command(bot: Bot, msg: Message) -> Result<()> {
    bot.reply_message(
        &msg,
        "❌ Unknown command. Use /help to see the list of commands.",
    )
    .await?;
    Ok(())
}

fn welcome_text(model_name: &str) -> String {
    format!(
        "🤖 <b>Welcome to OpenRouter AI!</b>\n\n\
         I'm powered by <b>{model_name}</b>.\n\n\
         🎤 Voice messages are transcribed automatically.\n\
         📷 Text on photos is recognized.\n\
         🛠 Code in answers comes with copy buttons.\n\n\
         <b>Commands:</b>\n\
         /help - show all commands\n\
         /info - information about the bot\n\
         /clear - clear the conversation history\n\
         /stats - show usage statistics\n\n\
         Just send me a message as <b>text, voice or photo</b>."
    )
}

fn info_text(model_name: &str) -> String {
    let languages = SUPPORTED_LANGUAGES.join(", ");
    format!(
        "🤖 <b>OpenRouter AI</b>\n\n\
         <b>Model:</b> {model_name}\n\
         <b>Voice messages:</b> ✅ enabled\n\
         <b>Image recognition:</b> ✅ enabled\n\
         <b>Conversation context:</b> last {} messages\n\n\
         🛠 <b>Detected languages:</b> {languages}",
        crate::conversation::MAX_TURNS,
    )
}

fn stats_text(model_name: &str, turns: usize) -> String {
    format!(
        "📊 <b>Current settings:</b>\n\n\
         • <b>Model:</b> {model_name}\n\
         • <b>Conversation context:</b> <code>{turns}</code>\n\
         • <b>Voice messages:</b> ✅ enabled\n\
         • <b>Image recognition:</b> ✅ enabled"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_parsed() {
        assert!(matches!(Command::parse("/start", "bot"), Ok(Command::Start)));
        assert!(matches!(
            Command::parse("/clear@bot", "bot"),
            Ok(Command::Clear)
        ));
        assert!(Command::parse("/unknown", "bot").is_err());
    }

    #[test]
    fn stats_show_log_length() {
        let text = stats_text("Test Model", 5);
        assert!(text.contains("<code>5</code>"));
        assert!(text.contains("Test Model"));
    }

    #[test]
    fn info_lists_detected_languages() {
        let text = info_text("Test Model");
        assert!(text.contains("python"));
        assert!(text.contains("markdown"));
    }
}
