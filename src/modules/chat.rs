//! Relaying user messages to the model and rendering its answers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::common::{is_command, BotEnv, UpdateHandler};
use crate::conversation::{ConversationStore, ConversationTurn};
use crate::formatting::{plan, segment, CodeAction, RenderInstruction};
use crate::services::discord::{self, LogEntry};
use crate::services::{Completion, CompletionError};
use crate::utils::{
    split_long_message, with_liveness, BotExt, ResultExt, LIVENESS_INTERVAL,
    TELEGRAM_MESSAGE_LIMIT,
};

/// Code is escaped for MarkdownV2, which may double its length.
const CODE_CHUNK_LIMIT: usize = TELEGRAM_MESSAGE_LIMIT / 2 - 64;

const GENERIC_FAILURE: &str =
    "❌ An unexpected error occurred. Please try again.";

pub fn message_handler() -> UpdateHandler {
    dptree::filter(|msg: Message| msg.text().is_some() && !is_command(&msg))
        .endpoint(handle_text)
}

async fn handle_text(bot: Bot, env: Arc<BotEnv>, msg: Message) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    crate::metrics::record_message("text");
    if let Err(e) = respond(&bot, &env, &msg, text.to_string()).await {
        handle_event_error(&bot, &msg, &e).await;
    }
    Ok(())
}

/// Log an error that ended the processing of a message and tell the user.
pub async fn handle_event_error(bot: &Bot, msg: &Message, error: &anyhow::Error) {
    log::error!("Failed to process message in chat {}: {error:?}", msg.chat.id);
    bot.send_message(msg.chat.id, GENERIC_FAILURE)
        .await
        .log_error("Failed to report failure");
}

/// Run one user turn: ask the model while showing the typing indicator, then
/// send the answer.
pub async fn respond(
    bot: &Bot,
    env: &BotEnv,
    msg: &Message,
    request: String,
) -> Result<()> {
    let chat_id = msg.chat.id;
    log::info!("User message in {chat_id}: {request}");
    bot.typing(chat_id).await.log_warn("Failed to send typing action");

    let result = with_liveness(
        LIVENESS_INTERVAL,
        move || async move {
            bot.typing(chat_id).await.log_warn("Failed to send typing action");
        },
        converse(
            &env.conversations,
            &env.openrouter,
            chat_id,
            request.clone(),
            Duration::from_secs(env.config.services.openrouter.timeout_secs),
        ),
    )
    .await;

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            log::error!("Completion failed in {chat_id}: {e}");
            crate::metrics::record_completion(e.kind());
            bot.send_message(chat_id, e.user_message()).await?;
            return Ok(());
        }
    };
    crate::metrics::record_completion("ok");

    deliver(bot, chat_id, &answer).await;

    if let Some(config) = &env.config.services.discord {
        let entry = LogEntry {
            user: msg.from().map_or_else(
                || format!("ChatID: {chat_id}"),
                |u| discord::user_link(u.username.as_deref(), u.id.0),
            ),
            model_name: env.config.services.openrouter.model_name.clone(),
            request,
            response: answer,
        };
        let http = env.reqwest_client.clone();
        let webhook_url = config.webhook_url.clone();
        tokio::spawn(async move {
            discord::notify(&http, &webhook_url, &entry)
                .await
                .log_error("Failed to send conversation log");
        });
    }
    Ok(())
}

/// Record the user turn, complete the conversation and record the answer.
///
/// The chat's log stays locked for the whole exchange. On failure the user
/// turn is kept and no assistant turn is added.
pub async fn converse<C: Completion>(
    store: &ConversationStore,
    completion: &C,
    chat_id: ChatId,
    request: String,
    timeout: Duration,
) -> Result<String, CompletionError> {
    let mut log = store.session(chat_id).await;
    log.push(ConversationTurn::user(request));

    let answer =
        match tokio::time::timeout(timeout, completion.complete(log.turns()))
            .await
        {
            Ok(result) => result?,
            Err(_) => return Err(CompletionError::Timeout),
        };

    log.push(ConversationTurn::assistant(answer.clone()));
    Ok(answer)
}

/// Send a model answer as a sequence of text and code messages. Each message
/// is sent independently; failures are logged and skipped.
async fn deliver(bot: &Bot, chat_id: ChatId, answer: &str) {
    let instructions = plan(segment(answer));
    log::info!("Sending {} message parts to {chat_id}", instructions.len());

    for instruction in instructions {
        match instruction {
            RenderInstruction::SendText(text) => {
                for part in split_long_message(&text, TELEGRAM_MESSAGE_LIMIT) {
                    bot.send_message(chat_id, part)
                        .await
                        .log_error("Failed to send text part");
                }
            }
            RenderInstruction::SendCode { content, language, actions } => {
                log::debug!("Sending {language} code to {chat_id}");
                let keyboard = code_keyboard(&actions);
                for part in split_long_message(&content, CODE_CHUNK_LIMIT) {
                    let sent = bot
                        .send_code(chat_id, &part, &language, keyboard.clone())
                        .await;
                    if let Err(e) = sent {
                        log::warn!("Failed to send code block, sending as text: {e}");
                        bot.send_message(chat_id, part)
                            .await
                            .log_error("Failed to send code part");
                    }
                }
            }
        }
    }
}

fn code_keyboard(actions: &[CodeAction]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([actions
        .iter()
        .map(|a| InlineKeyboardButton::callback(a.label(), a.callback_data()))
        .collect::<Vec<_>>()])
}
