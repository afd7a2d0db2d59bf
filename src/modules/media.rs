//! Voice and photo messages: turning them into text before the chat flow.

use std::sync::Arc;

use anyhow::Result;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, PhotoSize, Voice};
use teloxide::utils::markdown;

use crate::common::{BotEnv, UpdateHandler};
use crate::modules::chat;
use crate::services::{OcrError, RecognitionError};
use crate::utils::{BotExt, ResultExt};

pub fn message_handler() -> UpdateHandler {
    dptree::entry()
        .branch(dptree::filter_map(filter_voice).endpoint(handle_voice))
        .branch(Message::filter_photo().endpoint(handle_photo))
}

fn filter_voice(msg: Message) -> Option<Voice> {
    msg.voice().cloned()
}

async fn download(bot: &Bot, file_id: &str) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf).await?;
    Ok(buf)
}

async fn handle_voice(
    bot: Bot,
    env: Arc<BotEnv>,
    msg: Message,
    voice: Voice,
) -> Result<()> {
    crate::metrics::record_message("voice");
    if let Err(e) = process_voice(&bot, &env, &msg, &voice).await {
        log::error!("Voice processing error: {e:?}");
        bot.reply_message(&msg, "❌ Failed to process the voice message.")
            .await?;
    }
    Ok(())
}

async fn process_voice(
    bot: &Bot,
    env: &BotEnv,
    msg: &Message,
    voice: &Voice,
) -> Result<()> {
    bot.typing(msg.chat.id).await.log_warn("Failed to send typing action");
    let audio = download(bot, &voice.file.id).await?;

    let text = match env.speech.transcribe_voice(&audio).await {
        Ok(text) => text,
        Err(RecognitionError::Unrecognized) => {
            bot.reply_message(
                msg,
                "❌ Could not recognize speech. Try speaking more clearly.",
            )
            .await?;
            return Ok(());
        }
        Err(RecognitionError::ServiceUnavailable(e)) => {
            log::error!("Speech recognition service error: {e}");
            bot.reply_message(
                msg,
                format!("❌ Speech recognition service error: {e}"),
            )
            .await?;
            return Ok(());
        }
        Err(e @ RecognitionError::Conversion(_)) => return Err(e.into()),
    };

    log::info!("Recognized voice in {}: {text}", msg.chat.id);
    bot.reply_message(msg, format!("🎤 Recognized text:\n{text}")).await?;
    chat::respond(bot, env, msg, text).await
}

async fn handle_photo(
    bot: Bot,
    env: Arc<BotEnv>,
    msg: Message,
    photo: Vec<PhotoSize>,
) -> Result<()> {
    crate::metrics::record_message("photo");
    if let Err(e) = process_photo(&bot, &env, &msg, &photo).await {
        log::error!("Photo processing error: {e:?}");
        bot.reply_message(
            &msg,
            "❌ Failed to process the image. Try sending another photo.",
        )
        .await?;
    }
    Ok(())
}

async fn process_photo(
    bot: &Bot,
    env: &BotEnv,
    msg: &Message,
    photo: &[PhotoSize],
) -> Result<()> {
    bot.typing(msg.chat.id).await.log_warn("Failed to send typing action");
    // Sizes are sorted from smallest to largest.
    let Some(largest) = photo.last() else {
        return Ok(());
    };
    let image = download(bot, &largest.file.id).await?;
    bot.reply_message(msg, "📷 Processing the image...").await?;

    let text = match env.ocr.extract_text_from_image(&image).await {
        Ok(text) => text,
        Err(OcrError::TooShort) => {
            bot.reply_message(
                msg,
                "❌ Could not recognize text in the image, or the text is \
                 too short. Try sending a clearer image with readable text.",
            )
            .await?;
            return Ok(());
        }
        Err(e @ OcrError::Engine(_)) => return Err(e.into()),
    };

    log::info!("Recognized image text in {}: {text}", msg.chat.id);
    bot.reply_message(
        msg,
        format!(
            "📷 *Recognized text:*\n{}",
            markdown::code_block(&text)
        ),
    )
    .parse_mode(ParseMode::MarkdownV2)
    .await
    .log_error("Failed to echo recognized text");

    chat::respond(bot, env, msg, image_prompt(&text)).await
}

fn image_prompt(text: &str) -> String {
    format!(
        "TEXT RECOGNIZED FROM IMAGE:\n{text}\n\nPlease analyze this text and \
         help solve the task/answer the question."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(media: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": { "id": 7, "type": "private", "first_name": "Alice" },
            "from": { "id": 7, "is_bot": false, "first_name": "Alice" },
        });
        if let (Some(json), Some(media)) = (json.as_object_mut(), media.as_object()) {
            json.extend(media.clone());
        }
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn voice_messages_are_routed() {
        let msg = message(serde_json::json!({
            "voice": {
                "file_id": "voice-id",
                "file_unique_id": "voice-unique",
                "duration": 3,
                "mime_type": "audio/ogg",
                "file_size": 1024,
            },
        }));
        let voice = filter_voice(msg).map(|v| v.file.id);
        assert_eq!(voice.as_deref(), Some("voice-id"));
    }

    #[test]
    fn other_messages_are_not_voice() {
        let msg = message(serde_json::json!({ "text": "hello" }));
        assert!(filter_voice(msg).is_none());
    }

    #[test]
    fn recognized_text_is_wrapped_into_a_task() {
        assert_eq!(
            image_prompt("2 + 2 = ?"),
            "TEXT RECOGNIZED FROM IMAGE:\n2 + 2 = ?\n\nPlease analyze this \
             text and help solve the task/answer the question."
        );
    }
}
