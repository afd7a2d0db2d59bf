use teloxide::payloads::{self, SendMessageSetters};
use teloxide::prelude::*;
use teloxide::requests::JsonRequest;
use teloxide::types::{ChatAction, InlineKeyboardMarkup, ParseMode};
use teloxide::utils::markdown;

pub trait BotExt {
    /// Send `text` to the chat of `msg`, as a reply to it.
    fn reply_message<T: Into<String>>(
        &self,
        msg: &Message,
        text: T,
    ) -> JsonRequest<payloads::SendMessage>;

    /// Send a fenced code block with an inline keyboard attached.
    fn send_code(
        &self,
        chat_id: ChatId,
        code: &str,
        language: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> JsonRequest<payloads::SendMessage>;

    /// Show the "typing…" indicator in a chat.
    fn typing(&self, chat_id: ChatId) -> JsonRequest<payloads::SendChatAction>;
}

impl BotExt for Bot {
    fn reply_message<T: Into<String>>(
        &self,
        msg: &Message,
        text: T,
    ) -> JsonRequest<payloads::SendMessage> {
        let mut reply =
            self.send_message(msg.chat.id, text).reply_to_message_id(msg.id);
        reply.message_thread_id = msg.thread_id;
        reply
    }

    fn send_code(
        &self,
        chat_id: ChatId,
        code: &str,
        language: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> JsonRequest<payloads::SendMessage> {
        self.send_message(chat_id, markdown::code_block_with_lang(code, language))
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(keyboard)
    }

    fn typing(&self, chat_id: ChatId) -> JsonRequest<payloads::SendChatAction> {
        self.send_chat_action(chat_id, ChatAction::Typing)
    }
}
