//! Callbacks of the copy buttons under code messages.

use anyhow::Result;
use teloxide::prelude::*;

use crate::common::UpdateHandler;
use crate::formatting::CodeAction;

pub fn callback_handler() -> UpdateHandler {
    dptree::filter_map(filter_callbacks).endpoint(handle_callback)
}

fn filter_callbacks(callback: CallbackQuery) -> Option<CodeAction> {
    CodeAction::parse(callback.data.as_deref()?)
}

async fn handle_callback(
    bot: Bot,
    callback: CallbackQuery,
    action: CodeAction,
) -> Result<()> {
    log::debug!("Copy action {action:?} from {}", callback.from.id);
    bot.answer_callback_query(&callback.id)
        .text(action.hint())
        .show_alert(true)
        .await?;
    Ok(())
}
