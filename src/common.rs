//! Common helpers to be used by various bot modules.

use std::sync::Arc;

use anyhow::Result;
use teloxide::types::Me;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use crate::config::Config;
use crate::conversation::{system_prompt, ConversationStore};
use crate::services::{OpenRouterClient, SpeechRecognizer, TesseractOcr};

/// Wrapper around [`teloxide::dispatching::UpdateHandler`] to be used in this
/// crate.
pub type UpdateHandler = teloxide::dispatching::UpdateHandler<anyhow::Error>;

/// Bot environment: global state shared between all handlers.
pub struct BotEnv {
    pub config: Arc<Config>,
    pub reqwest_client: reqwest::Client,
    pub conversations: ConversationStore,
    pub openrouter: OpenRouterClient,
    pub speech: SpeechRecognizer,
    pub ocr: TesseractOcr,
}

impl BotEnv {
    pub fn new(config: Config) -> Result<Self> {
        let reqwest_client = reqwest::Client::builder().build()?;
        Ok(Self {
            conversations: ConversationStore::new(system_prompt(
                &config.services.openrouter.model_name,
            )),
            openrouter: OpenRouterClient::new(
                reqwest_client.clone(),
                &config.services.openrouter,
            ),
            speech: SpeechRecognizer::new(
                reqwest_client.clone(),
                &config.services.speech,
            ),
            ocr: TesseractOcr::new(&config.services.ocr),
            reqwest_client,
            config: Arc::new(config),
        })
    }
}

/// Parse a bot command from a message, accepting `/cmd@botname` forms.
pub fn filter_command<C: BotCommands>(me: Me, msg: Message) -> Option<C> {
    C::parse(msg.text()?, me.user.username.as_deref().unwrap_or_default())
        .ok()
}

/// Whether the message starts with a bot command.
pub fn is_command(msg: &Message) -> bool {
    msg.text().is_some_and(|t| t.starts_with('/'))
}
