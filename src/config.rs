use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    pub telegram: Telegram,
    pub server_addr: SocketAddr,
    pub services: Services,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Telegram {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Services {
    pub openrouter: OpenRouter,
    pub speech: Speech,
    pub ocr: Ocr,
    #[serde(default)]
    pub discord: Option<Discord>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct OpenRouter {
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Human-readable model name shown to users and put into the system
    /// prompt.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u16,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sent as `HTTP-Referer`, used by OpenRouter for app attribution.
    pub referer: String,
    /// Sent as `X-Title`.
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Speech {
    pub api_url: String,
    pub api_key: String,
    #[serde(default = "default_speech_language")]
    pub language: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Ocr {
    #[serde(default = "default_tesseract")]
    pub tesseract: String,
    #[serde(default = "default_ocr_languages")]
    pub languages: String,
    /// Recognized text must be strictly longer than this to be accepted.
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Discord {
    pub webhook_url: String,
}

fn default_api_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "deepseek/deepseek-chat".to_string()
}

fn default_model_name() -> String {
    "DeepSeek AI".to_string()
}

const fn default_max_tokens() -> u16 {
    4000
}

const fn default_temperature() -> f64 {
    0.7
}

const fn default_top_p() -> f64 {
    0.9
}

const fn default_timeout_secs() -> u64 {
    60
}

fn default_speech_language() -> String {
    "ru-RU".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

const fn default_sample_rate() -> u32 {
    16000
}

fn default_tesseract() -> String {
    "tesseract".to_string()
}

fn default_ocr_languages() -> String {
    "rus+eng".to_string()
}

const fn default_min_text_len() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_example_config() -> anyhow::Result<()> {
        let config_text = std::fs::read_to_string("config.example.yaml")?;
        let config: Config = serde_yaml::from_str(&config_text)?;

        similar_asserts::assert_serde_eq!(
            serde_yaml::to_value(&config)?,
            serde_yaml::from_str::<serde_yaml::Value>(&config_text)?,
            "Extra fields in config.example.yaml?",
        );

        Ok(())
    }

    #[test]
    fn defaults_are_applied() -> anyhow::Result<()> {
        let config: Config = serde_yaml::from_str(
            r"
telegram:
  token: t
server_addr: 127.0.0.1:9000
services:
  openrouter:
    api_key: k
    referer: https://t.me/
    title: bot
  speech:
    api_url: http://localhost/recognize
    api_key: s
  ocr: {}
",
        )?;
        let openrouter = &config.services.openrouter;
        assert_eq!(openrouter.model, "deepseek/deepseek-chat");
        assert_eq!(openrouter.timeout_secs, 60);
        assert_eq!(openrouter.max_tokens, 4000);
        assert_eq!(config.services.ocr.min_text_len, 10);
        assert_eq!(config.services.speech.language, "ru-RU");
        assert!(config.services.discord.is_none());
        Ok(())
    }
}
