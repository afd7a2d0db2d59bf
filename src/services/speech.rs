//! Voice message transcription.
//!
//! Telegram voice notes are OGG/Opus. They are converted to mono FLAC with
//! `ffmpeg` and posted to a Google-style speech recognition endpoint, which
//! answers with one JSON object per line.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tap::Tap;

use crate::config;
use crate::utils::pipe_through;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("speech was not recognized")]
    Unrecognized,
    #[error("speech recognition service is unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("failed to convert audio: {0}")]
    Conversion(String),
}

pub struct SpeechRecognizer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    language: String,
    ffmpeg: String,
    sample_rate: u32,
}

impl SpeechRecognizer {
    pub fn new(http: reqwest::Client, config: &config::Speech) -> Self {
        Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            ffmpeg: config.ffmpeg.clone(),
            sample_rate: config.sample_rate,
        }
    }

    pub async fn transcribe_voice(
        &self,
        audio: &[u8],
    ) -> Result<String, RecognitionError> {
        let flac = self.to_flac(audio).await?;
        let body = self
            .recognize(flac)
            .await
            .tap(|r| crate::metrics::update_service("speech", r.is_ok()))
            .map_err(|e| RecognitionError::ServiceUnavailable(e.to_string()))?;
        parse_transcript(&body).ok_or(RecognitionError::Unrecognized)
    }

    async fn recognize(&self, flac: Bytes) -> reqwest::Result<String> {
        self.http
            .post(&self.api_url)
            .query(&[
                ("client", "chromium"),
                ("lang", self.language.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .header(
                CONTENT_TYPE,
                format!("audio/x-flac; rate={}", self.sample_rate),
            )
            .timeout(REQUEST_TIMEOUT)
            .body(flac)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    async fn to_flac(&self, audio: &[u8]) -> Result<Bytes, RecognitionError> {
        let sample_rate = self.sample_rate.to_string();
        let args = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            "pipe:0",
            "-ac",
            "1",
            "-ar",
            sample_rate.as_str(),
            "-f",
            "flac",
            "pipe:1",
        ];
        pipe_through(&self.ffmpeg, &args, audio)
            .await
            .map(Bytes::from)
            .map_err(|e| RecognitionError::Conversion(format!("{e:#}")))
    }
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    result: Vec<RecognizeResult>,
}

#[derive(Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternative: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    transcript: String,
}

/// Pick the first non-empty transcript from a line-delimited response.
fn parse_transcript(body: &str) -> Option<String> {
    body.lines()
        .filter_map(|line| serde_json::from_str::<RecognizeResponse>(line).ok())
        .flat_map(|r| r.result)
        .flat_map(|r| r.alternative)
        .map(|a| a.transcript.trim().to_string())
        .find(|t| !t.is_empty())
}
