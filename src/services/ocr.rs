//! Text recognition on photos with the `tesseract` CLI.

use tap::Tap;

use crate::config;
use crate::utils::pipe_through;

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine failed: {0}")]
    Engine(String),
    #[error("recognized text is too short")]
    TooShort,
}

pub struct TesseractOcr {
    tesseract: String,
    languages: String,
    min_text_len: usize,
}

impl TesseractOcr {
    pub fn new(config: &config::Ocr) -> Self {
        Self {
            tesseract: config.tesseract.clone(),
            languages: config.languages.clone(),
            min_text_len: config.min_text_len,
        }
    }

    /// Recognize text in an image. Results not longer than the configured
    /// minimum length are rejected as [`OcrError::TooShort`].
    pub async fn extract_text_from_image(
        &self,
        image: &[u8],
    ) -> Result<String, OcrError> {
        let args = [
            "stdin",
            "stdout",
            "--oem",
            "3",
            "--psm",
            "6",
            "-l",
            self.languages.as_str(),
        ];
        let output = pipe_through(&self.tesseract, &args, image)
            .await
            .tap(|r| crate::metrics::update_service("tesseract", r.is_ok()))
            .map_err(|e| OcrError::Engine(format!("{e:#}")))?;
        accept_text(String::from_utf8_lossy(&output).trim(), self.min_text_len)
    }
}

fn accept_text(text: &str, min_len: usize) -> Result<String, OcrError> {
    if text.chars().count() > min_len {
        Ok(text.to_string())
    } else {
        Err(OcrError::TooShort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_rejected() {
        assert!(matches!(accept_text("", 10), Err(OcrError::TooShort)));
        assert!(matches!(
            accept_text("0123456789", 10),
            Err(OcrError::TooShort)
        ));
        assert_eq!(accept_text("01234567890", 10).ok().as_deref(), Some("01234567890"));
    }

    #[test]
    fn length_is_counted_in_characters() {
        // 10 cyrillic letters are 20 bytes.
        assert!(matches!(
            accept_text("абвгдеёжзи", 10),
            Err(OcrError::TooShort)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_engine_is_an_engine_error() {
        let ocr = TesseractOcr {
            tesseract: "/nonexistent/tesseract".to_string(),
            languages: "eng".to_string(),
            min_text_len: 10,
        };
        assert!(matches!(
            ocr.extract_text_from_image(b"not an image").await,
            Err(OcrError::Engine(_))
        ));
    }
}
