//! Clients for the external services the bot relies on.

pub mod discord;
pub mod ocr;
pub mod openrouter;
pub mod speech;

pub use self::ocr::{OcrError, TesseractOcr};
pub use self::openrouter::{Completion, CompletionError, OpenRouterClient};
pub use self::speech::{RecognitionError, SpeechRecognizer};
