//! Planning the messages to send for a segmented response.

use super::segment::Segment;

const CALLBACK_PREFIX: &str = "copy_";
const COPY_ALL: &str = "all";
/// Marks a language tag that would otherwise read as [`COPY_ALL`].
const LANGUAGE_ESCAPE: char = '=';

/// Telegram limits callback data to 64 bytes.
const MAX_CALLBACK_DATA_LEN: usize = 64;

/// An interactive action offered under a code message.
///
/// Messaging platforms can't put anything into the user's clipboard, so
/// handling an action only shows a hint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeAction {
    CopyLanguage(String),
    CopyAll,
}

impl CodeAction {
    /// Stable token that round-trips through button callbacks.
    pub fn callback_data(&self) -> String {
        match self {
            Self::CopyLanguage(language) => {
                let mut data = if language == COPY_ALL
                    || language.starts_with(LANGUAGE_ESCAPE)
                {
                    format!("{CALLBACK_PREFIX}{LANGUAGE_ESCAPE}{language}")
                } else {
                    format!("{CALLBACK_PREFIX}{language}")
                };
                truncate_at_char_boundary(&mut data, MAX_CALLBACK_DATA_LEN);
                data
            }
            Self::CopyAll => format!("{CALLBACK_PREFIX}{COPY_ALL}"),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data.strip_prefix(CALLBACK_PREFIX)? {
            "" => None,
            COPY_ALL => Some(Self::CopyAll),
            language => {
                let language =
                    language.strip_prefix(LANGUAGE_ESCAPE).unwrap_or(language);
                (!language.is_empty())
                    .then(|| Self::CopyLanguage(language.to_string()))
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::CopyLanguage(language) => {
                format!("📋 Copy {}", language.to_uppercase())
            }
            Self::CopyAll => "📁 Copy all".to_string(),
        }
    }

    /// Text shown when the action is triggered.
    pub fn hint(&self) -> String {
        match self {
            Self::CopyLanguage(language) => format!(
                "📋 {} code is ready to copy! Select and copy the code from \
                 the message above.",
                language.to_uppercase()
            ),
            Self::CopyAll => "📋 Code is ready to copy! Use the copy buttons \
                              under each code block to copy specific snippets."
                .to_string(),
        }
    }
}

fn truncate_at_char_boundary(s: &mut String, max_len: usize) {
    if s.len() > max_len {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderInstruction {
    SendText(String),
    SendCode { content: String, language: String, actions: [CodeAction; 2] },
}

/// Map segments to send instructions in order. Text segments that are empty
/// after trimming are skipped; other text keeps its original whitespace.
pub fn plan(segments: Vec<Segment>) -> Vec<RenderInstruction> {
    segments
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Text(content) => (!content.trim().is_empty())
                .then_some(RenderInstruction::SendText(content)),
            Segment::Code { language, content } => {
                Some(RenderInstruction::SendCode {
                    actions: [
                        CodeAction::CopyLanguage(language.clone()),
                        CodeAction::CopyAll,
                    ],
                    content,
                    language,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_instruction(language: &str, content: &str) -> RenderInstruction {
        RenderInstruction::SendCode {
            content: content.to_string(),
            language: language.to_string(),
            actions: [
                CodeAction::CopyLanguage(language.to_string()),
                CodeAction::CopyAll,
            ],
        }
    }

    #[test]
    fn blank_text_is_elided() {
        let segments = vec![
            Segment::Text(String::new()),
            Segment::Code {
                language: "python".to_string(),
                content: "print(1)".to_string(),
            },
            Segment::Text("   ".to_string()),
        ];
        assert_eq!(plan(segments), vec![code_instruction("python", "print(1)")]);
    }

    #[test]
    fn order_and_whitespace_are_preserved() {
        let segments = vec![
            Segment::Text("\nIntro:\n".to_string()),
            Segment::Code {
                language: "sql".to_string(),
                content: "SELECT 1".to_string(),
            },
            Segment::Text("\n\n".to_string()),
            Segment::Code {
                language: "text".to_string(),
                content: "plain".to_string(),
            },
            Segment::Text(" Bye ".to_string()),
        ];
        similar_asserts::assert_eq!(
            plan(segments),
            vec![
                RenderInstruction::SendText("\nIntro:\n".to_string()),
                code_instruction("sql", "SELECT 1"),
                code_instruction("text", "plain"),
                RenderInstruction::SendText(" Bye ".to_string()),
            ]
        );
    }

    #[test]
    fn callback_data_round_trips() {
        for action in [
            CodeAction::CopyLanguage("python".to_string()),
            CodeAction::CopyAll,
        ] {
            assert_eq!(CodeAction::parse(&action.callback_data()), Some(action));
        }
        assert_eq!(
            CodeAction::CopyLanguage("rust".to_string()).callback_data(),
            "copy_rust"
        );
        assert_eq!(CodeAction::CopyAll.callback_data(), "copy_all");
    }

    #[test]
    fn language_named_all_is_not_copy_all() {
        let action = CodeAction::CopyLanguage("all".to_string());
        assert_eq!(action.callback_data(), "copy_=all");
        let parsed = CodeAction::parse(&action.callback_data());
        assert!(parsed.as_ref().is_some_and(|a| a.hint().contains("ALL code")));
        assert_eq!(parsed, Some(action));
    }

    #[test]
    fn foreign_callback_data_is_ignored() {
        assert_eq!(CodeAction::parse("vote_1"), None);
        assert_eq!(CodeAction::parse("copy_"), None);
        assert_eq!(CodeAction::parse("copy_="), None);
    }

    #[test]
    fn long_language_fits_callback_limit() {
        let action = CodeAction::CopyLanguage("ы".repeat(40));
        let data = action.callback_data();
        assert!(data.len() <= MAX_CALLBACK_DATA_LEN);
        assert!(data.starts_with("copy_ы"));
    }

    #[test]
    fn labels_name_the_language() {
        assert_eq!(
            CodeAction::CopyLanguage("python".to_string()).label(),
            "📋 Copy PYTHON"
        );
        assert!(CodeAction::CopyLanguage("go".to_string())
            .hint()
            .contains("GO code"));
    }
}
