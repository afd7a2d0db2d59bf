//! Guessing the programming language of a code snippet.
//!
//! The guess is made by an ordered table of rules. Rules overlap (a
//! TypeScript snippet usually looks like JavaScript too), so the first
//! matching rule wins and the order of the table is significant.

use regex::Regex;

/// Tag returned when no rule matches.
pub const PLAIN_TEXT: &str = "text";

type Guard = fn(&str) -> bool;

/// `(language, pattern, guard)` rules, most specific first. The guard is an
/// additional check on the trimmed snippet.
const RULE_TABLE: &[(&str, &str, Option<Guard>)] = &[
    (
        "python",
        r"(?m)^(?:import |from |def |class |print\(|__name__)|\bdef \w+\(|\.py$",
        None,
    ),
    ("javascript", r"function|const |let |var |=>|console\.log|\.js$", None),
    ("html", r"<(?:!DOCTYPE|html|head|body|div|span|p)[> ]", None),
    ("css", r"[.{][^{}]*\{[^}]*\}|@media|\.css$", None),
    ("java", r"public|private|class|void main|System\.out|\.java$", None),
    ("cpp", r"#include|<iostream>|printf\(|cout<<|\.(?:c|cpp|h)$", None),
    ("sql", r"(?i)SELECT|INSERT|UPDATE|DELETE|FROM|WHERE|CREATE TABLE", None),
    ("php", r"<\?php|\$[a-zA-Z_]|echo |\.php$", None),
    ("ruby", r"def |end$|puts |\.rb$", None),
    ("go", r"package |func |import \(|fmt\.Print|\.go$", None),
    ("rust", r"fn |let |println!|\.rs$", None),
    ("typescript", r"interface |type |: [^{]*[;=]|\.ts$", None),
    ("bash", r"^#!|echo |grep |sed |awk |\.sh$", None),
    ("json", r"^\{.*\}|\[.*\]$", Some(has_quotes)),
    ("xml", r"^<\?xml|</[^>]+>", None),
    ("markdown", r"^#+|\[.*\]\(.*\)|\*.*\*|_.*_", None),
];

struct Rule {
    language: &'static str,
    pattern: Regex,
    guard: Option<Guard>,
}

impl Rule {
    fn matches(&self, snippet: &str) -> bool {
        self.pattern.is_match(snippet)
            && self.guard.map_or(true, |guard| guard(snippet))
    }
}

fn has_quotes(snippet: &str) -> bool {
    snippet.contains(['"', '\''])
}

lazy_static::lazy_static! {
    static ref RULES: Vec<Rule> = RULE_TABLE
        .iter()
        .map(|&(language, pattern, guard)| Rule {
            language,
            pattern: Regex::new(pattern)
                .expect("Failed to compile language pattern"),
            guard,
        })
        .collect();
}

lazy_static::lazy_static! {
    /// Every language [`detect`] can return, in rule order.
    pub static ref SUPPORTED_LANGUAGES: Vec<&'static str> =
        RULE_TABLE.iter().map(|&(language, _, _)| language).collect();
}

/// Guess the language of `snippet`. Returns [`PLAIN_TEXT`] when nothing
/// matches, including for empty and whitespace-only input.
pub fn detect(snippet: &str) -> &'static str {
    let snippet = snippet.trim();
    if snippet.is_empty() {
        return PLAIN_TEXT;
    }
    RULES
        .iter()
        .find(|rule| rule.matches(snippet))
        .map_or(PLAIN_TEXT, |rule| rule.language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_snippets() {
        let cases = [
            ("def f():\n    return 1", "python"),
            ("import os\nprint(os.getcwd())", "python"),
            ("const x = 1;\nconsole.log(x);", "javascript"),
            ("<div>Hello</div>", "html"),
            (".container { color: red; }", "css"),
            (
                "public static void main(String[] args) {\n    \
                 System.out.println(\"Hello\");\n}",
                "java",
            ),
            ("#include <iostream>\nint main() { return 0; }", "cpp"),
            ("SELECT * FROM t", "sql"),
            ("select name from users where id = 1;", "sql"),
            ("<?php echo $name; ?>", "php"),
            ("puts 'hello'", "ruby"),
            ("package main\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}", "go"),
            ("fn main() {\n    println!(\"hi\");\n}", "rust"),
            ("interface User {\n  name: string;\n}", "typescript"),
            ("#!/bin/bash\nls -la", "bash"),
            ("{\"name\": \"x\"}", "json"),
            ("<?xml version=\"1.0\"?>\n<note></note>", "xml"),
            ("# Title\n\nSome *emphasis* here.", "markdown"),
        ];
        for (snippet, expected) in cases {
            assert_eq!(detect(snippet), expected, "snippet: {snippet:?}");
        }
    }

    #[test]
    fn empty_and_plain_text() {
        assert_eq!(detect(""), PLAIN_TEXT);
        assert_eq!(detect("  \n\t "), PLAIN_TEXT);
        assert_eq!(detect("hello world"), PLAIN_TEXT);
    }

    #[test]
    fn earlier_rules_win() {
        // Also matches the typescript rule, but javascript comes first.
        assert_eq!(detect("const x: number = 1;"), "javascript");
        // A ruby method definition with parentheses is taken for python.
        assert_eq!(detect("def greet(name)\n  puts name\nend"), "python");
    }

    #[test]
    fn json_requires_quotes() {
        assert_eq!(detect("[1, 2, 3]"), PLAIN_TEXT);
        assert_eq!(detect("[\"a\", \"b\"]"), "json");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(detect("\n\n  SELECT 1  \n"), "sql");
    }
}
