//! Lexing of module, package and class names given on the command line.

use anyhow::{bail, Result};

/// Words that can never be a name component
const RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "_", "true", "false", "null",
];

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// A position in a string that moves forward over recognized tokens.
///
/// Every `skip_*` method either consumes its token or leaves the position
/// where it was.
#[derive(Debug, Clone)]
pub(crate) struct NameCursor {
    chars: Vec<char>,
    index: usize,
}

impl NameCursor {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            index: 0,
        }
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// The text not consumed yet
    pub(crate) fn rest(&self) -> String {
        self.chars[self.index.min(self.chars.len())..].iter().collect()
    }

    /// Skips whitespace; returns whether any was skipped
    pub(crate) fn skip_whitespace(&mut self) -> bool {
        let start = self.index;
        while self.peek().is_some_and(char::is_whitespace) {
            self.index += 1;
        }
        self.index != start
    }

    /// Skips `literal` if the text continues with it
    pub(crate) fn skip_literal(&mut self, literal: &str) -> bool {
        let start = self.index;
        for expected in literal.chars() {
            if self.peek() != Some(expected) {
                self.index = start;
                return false;
            }
            self.index += 1;
        }
        true
    }

    /// Skips `word` only if it is not the prefix of a longer identifier
    pub(crate) fn skip_keyword(&mut self, word: &str) -> bool {
        let start = self.index;
        if !self.skip_literal(word) {
            return false;
        }
        if self.peek().is_some_and(is_identifier_part) {
            self.index = start;
            return false;
        }
        true
    }

    /// Skips an identifier that is not a reserved word
    pub(crate) fn skip_identifier(&mut self) -> Option<String> {
        let start = self.index;
        if !self.peek().is_some_and(is_identifier_start) {
            return None;
        }
        self.index += 1;
        while self.peek().is_some_and(is_identifier_part) {
            self.index += 1;
        }

        let identifier: String = self.chars[start..self.index].iter().collect();
        if RESERVED_WORDS.contains(&identifier.as_str()) {
            self.index = start;
            return None;
        }
        Some(identifier)
    }

    /// Skips a dotted name, allowing whitespace around the dots.
    ///
    /// Returns the name with the whitespace removed, or `None` if the text
    /// does not start with an identifier. A dot that is not followed by an
    /// identifier is an error.
    pub(crate) fn skip_qualified_name(&mut self) -> Result<Option<String>> {
        let start = self.index;
        let Some(first) = self.skip_identifier() else {
            return Ok(None);
        };
        let mut name = first;

        loop {
            let end = self.index;
            self.skip_whitespace();
            if !self.skip_literal(".") {
                self.index = end;
                return Ok(Some(name));
            }
            self.skip_whitespace();

            match self.skip_identifier() {
                Some(identifier) => {
                    name.push('.');
                    name.push_str(&identifier);
                }
                None => {
                    let text: String = self.chars[start..].iter().collect();
                    self.index = start;
                    bail!("not a qualified name: {}", text);
                }
            }
        }
    }
}

/// Parses `text` as exactly one qualified name, surrounding whitespace allowed
pub(crate) fn parse_qualified_name(text: &str) -> Result<String> {
    let mut cursor = NameCursor::new(text);
    cursor.skip_whitespace();
    let Some(name) = cursor.skip_qualified_name()? else {
        bail!("not a valid name: '{}'", text);
    };
    cursor.skip_whitespace();
    if !cursor.is_eof() {
        bail!("unexpected '{}' following {}", cursor.rest(), name);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_whitespace() {
        let mut cursor = NameCursor::new(" \t\nx");
        assert!(cursor.skip_whitespace());
        assert!(!cursor.skip_whitespace());
        assert_eq!(cursor.rest(), "x");
    }

    #[test]
    fn test_skip_literal_restores_on_mismatch() {
        let mut cursor = NameCursor::new("tox");
        assert!(!cursor.skip_literal("top"));
        assert_eq!(cursor.rest(), "tox");
        assert!(cursor.skip_literal("to"));
        assert_eq!(cursor.rest(), "x");
    }

    #[test]
    fn test_skip_keyword_needs_boundary() {
        let mut cursor = NameCursor::new("statical");
        assert!(!cursor.skip_keyword("static"));
        let mut cursor = NameCursor::new("static m");
        assert!(cursor.skip_keyword("static"));
        assert_eq!(cursor.rest(), " m");
    }

    #[test]
    fn test_skip_identifier() {
        let mut cursor = NameCursor::new("$foo_1.bar");
        assert_eq!(cursor.skip_identifier().as_deref(), Some("$foo_1"));
        assert_eq!(cursor.rest(), ".bar");

        assert_eq!(NameCursor::new("1abc").skip_identifier(), None);
        assert_eq!(NameCursor::new("ÿber").skip_identifier().as_deref(), Some("ÿber"));
    }

    #[test]
    fn test_reserved_words_are_not_identifiers() {
        for word in ["class", "static", "_", "true", "null"] {
            let mut cursor = NameCursor::new(word);
            assert_eq!(cursor.skip_identifier(), None, "{}", word);
            assert_eq!(cursor.rest(), word);
        }
        // Restricted keywords of module declarations are fine
        assert_eq!(
            NameCursor::new("transitive").skip_identifier().as_deref(),
            Some("transitive")
        );
    }

    #[test]
    fn test_skip_qualified_name() {
        let mut cursor = NameCursor::new("java . base rest");
        assert_eq!(
            cursor.skip_qualified_name().unwrap().as_deref(),
            Some("java.base")
        );
        assert_eq!(cursor.rest(), " rest");

        let mut cursor = NameCursor::new("a.b.");
        assert!(cursor.skip_qualified_name().is_err());
        assert_eq!(cursor.rest(), "a.b.");

        assert!(NameCursor::new("a.class").skip_qualified_name().is_err());
        assert_eq!(NameCursor::new(".a").skip_qualified_name().unwrap(), None);
    }

    #[test]
    fn test_parse_qualified_name() {
        assert_eq!(parse_qualified_name(" com.example ").unwrap(), "com.example");
        assert!(parse_qualified_name("").is_err());
        assert!(parse_qualified_name("com example").is_err());
        assert!(parse_qualified_name("com-example").is_err());
    }
}
