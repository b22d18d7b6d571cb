//! Module versions.
//!
//! A version string has the form `SEQUENCE[-PRE][+BUILD]`:
//!
//! - the sequence starts with a digit and is a run of number and text
//!   tokens, optionally separated by `.`
//! - the pre-release part follows the first `-` and uses `.` or `-` as
//!   separators
//! - the build part follows the first `+`
//!
//! Versions compare token by token. A version without a pre-release part
//! sorts after the same version with one, so `1.0-rc1 < 1.0`. Trailing zero
//! numbers are ignored, so `1.0 == 1.0.0`.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
enum Token {
    Number(u64),
    Text(String),
}

impl Token {
    fn cmp_token(&self, other: &Token) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => a.cmp(b),
            (Token::Text(a), Token::Text(b)) => a.cmp(b),
            // Mixed kinds compare by their text form
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Text(s) => f.write_str(s),
        }
    }
}

/// A parsed module version.
///
/// The original string is kept and is what [`Display`](fmt::Display) shows.
#[derive(Debug, Clone)]
pub struct ModuleVersion {
    raw: String,
    sequence: Vec<Token>,
    pre: Vec<Token>,
    build: Vec<Token>,
}

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '-' | '+')
}

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    raw: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            chars: raw.chars().collect(),
            pos: 0,
            raw,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn take_number(&mut self) -> Token {
        let mut value: u64 = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            value = value.saturating_mul(10).saturating_add(u64::from(d));
            self.pos += 1;
        }
        Token::Number(value)
    }

    /// Takes at least one character, then up to the next separator or digit
    fn take_text(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek() {
            if is_separator(c) || c.is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }
        Token::Text(self.chars[start..self.pos].iter().collect())
    }

    fn take_token(&mut self, c: char) -> Token {
        if c.is_ascii_digit() {
            self.take_number()
        } else {
            self.take_text()
        }
    }

    fn error(&self, reason: &'static str) -> Error {
        Error::invalid_version(self.raw, reason)
    }
}

impl ModuleVersion {
    /// Parses a version string
    pub fn parse(raw: &str) -> Result<Self> {
        let mut scanner = Scanner::new(raw);
        let mut sequence = Vec::new();
        let mut pre = Vec::new();
        let mut build = Vec::new();

        match scanner.peek() {
            None => return Err(scanner.error("empty version string")),
            Some(c) if c.is_ascii_digit() => sequence.push(scanner.take_number()),
            Some(_) => return Err(scanner.error("version string does not start with a number")),
        }

        let mut last = None;
        while let Some(c) = scanner.peek() {
            last = Some(c);
            match c {
                '.' => scanner.pos += 1,
                '-' | '+' => {
                    scanner.pos += 1;
                    break;
                }
                _ => sequence.push(scanner.take_token(c)),
            }
        }
        if last == Some('-') && scanner.at_end() {
            return Err(scanner.error("empty pre-release"));
        }

        if last == Some('-') {
            while let Some(c) = scanner.peek() {
                pre.push(scanner.take_token(c));
                match scanner.peek() {
                    Some('.' | '-') => scanner.pos += 1,
                    Some('+') => {
                        scanner.pos += 1;
                        last = Some('+');
                        break;
                    }
                    _ => {}
                }
            }
        }
        if last == Some('+') && scanner.at_end() {
            return Err(scanner.error("empty build"));
        }

        if last == Some('+') {
            while let Some(c) = scanner.peek() {
                build.push(scanner.take_token(c));
                if scanner.peek().is_some_and(is_separator) {
                    scanner.pos += 1;
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            sequence,
            pre,
            build,
        })
    }

    /// The version string as given
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn compare_tokens(left: &[Token], right: &[Token]) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        match a.cmp_token(b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    let common = left.len().min(right.len());
    let rest = if left.len() > right.len() { left } else { right };
    if rest[common..]
        .iter()
        .all(|token| matches!(token, Token::Number(0)))
    {
        Ordering::Equal
    } else {
        left.len().cmp(&right.len())
    }
}

impl Ord for ModuleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_tokens(&self.sequence, &other.sequence)
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => compare_tokens(&self.pre, &other.pre),
            })
            .then_with(|| compare_tokens(&self.build, &other.build))
    }
}

impl PartialOrd for ModuleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ModuleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ModuleVersion {}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ModuleVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
