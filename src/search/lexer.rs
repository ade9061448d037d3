//! Query lexer.
//!
//! Turns a normalized query string into a flat token stream in which every
//! connective is explicit: whitespace between two operands becomes
//! [`Token::And`], `or` between two operands becomes [`Token::Or`], and both
//! `not X` and `-X` become [`Token::Not`] directly followed by `X`.

use crate::error::{Result, SearchError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Term(String),
    Phrase(Vec<String>),
    And,
    Or,
    Not,
}

impl Token {
    pub fn is_operand(&self) -> bool {
        matches!(self, Token::Term(_) | Token::Phrase(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Term(word) => f.write_str(word),
            Token::Phrase(words) => write!(f, "\"{}\"", words.join(" ")),
            Token::And => f.write_str(" "),
            Token::Or => f.write_str(" or "),
            Token::Not => f.write_str(" not "),
        }
    }
}

/// Writes tokens back out as query text; lexing the output yields the same tokens.
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(Token::to_string).collect()
}

/// True when `word` is made of word characters only.
pub fn is_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[derive(Debug)]
enum Item {
    Word(String),
    Quoted(Vec<String>),
    Dash,
}

pub fn tokenize(query: &str) -> Result<Vec<Token>> {
    let items = scan(query)?;
    connect(items)
}

/// Splits the query into words, quoted phrases and negation dashes.
fn scan(query: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut chars = query.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '-' {
            chars.next();
            match chars.peek() {
                Some(next) if !next.is_whitespace() => {
                    items.push(Item::Dash);
                    continue;
                }
                _ => return Err(SearchError::parse("dangling '-' in query")),
            }
        }

        if c == '"' {
            chars.next();
            let mut phrase = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                phrase.push(c);
            }
            if !closed {
                return Err(SearchError::parse("unclosed quote in query"));
            }
            if chars.peek().is_some_and(|next| !next.is_whitespace()) {
                return Err(SearchError::parse(
                    "quoted phrase must be followed by whitespace",
                ));
            }
            let words: Vec<String> = phrase.split_whitespace().map(str::to_string).collect();
            if let Some(bad) = words.iter().find(|w| !is_word(w)) {
                return Err(SearchError::parse(format!(
                    "unsupported characters in phrase word '{}'",
                    bad
                )));
            }
            items.push(Item::Quoted(words));
            continue;
        }

        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            if c == '"' {
                return Err(SearchError::parse(
                    "quoted phrase must be preceded by whitespace",
                ));
            }
            word.push(c);
            chars.next();
        }
        if !is_word(&word) {
            return Err(SearchError::parse(format!(
                "unsupported characters in term '{}'",
                word
            )));
        }
        items.push(Item::Word(word));
    }

    Ok(items)
}

/// Inserts explicit connectives between operands.
///
/// `or` and `not` only act as connectives when they sit after an operand and
/// something follows them; anywhere else they are ordinary search words.
fn connect(items: Vec<Item>) -> Result<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::with_capacity(items.len() * 2);
    let mut pending: Option<Token> = None;
    let count = items.len();

    for (idx, item) in items.into_iter().enumerate() {
        let after_operand = tokens.last().is_some_and(Token::is_operand) && pending.is_none();
        let has_next = idx + 1 < count;

        let operand = match item {
            Item::Word(word) if word == "or" && after_operand && has_next => {
                pending = Some(Token::Or);
                continue;
            }
            Item::Word(word) if word == "not" && after_operand && has_next => {
                pending = Some(Token::Not);
                continue;
            }
            Item::Dash => {
                if !after_operand {
                    return Err(SearchError::parse(
                        "negation needs a preceding term to exclude from",
                    ));
                }
                pending = Some(Token::Not);
                continue;
            }
            Item::Word(word) => Token::Term(word),
            Item::Quoted(words) => Token::Phrase(words),
        };

        match pending.take() {
            Some(connective) => tokens.push(connective),
            None if tokens.last().is_some_and(Token::is_operand) => tokens.push(Token::And),
            None => {}
        }
        tokens.push(operand);
    }

    if pending.is_some() {
        return Err(SearchError::parse("query ends with a connective"));
    }

    Ok(tokens)
}
