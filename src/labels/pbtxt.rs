//! Label map descriptor in protobuf text format.
//!
//! The writer emits one `item` block per class, in label-map order:
//!
//! ```text
//! item {
//!   id: 0
//!   name: 'BMW'
//! }
//! ```
//!
//! The parser accepts that layout as well as the compact one-line form
//! (`item { id: 0 name: 'BMW' }`), `#` comments, and unknown fields inside
//! an item (such as `display_name`), which are skipped.

use std::fs;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use super::{ClassId, LabelMap};
use crate::error::TfshardError;

/// File name of the descriptor written next to the shards.
pub const LABEL_MAP_FILE_NAME: &str = "label_map.pbtxt";

/// Writes `label_map.pbtxt` into `dir` and returns its path.
pub fn write_label_map(map: &LabelMap, dir: &Path) -> Result<PathBuf, TfshardError> {
    let path = dir.join(LABEL_MAP_FILE_NAME);
    fs::write(&path, to_pbtxt_string(map)).map_err(TfshardError::Io)?;
    Ok(path)
}

/// Reads a descriptor back into a [`LabelMap`].
pub fn read_label_map(path: &Path) -> Result<LabelMap, TfshardError> {
    let contents = fs::read_to_string(path).map_err(|source| TfshardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    from_pbtxt_str(&contents).map_err(|message| TfshardError::LabelMapParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Renders the descriptor text.
pub fn to_pbtxt_string(map: &LabelMap) -> String {
    map.iter()
        .map(|entry| {
            format!(
                "item {{\n  id: {}\n  name: '{}'\n}}\n",
                entry.id,
                escape(&entry.name)
            )
        })
        .collect()
}

/// Parses descriptor text. Errors are plain messages; [`read_label_map`]
/// attaches the path.
pub fn from_pbtxt_str(input: &str) -> Result<LabelMap, String> {
    let mut tokens = Tokenizer::new(input);
    let mut map = LabelMap::default();

    while let Some(token) = tokens.next_token()? {
        match token {
            Token::Ident(ref word) if word == "item" => {
                let (id, name) = parse_item(&mut tokens)?;
                map.insert(id, name);
            }
            other => return Err(format!("expected 'item', found {}", other)),
        }
    }

    Ok(map)
}

fn parse_item(tokens: &mut Tokenizer<'_>) -> Result<(ClassId, String), String> {
    expect(tokens, Token::Open)?;

    let mut id = None;
    let mut name = None;

    loop {
        let field = match tokens.next_token()? {
            Some(Token::Close) => break,
            Some(Token::Ident(field)) => field,
            Some(other) => return Err(format!("expected field name, found {}", other)),
            None => return Err("unterminated item block".to_string()),
        };

        match tokens.next_token()? {
            Some(Token::Colon) => {}
            // Nested message without a colon, e.g. `keypoints { ... }`.
            Some(Token::Open) => {
                skip_block(tokens)?;
                continue;
            }
            Some(other) => return Err(format!("expected ':' after '{}', found {}", field, other)),
            None => return Err(format!("missing value for '{}'", field)),
        }

        let value = match tokens.next_token()? {
            Some(Token::Open) => {
                skip_block(tokens)?;
                continue;
            }
            Some(value) => value,
            None => return Err(format!("missing value for '{}'", field)),
        };

        match (field.as_str(), value) {
            ("id", Token::Number(n)) => id = Some(ClassId::new(n)),
            ("id", other) => return Err(format!("'id' must be an integer, found {}", other)),
            ("name", Token::Str(s)) => name = Some(s),
            ("name", other) => return Err(format!("'name' must be a string, found {}", other)),
            _ => {}
        }
    }

    match (id, name) {
        (Some(id), Some(name)) => Ok((id, name)),
        (None, _) => Err("item without 'id'".to_string()),
        (_, None) => Err("item without 'name'".to_string()),
    }
}

fn skip_block(tokens: &mut Tokenizer<'_>) -> Result<(), String> {
    let mut depth = 1usize;
    while depth > 0 {
        match tokens.next_token()? {
            Some(Token::Open) => depth += 1,
            Some(Token::Close) => depth -= 1,
            Some(_) => {}
            None => return Err("unterminated nested block".to_string()),
        }
    }
    Ok(())
}

fn expect(tokens: &mut Tokenizer<'_>, wanted: Token) -> Result<(), String> {
    match tokens.next_token()? {
        Some(token) if token == wanted => Ok(()),
        Some(token) => Err(format!("expected {}, found {}", wanted, token)),
        None => Err(format!("expected {}, found end of input", wanted)),
    }
}

fn escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Number(i64),
    Str(String),
    Open,
    Close,
    Colon,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "string '{}'", s),
            Token::Open => write!(f, "'{{'"),
            Token::Close => write!(f, "'}}'"),
            Token::Colon => write!(f, "':'"),
        }
    }
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, String> {
        self.skip_trivia();

        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        match c {
            '{' => {
                self.chars.next();
                Ok(Some(Token::Open))
            }
            '}' => {
                self.chars.next();
                Ok(Some(Token::Close))
            }
            ':' => {
                self.chars.next();
                Ok(Some(Token::Colon))
            }
            '\'' | '"' => {
                self.chars.next();
                self.string(c).map(|s| Some(Token::Str(s)))
            }
            c if c == '-' || c.is_ascii_digit() => self.number().map(Some),
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        word.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                Ok(Some(Token::Ident(word)))
            }
            other => Err(format!("unexpected character '{}'", other)),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == ',' || c == ';' {
                self.chars.next();
            } else if c == '#' {
                for c in self.chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err("unterminated string".to_string()),
                },
                Some(c) => out.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn number(&mut self) -> Result<Token, String> {
        let mut digits = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '-' || c.is_ascii_digit() {
                digits.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        digits
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|_| format!("invalid integer '{}'", digits))
    }
}
