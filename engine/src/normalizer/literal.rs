//! Permissive literal parser
//!
//! Last-resort parser for dictionary literals that a strict JSON parser
//! rejects: single- or double-quoted strings, `True`/`False`/`None`,
//! tuples, trailing commas and non-string keys. The result is plain JSON.

use serde_json::{Map, Number, Value};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character '{ch}' at offset {pos}")]
    Unexpected { ch: char, pos: usize },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unsupported key type at offset {0}")]
    UnsupportedKey(usize),

    #[error("trailing input at offset {0}")]
    TrailingInput(usize),

    #[error("nesting deeper than {MAX_DEPTH} levels at offset {0}")]
    TooDeep(usize),
}

type Result<T> = std::result::Result<T, LiteralError>;

/// Same recursion limit as serde_json
const MAX_DEPTH: usize = 128;

/// Parse a complete literal; anything after the value other than whitespace
/// is an error.
pub fn parse(input: &str) -> Result<Value> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(LiteralError::TrailingInput(parser.pos));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<char> {
        let ch = self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        let pos = self.pos;
        match self.bump()? {
            ch if ch == wanted => Ok(()),
            ch => Err(LiteralError::Unexpected { ch, pos }),
        }
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_ws();
        match self.peek().ok_or(LiteralError::UnexpectedEnd)? {
            '{' => self.nested(Self::dict),
            '[' => self.nested(|p| p.sequence('[', ']')),
            '(' => self.nested(|p| p.sequence('(', ')')),
            '\'' | '"' => self.string().map(Value::String),
            c if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() => self.keyword(),
            ch => Err(LiteralError::Unexpected { ch, pos: self.pos }),
        }
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Value>) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep(self.pos));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn dict(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key_pos = self.pos;
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => "null".to_string(),
                _ => return Err(LiteralError::UnsupportedKey(key_pos)),
            };
            self.skip_ws();
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_ws();
            let pos = self.pos;
            match self.bump()? {
                ',' => continue,
                '}' => return Ok(Value::Object(map)),
                ch => return Err(LiteralError::Unexpected { ch, pos }),
            }
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }

            items.push(self.value()?);

            self.skip_ws();
            let pos = self.pos;
            match self.bump()? {
                ',' => continue,
                ch if ch == close => return Ok(Value::Array(items)),
                ch => return Err(LiteralError::Unexpected { ch, pos }),
            }
        }
    }

    /// Quoted string; adjacent literals are concatenated
    fn string(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            let quote = self.bump()?;
            loop {
                match self.bump()? {
                    ch if ch == quote => break,
                    '\\' => self.escape(&mut out)?,
                    ch => out.push(ch),
                }
            }

            let resume = self.pos;
            self.skip_ws();
            if !matches!(self.peek(), Some('\'') | Some('"')) {
                self.pos = resume;
                return Ok(out);
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<()> {
        match self.bump()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'u' => out.push(self.hex_char(4)?),
            'x' => out.push(self.hex_char(2)?),
            // Unknown escapes are kept verbatim
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_char(&mut self, len: usize) -> Result<char> {
        let start = self.pos;
        let mut code = 0u32;
        for _ in 0..len {
            let pos = self.pos;
            let ch = self.bump()?;
            let digit = ch
                .to_digit(16)
                .ok_or(LiteralError::Unexpected { ch, pos })?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(LiteralError::Unexpected {
            ch: self.chars[start],
            pos: start,
        })
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_')
        ) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        let trimmed = text.strip_prefix('+').unwrap_or(&text);

        let is_integer = !trimmed.contains(['.', 'e', 'E']);
        if is_integer {
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::Number(i.into()));
            }
        }

        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or(LiteralError::InvalidNumber(text))
    }

    fn keyword(&mut self) -> Result<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => Err(LiteralError::Unexpected {
                ch: self.chars[start],
                pos: start,
            }),
        }
    }
}
