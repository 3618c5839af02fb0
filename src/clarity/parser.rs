//! Recursive-descent parser for Clarity value representations
//!
//! Grammar (whitespace separates tokens):
//!
//! ```text
//! value    := tuple | some | "none" | uint | utf8 | buffer | string | principal | raw
//! tuple    := "(" "tuple" entry* ")"
//! entry    := "(" key value ")"
//! some     := "(" "some" value ")"
//! uint     := "u" digit+
//! utf8     := "u" string
//! buffer   := "0x" hexdigit*
//! string   := '"' char* '"'        unterminated only as the last value of the input
//! principal:= "'" token
//! envelope := "(" "ok" tuple ")"   top level of an event repr only
//! ```
//!
//! Lists, booleans, signed integers and response values below the top level
//! are not produced by the PoX-4 print events and are rejected.

use thiserror::Error;

use super::value::{StructuredValue, Tuple};

/// The text could not be decoded into a [`StructuredValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedValueError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),

    #[error("unbalanced parentheses: `(` at byte {0} is never closed")]
    Unclosed(usize),

    #[error("unbalanced parentheses: unexpected `)` at byte {0}")]
    UnexpectedClose(usize),

    #[error("expected {expected} at byte {pos}")]
    Expected { expected: &'static str, pos: usize },

    #[error("invalid {kind} literal `{token}`")]
    InvalidLiteral { kind: &'static str, token: String },

    #[error("unsupported value kind: {0}")]
    Unsupported(String),

    #[error("event is an error response")]
    ErrorResponse,

    #[error("trailing input at byte {0}")]
    TrailingInput(usize),
}

type Result<T> = std::result::Result<T, MalformedValueError>;

/// Parse a single value.
pub fn parse_value(input: &str) -> Result<StructuredValue> {
    let mut parser = Parser::new(input);
    let value = parser.value()?;
    parser.finish()?;
    Ok(value)
}

/// Parse the `repr` of a contract print event.
///
/// The producer wraps every event payload in an `(ok ...)` response envelope
/// around a tuple; the envelope is stripped and the tuple returned.
pub fn parse_event_repr(input: &str) -> Result<Tuple> {
    let mut parser = Parser::new(input);
    let tuple = parser.envelope()?;
    parser.finish()?;
    Ok(tuple)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Read up to the next whitespace or parenthesis.
    fn token(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b'(' || b == b')' {
                break;
            }
            self.pos += 1;
        }
        &src[start..self.pos]
    }

    fn finish(&mut self) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            None => Ok(()),
            Some(b')') => Err(MalformedValueError::UnexpectedClose(self.pos)),
            Some(_) => Err(MalformedValueError::TrailingInput(self.pos)),
        }
    }

    /// Consume `(` and the form name that follows it. Returns the position of
    /// the opening paren for error reporting.
    fn open_form(&mut self, expected: &'static str) -> Result<(usize, &'a str)> {
        self.skip_ws();
        if self.peek() != Some(b'(') {
            return Err(MalformedValueError::Expected {
                expected,
                pos: self.pos,
            });
        }
        let open = self.pos;
        self.pos += 1;
        self.skip_ws();
        Ok((open, self.token()))
    }

    fn close_form(&mut self, open: usize) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(b')') => {
                self.pos += 1;
                Ok(())
            }
            None => Err(MalformedValueError::Unclosed(open)),
            Some(_) => Err(MalformedValueError::Expected {
                expected: "`)`",
                pos: self.pos,
            }),
        }
    }

    fn envelope(&mut self) -> Result<Tuple> {
        let (open, head) = self.open_form("`(ok ...)` response envelope")?;
        match head {
            "ok" => {}
            "err" => return Err(MalformedValueError::ErrorResponse),
            _ => {
                return Err(MalformedValueError::Expected {
                    expected: "`(ok ...)` response envelope",
                    pos: open,
                })
            }
        }
        let body_pos = self.pos;
        let body = self.value()?;
        self.close_form(open)?;
        match body {
            StructuredValue::Tuple(tuple) => Ok(tuple),
            _ => Err(MalformedValueError::Expected {
                expected: "tuple inside response envelope",
                pos: body_pos,
            }),
        }
    }

    fn value(&mut self) -> Result<StructuredValue> {
        self.skip_ws();
        match self.peek() {
            None => Err(MalformedValueError::UnexpectedEnd(self.pos)),
            Some(b'(') => self.form(),
            Some(b')') => Err(MalformedValueError::UnexpectedClose(self.pos)),
            Some(b'"') => Ok(StructuredValue::Text(self.string())),
            Some(b'\'') => self.principal(),
            Some(b'u') if self.peek_at(1) == Some(b'"') => {
                self.pos += 1;
                Ok(StructuredValue::Text(self.string()))
            }
            Some(_) => self.atom(),
        }
    }

    fn form(&mut self) -> Result<StructuredValue> {
        let (open, head) = self.open_form("`(`")?;
        let value = match head {
            "tuple" => StructuredValue::Tuple(self.tuple_entries()?),
            "some" => StructuredValue::some(self.value()?),
            "" => {
                return Err(MalformedValueError::Expected {
                    expected: "form name",
                    pos: self.pos,
                })
            }
            other => return Err(MalformedValueError::Unsupported(format!("({} ...)", other))),
        };
        self.close_form(open)?;
        Ok(value)
    }

    fn tuple_entries(&mut self) -> Result<Tuple> {
        let mut tuple = Tuple::new();
        loop {
            self.skip_ws();
            match self.peek() {
                // The caller reports a missing `)`.
                Some(b')') | None => return Ok(tuple),
                Some(b'(') => {
                    let (open, key) = self.open_form("tuple entry")?;
                    if key.is_empty() {
                        return Err(MalformedValueError::Expected {
                            expected: "tuple key",
                            pos: self.pos,
                        });
                    }
                    let value = self.value()?;
                    self.close_form(open)?;
                    tuple.insert(key, value);
                }
                Some(_) => {
                    return Err(MalformedValueError::Expected {
                        expected: "`(` opening a tuple entry",
                        pos: self.pos,
                    })
                }
            }
        }
    }

    /// String literal starting at the opening quote. A missing closing quote
    /// consumes the rest of the input, so any form still open around it then
    /// fails as unclosed.
    fn string(&mut self) -> String {
        self.pos += 1;
        let src = self.src;
        let rest = &src[self.pos..];
        let mut out = String::new();
        let mut chars = rest.char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += offset + 1;
                    return out;
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c => out.push(c),
            }
        }
        self.pos = self.src.len();
        out
    }

    fn principal(&mut self) -> Result<StructuredValue> {
        self.pos += 1;
        let token = self.token();
        let name = token.strip_suffix('\'').unwrap_or(token);
        if name.is_empty() {
            return Err(MalformedValueError::InvalidLiteral {
                kind: "principal",
                token: format!("'{}", token),
            });
        }
        Ok(StructuredValue::Text(name.to_string()))
    }

    fn atom(&mut self) -> Result<StructuredValue> {
        let pos = self.pos;
        let token = self.token();

        if token == "none" {
            return Ok(StructuredValue::Optional(None));
        }
        if token == "true" || token == "false" {
            return Err(MalformedValueError::Unsupported(format!("bool `{}`", token)));
        }
        if let Some(digits) = token.strip_prefix("0x") {
            return hex::decode(digits)
                .map(StructuredValue::Buffer)
                .map_err(|_| MalformedValueError::InvalidLiteral {
                    kind: "buffer",
                    token: token.to_string(),
                });
        }
        // `u` followed by a letter is an ordinary word, not a uint.
        if let Some(digits) = token
            .strip_prefix('u')
            .filter(|d| d.is_empty() || d.starts_with(|c: char| c.is_ascii_digit()))
        {
            if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.is_empty() {
                return Err(MalformedValueError::InvalidLiteral {
                    kind: "uint",
                    token: token.to_string(),
                });
            }
            return digits
                .parse::<u128>()
                .map(StructuredValue::UnsignedInt)
                .map_err(|_| MalformedValueError::InvalidLiteral {
                    kind: "uint",
                    token: token.to_string(),
                });
        }
        if token.starts_with('-') || token.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(MalformedValueError::Unsupported(format!("signed int `{}`", token)));
        }
        if token.is_empty() {
            return Err(MalformedValueError::Expected {
                expected: "value",
                pos,
            });
        }
        Ok(StructuredValue::Raw(token.to_string()))
    }
}
