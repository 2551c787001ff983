use std::io::{BufRead, Read};

use bstr::BString;
use tracing::trace;

use crate::{
    error::{DecodeError, DecodeResult},
    value::{Dictionary, Value},
};

pub const DEFAULT_MAX_DEPTH: usize = 512;

/// How strictly integer bodies are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerMode {
    /// Accepts leading zeros and `-0`, which some real-world torrents contain.
    #[default]
    Lenient,
    /// Only accepts the canonical spelling of an integer.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub integers: IntegerMode,
    /// Deepest allowed nesting of lists and dictionaries.
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            integers: IntegerMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecoderConfig {
    pub fn strict() -> Self {
        DecoderConfig::default().with_integers(IntegerMode::Strict)
    }

    pub fn with_integers(mut self, integers: IntegerMode) -> Self {
        self.integers = integers;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Result of reading a single element: either a value or the end marker of
/// the enclosing container.
enum Element {
    Value(Value),
    End,
}

/// Forward-only bencode reader.
///
/// Each call to [`Decoder::decode`] consumes the bytes of exactly one value,
/// so concatenated values can be read one after another. Iterating the
/// decoder does the same and stops cleanly at the end of the stream.
pub struct Decoder<R> {
    reader: R,
    config: DecoderConfig,
    position: u64,
    failed: bool,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Decoder::with_config(reader, DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Decoder {
            reader,
            config,
            position: 0,
            failed: false,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    pub fn decode(&mut self) -> DecodeResult<Value> {
        let start = self.position;
        let element = self.next_element(0);
        self.finish(start, element)
    }

    fn finish(&mut self, start: u64, element: DecodeResult<Element>) -> DecodeResult<Value> {
        let outcome = match element {
            Ok(Element::Value(value)) => {
                trace!(start, end = self.position, kind = value.kind(), "decoded value");
                Ok(value)
            }
            Ok(Element::End) => Err(DecodeError::UnexpectedEndMarker { position: start }),
            Err(err) => Err(err),
        };
        self.failed = outcome.is_err();
        outcome
    }

    fn next_byte(&mut self) -> DecodeResult<Option<u8>> {
        let byte = match self.reader.fill_buf()?.first() {
            Some(byte) => *byte,
            None => return Ok(None),
        };
        self.reader.consume(1);
        self.position += 1;
        Ok(Some(byte))
    }

    fn expect_byte(&mut self, context: &'static str) -> DecodeResult<u8> {
        self.next_byte()?
            .ok_or(DecodeError::UnexpectedEof { context })
    }

    fn next_element(&mut self, depth: usize) -> DecodeResult<Element> {
        let specifier = self.expect_byte("expected an element")?;
        self.element_from(specifier, depth)
    }

    fn element_from(&mut self, specifier: u8, depth: usize) -> DecodeResult<Element> {
        let value = match specifier {
            b'0'..=b'9' => self.byte_string(specifier)?,
            b'i' => self.integer()?,
            b'l' => self.list(depth + 1)?,
            b'd' => self.dictionary(depth + 1)?,
            b'e' => return Ok(Element::End),
            other => {
                return Err(DecodeError::InvalidStartCharacter {
                    character: char::from(other),
                    position: self.position - 1,
                })
            }
        };
        Ok(Element::Value(value))
    }

    fn byte_string(&mut self, first_digit: u8) -> DecodeResult<Value> {
        // get until the colon
        let mut length = u64::from(first_digit - b'0');
        loop {
            match self.expect_byte("string length")? {
                b':' => break,
                c if c.is_ascii_digit() => {
                    length = length
                        .checked_mul(10)
                        .and_then(|length| length.checked_add(u64::from(c - b'0')))
                        .ok_or(DecodeError::LengthOverflow)?;
                }
                c => {
                    return Err(DecodeError::InvalidLengthCharacter {
                        character: char::from(c),
                        position: self.position - 1,
                    })
                }
            }
        }

        let mut payload = Vec::new();
        let read = (&mut self.reader).take(length).read_to_end(&mut payload)? as u64;
        self.position += read;
        if read < length {
            return Err(DecodeError::UnexpectedEof {
                context: "string payload",
            });
        }
        Ok(Value::ByteString(BString::from(payload)))
    }

    fn integer(&mut self) -> DecodeResult<Value> {
        // get until the e
        let mut raw = Vec::new();
        loop {
            match self.expect_byte("integer")? {
                b'e' => break,
                c => raw.push(c),
            }
        }
        parse_integer(&raw, self.config.integers).map(Value::Integer)
    }

    fn list(&mut self, depth: usize) -> DecodeResult<Value> {
        self.check_depth(depth)?;
        let mut list = Vec::new();
        loop {
            match self.next_element(depth) {
                Ok(Element::Value(value)) => list.push(value),
                Ok(Element::End) => break,
                Err(err) => return Err(DecodeError::ListElement(Box::new(err))),
            }
        }
        Ok(Value::List(list))
    }

    fn dictionary(&mut self, depth: usize) -> DecodeResult<Value> {
        self.check_depth(depth)?;
        let mut dict = Dictionary::new();
        loop {
            let key = match self.next_element(depth) {
                Ok(Element::Value(Value::ByteString(key))) => key,
                Ok(Element::Value(other)) => {
                    return Err(DecodeError::DictionaryKeyType {
                        found: other.kind(),
                    })
                }
                Ok(Element::End) => break,
                Err(err) => return Err(DecodeError::DictionaryKey(Box::new(err))),
            };
            match self.next_element(depth) {
                Ok(Element::Value(value)) => {
                    dict.insert(key, value);
                }
                Ok(Element::End) => return Err(DecodeError::MissingDictionaryValue { key }),
                Err(err) => {
                    return Err(DecodeError::DictionaryValue {
                        key,
                        source: Box::new(err),
                    })
                }
            }
        }
        Ok(Value::Dictionary(dict))
    }

    fn check_depth(&self, depth: usize) -> DecodeResult<()> {
        if depth > self.config.max_depth {
            return Err(DecodeError::NestingTooDeep {
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for Decoder<R> {
    type Item = DecodeResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let start = self.position;
        let element = match self.next_byte() {
            Ok(Some(specifier)) => self.element_from(specifier, 0),
            Ok(None) => return None,
            Err(err) => Err(err),
        };
        Some(self.finish(start, element))
    }
}

fn parse_integer(raw: &[u8], mode: IntegerMode) -> DecodeResult<i64> {
    let corrupted = || DecodeError::IntegerCorrupted {
        raw: BString::from(raw),
    };

    let digits = raw.strip_prefix(b"-").unwrap_or(raw);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(corrupted());
    }

    if mode == IntegerMode::Strict {
        let leading_zero = digits.len() > 1 && digits[0] == b'0';
        let negative_zero = digits == b"0" && digits.len() != raw.len();
        if leading_zero || negative_zero {
            return Err(DecodeError::NonCanonicalInteger {
                raw: BString::from(raw),
            });
        }
    }

    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or_else(corrupted)
}

/// Decodes the first value of `reader`.
pub fn decode<R: BufRead>(reader: R) -> DecodeResult<Value> {
    Decoder::new(reader).decode()
}

pub fn decode_with_config<R: BufRead>(reader: R, config: DecoderConfig) -> DecodeResult<Value> {
    Decoder::with_config(reader, config).decode()
}
