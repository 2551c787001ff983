use std::collections::BTreeMap;

use bstr::{BStr, BString};

/// Dictionary node of a decoded tree. Keys compare as raw bytes, which is the
/// order the encoder writes them in.
pub type Dictionary = BTreeMap<BString, Value>;

/// Any node of a bencoded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    ByteString(BString),
    Integer(i64),
    List(Vec<Value>),
    Dictionary(Dictionary),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::ByteString(_) => "ByteString",
            Value::Integer(_) => "Integer",
            Value::List(_) => "List",
            Value::Dictionary(_) => "Dictionary",
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::ByteString(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    /// Returns the byte string as text when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(integer) => Some(*integer),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Looks a key up when this value is a dictionary.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dictionary()?.get(BStr::new(key))
    }
}

impl From<i64> for Value {
    fn from(integer: i64) -> Self {
        Value::Integer(integer)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::ByteString(BString::from(text))
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::ByteString(BString::from(bytes))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::ByteString(BString::from(bytes))
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Value::List(list)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dictionary(dict)
    }
}

impl<K: Into<BString>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Dictionary(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_each_variant() {
        assert_eq!(Value::from("a").kind(), "ByteString");
        assert_eq!(Value::from(1i64).kind(), "Integer");
        assert_eq!(Value::List(vec![]).kind(), "List");
        assert_eq!(Value::Dictionary(Dictionary::new()).kind(), "Dictionary");
    }

    #[test]
    fn accessors_match_only_their_variant() {
        let text = Value::from("chat");
        assert_eq!(text.as_str(), Some("chat"));
        assert_eq!(text.as_integer(), None);

        let binary = Value::from(vec![0xffu8, 0xfe]);
        assert_eq!(binary.as_bytes(), Some(&[0xff, 0xfe][..]));
        assert_eq!(binary.as_str(), None);

        let dict: Value = [("b", 1i64), ("a", 2i64)].into_iter().collect();
        assert_eq!(dict.get(b"a"), Some(&Value::Integer(2)));
        assert_eq!(dict.get(b"missing"), None);
        assert!(dict.as_list().is_none());
    }
}
