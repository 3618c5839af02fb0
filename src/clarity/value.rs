//! Structured value tree

use std::fmt;

/// A decoded Clarity value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredValue {
    /// `(tuple (key value) ...)`
    Tuple(Tuple),
    /// `(some value)` or `none`
    Optional(Option<Box<StructuredValue>>),
    /// `u123`
    UnsignedInt(u128),
    /// `0xdeadbeef`
    Buffer(Vec<u8>),
    /// String literals and principals
    Text(String),
    /// Any other bare token
    Raw(String),
}

/// Tuple fields in the order they appeared in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tuple {
    fields: Vec<(String, StructuredValue)>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. A repeated key replaces the earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: StructuredValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&StructuredValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StructuredValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, StructuredValue)> for Tuple {
    fn from_iter<I: IntoIterator<Item = (String, StructuredValue)>>(iter: I) -> Self {
        let mut tuple = Tuple::new();
        for (key, value) in iter {
            tuple.insert(key, value);
        }
        tuple
    }
}

impl StructuredValue {
    /// Build `(some value)`.
    pub fn some(value: StructuredValue) -> Self {
        StructuredValue::Optional(Some(Box::new(value)))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            StructuredValue::Tuple(_) => "tuple",
            StructuredValue::Optional(Some(_)) => "some",
            StructuredValue::Optional(None) => "none",
            StructuredValue::UnsignedInt(_) => "uint",
            StructuredValue::Buffer(_) => "buffer",
            StructuredValue::Text(_) => "text",
            StructuredValue::Raw(_) => "raw token",
        }
    }

    /// Look through any number of `(some ...)` wrappers. `none` yields `None`.
    pub fn unwrap_optional(&self) -> Option<&StructuredValue> {
        match self {
            StructuredValue::Optional(Some(inner)) => inner.unwrap_optional(),
            StructuredValue::Optional(None) => None,
            other => Some(other),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, StructuredValue::Optional(None))
    }

    pub fn as_tuple(&self) -> Option<&Tuple> {
        match self.unwrap_optional()? {
            StructuredValue::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u128> {
        match self.unwrap_optional()? {
            StructuredValue::UnsignedInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&[u8]> {
        match self.unwrap_optional()? {
            StructuredValue::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Text content of a string, principal or raw token.
    pub fn as_text(&self) -> Option<&str> {
        match self.unwrap_optional()? {
            StructuredValue::Text(text) | StructuredValue::Raw(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(tuple")?;
        for (key, value) in &self.fields {
            write!(f, " ({} {})", key, value)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for StructuredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuredValue::Tuple(tuple) => write!(f, "{}", tuple),
            StructuredValue::Optional(Some(inner)) => write!(f, "(some {})", inner),
            StructuredValue::Optional(None) => write!(f, "none"),
            StructuredValue::UnsignedInt(n) => write!(f, "u{}", n),
            StructuredValue::Buffer(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            StructuredValue::Text(text) => {
                write!(f, "\"")?;
                for c in text.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                write!(f, "\"")
            }
            StructuredValue::Raw(token) => write!(f, "{}", token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StructuredValue {
        let mut inner = Tuple::new();
        inner.insert("amount-ustx", StructuredValue::UnsignedInt(1000));
        inner.insert("delegate-to", StructuredValue::Text("SPPOOL".into()));
        let mut outer = Tuple::new();
        outer.insert("data", StructuredValue::Tuple(inner));
        outer.insert("name", StructuredValue::Text("delegate-stx".into()));
        StructuredValue::Tuple(outer)
    }

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut tuple = Tuple::new();
        tuple.insert("b", StructuredValue::UnsignedInt(1));
        tuple.insert("a", StructuredValue::UnsignedInt(2));
        tuple.insert("b", StructuredValue::UnsignedInt(3));

        assert_eq!(tuple.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(tuple.get("b").and_then(|v| v.as_uint()), Some(3));
    }

    #[test]
    fn test_accessors_look_through_some() {
        let value = StructuredValue::some(StructuredValue::some(StructuredValue::UnsignedInt(7)));
        assert_eq!(value.as_uint(), Some(7));
        assert_eq!(StructuredValue::Optional(None).as_uint(), None);
        assert!(StructuredValue::Optional(None).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample().to_string(),
            "(tuple (data (tuple (amount-ustx u1000) (delegate-to \"SPPOOL\"))) (name \"delegate-stx\"))"
        );
        assert_eq!(StructuredValue::Buffer(vec![0, 0xab]).to_string(), "0x00ab");
        assert_eq!(StructuredValue::Text("a\"b".into()).to_string(), "\"a\\\"b\"");
    }
}
