//! Query string encoding for index resource requests
//!
//! Parameters are pushed in call order and rendered as `name=value` pairs
//! behind a base path. The first pair is joined with `?`, the rest with `&`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;

/// Characters left literal inside list elements: unreserved marks plus `/`
const LIST_ELEMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// A single query value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Text(String),
    Int(i64),
}

impl Scalar {
    fn is_empty(&self) -> bool {
        match self {
            Scalar::Text(s) => s.is_empty(),
            Scalar::Int(n) => *n == 0,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Text(value.clone())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(i64::from(value))
    }
}

/// A query parameter value: one scalar, or an ordered sequence of scalars.
///
/// Sequence elements are percent-encoded on the wire. Single values are
/// written verbatim and must already be URL-safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(Scalar),
    Many(Vec<Scalar>),
}

impl QueryValue {
    /// Build a sequence value from anything iterable
    pub fn many<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        QueryValue::Many(values.into_iter().map(Into::into).collect())
    }

    /// Empty strings, zero and empty sequences contribute nothing
    pub fn is_empty(&self) -> bool {
        match self {
            QueryValue::Single(s) => s.is_empty(),
            QueryValue::Many(values) => values.is_empty(),
        }
    }

    /// Collapse CLI-style repeated values: one value is `Single`, several `Many`
    pub fn from_repeated(mut values: Vec<String>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(|v| QueryValue::Single(Scalar::Text(v))),
            _ => Some(QueryValue::many(values)),
        }
    }
}

macro_rules! impl_single_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::Single(value.into())
                }
            }
        )*
    };
}

impl_single_from!(&str, String, &String, i64, i32, Scalar);

impl<T: Into<Scalar>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::many(values)
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for QueryValue {
    fn from(values: [T; N]) -> Self {
        QueryValue::many(values)
    }
}

/// Builds `base?a=1&b=2` without ever producing a stray separator
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    uri: String,
    has_query: bool,
}

impl QueryBuilder {
    pub fn new(base: &str) -> Self {
        Self {
            uri: base.to_string(),
            has_query: false,
        }
    }

    /// Append the fragments for one parameter
    pub fn push(mut self, name: &str, value: Option<&QueryValue>) -> Self {
        let Some(value) = value else {
            return self;
        };

        if value.is_empty() {
            return self;
        }

        match value {
            QueryValue::Single(scalar) => {
                let raw = scalar.to_string();
                self.pair(name, &raw);
            },
            QueryValue::Many(items) => {
                for item in items {
                    let encoded = utf8_percent_encode(&item.to_string(), LIST_ELEMENT).to_string();
                    self.pair(name, &encoded);
                }
            },
        }

        self
    }

    /// Append an integer parameter; zero is treated as absent
    pub fn push_int(self, name: &str, value: i64) -> Self {
        let value = QueryValue::Single(Scalar::Int(value));
        self.push(name, Some(&value))
    }

    fn pair(&mut self, name: &str, value: &str) {
        self.uri.push(if self.has_query { '&' } else { '?' });
        self.uri.push_str(name);
        self.uri.push('=');
        self.uri.push_str(value);
        self.has_query = true;
    }

    pub fn build(self) -> String {
        self.uri
    }
}

/// Collapse a `?&` left behind by hand-assembled URIs.
///
/// Only the first occurrence is rewritten, so applying it to an already
/// normalized URI is a no-op.
pub fn normalize_separator(uri: &str) -> String {
    uri.replacen("?&", "?", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_is_not_encoded() {
        let value = QueryValue::from("servers");
        let uri = QueryBuilder::new("/rest/index/resources")
            .push("category", Some(&value))
            .build();
        assert_eq!(uri, "/rest/index/resources?category=servers");

        let raw = QueryValue::from("name:'my server'");
        let uri = QueryBuilder::new("/x").push("query", Some(&raw)).build();
        assert_eq!(uri, "/x?query=name:'my server'");
    }

    #[test]
    fn test_sequence_is_encoded_in_order() {
        let value = QueryValue::from(vec!["a", "b c"]);
        let uri = QueryBuilder::new("/x").push("fields", Some(&value)).build();
        assert_eq!(uri, "/x?fields=a&fields=b%20c");
    }

    #[test]
    fn test_sequence_keeps_slashes_and_duplicates() {
        let value = QueryValue::from(vec![
            "/rest/server-hardware/1",
            "/rest/server-hardware/1",
            "a=b",
        ]);
        let uri = QueryBuilder::new("/x").push("referenceUri", Some(&value)).build();
        assert_eq!(
            uri,
            "/x?referenceUri=/rest/server-hardware/1&referenceUri=/rest/server-hardware/1&referenceUri=a%3Db"
        );
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let empty_text = QueryValue::from("");
        let empty_list = QueryValue::Many(Vec::new());
        let uri = QueryBuilder::new("/x")
            .push("a", None)
            .push("b", Some(&empty_text))
            .push("c", Some(&empty_list))
            .push_int("d", 0)
            .build();
        assert_eq!(uri, "/x");
    }

    #[test]
    fn test_sequence_elements_are_never_skipped() {
        let value = QueryValue::Many(vec![Scalar::from(""), Scalar::from(0i64)]);
        let uri = QueryBuilder::new("/x").push("sort", Some(&value)).build();
        assert_eq!(uri, "/x?sort=&sort=0");
    }

    #[test]
    fn test_push_int() {
        let uri = QueryBuilder::new("/x")
            .push_int("padding", 5)
            .push_int("childLimit", -1)
            .build();
        assert_eq!(uri, "/x?padding=5&childLimit=-1");
    }

    #[test]
    fn test_from_repeated() {
        assert_eq!(QueryValue::from_repeated(vec![]), None);
        assert_eq!(
            QueryValue::from_repeated(vec!["a".to_string()]),
            Some(QueryValue::from("a"))
        );
        assert_eq!(
            QueryValue::from_repeated(vec!["a".to_string(), "b".to_string()]),
            Some(QueryValue::from(vec!["a", "b"]))
        );
    }

    #[test]
    fn test_normalize_separator() {
        assert_eq!(normalize_separator("/x?&a=1&b=2"), "/x?a=1&b=2");
        assert_eq!(normalize_separator("/x?a=1&b=2"), "/x?a=1&b=2");
        let once = normalize_separator("/x?&a=1");
        assert_eq!(normalize_separator(&once), once);
    }
}
