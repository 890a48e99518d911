//! Value resolvers: pure conversions between LDAP attribute-value strings
//! and native SCIM scalars (spec.md §4.1).
//!
//! Each resolver is a stateless, zero-sized type, safe to share across any
//! number of threads without synchronization, the way the teacher's
//! `SchemaMapper` implementations in `resource/mapper.rs` are stateless.

use crate::descriptor::AttributeDescriptor;
use crate::error::MappingError;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset};

/// A decoded native scalar. This is the "T" the spec.md §4.1 resolver pair
/// (`toInstance`/`fromInstance`) converts to and from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Bool(bool),
    DateTime(DateTime<FixedOffset>),
    Binary(Vec<u8>),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A value resolver for one scalar type: decode an LDAP attribute-value
/// string into `Self::Instance`, and encode it back.
///
/// `from_instance` takes the owning descriptor because some encodings (none
/// of the four shipped here, but conceivably a future resolver) depend on
/// descriptor metadata such as `case_exact`.
pub trait ValueResolver {
    type Instance;

    fn to_instance(&self, attribute: &str, raw: &str) -> Result<Self::Instance, MappingError>;
    fn from_instance(&self, descriptor: &AttributeDescriptor, value: &Self::Instance) -> String;
}

/// Identity resolver: LDAP strings are already SCIM strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringResolver;

impl ValueResolver for StringResolver {
    type Instance = String;

    fn to_instance(&self, _attribute: &str, raw: &str) -> Result<String, MappingError> {
        Ok(raw.to_string())
    }

    fn from_instance(&self, _descriptor: &AttributeDescriptor, value: &String) -> String {
        value.clone()
    }
}

/// LDAP boolean syntax (RFC 4517 §3.3.3) is the literal strings `TRUE`/`FALSE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanResolver;

impl ValueResolver for BooleanResolver {
    type Instance = bool;

    fn to_instance(&self, attribute: &str, raw: &str) -> Result<bool, MappingError> {
        match raw.to_ascii_uppercase().as_str() {
            "TRUE" => Ok(true),
            "FALSE" => Ok(false),
            _ => Err(MappingError::MalformedValue {
                attribute: attribute.to_string(),
                detail: format!("'{raw}' is not a valid LDAP boolean"),
            }),
        }
    }

    fn from_instance(&self, _descriptor: &AttributeDescriptor, value: &bool) -> String {
        if *value { "TRUE" } else { "FALSE" }.to_string()
    }
}

/// RFC 3339 date-time, encoded/decoded via `chrono` the way the teacher's
/// `SchemaRegistry::is_valid_datetime_format` already validates datetimes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeResolver;

impl ValueResolver for DateTimeResolver {
    type Instance = DateTime<FixedOffset>;

    fn to_instance(
        &self,
        attribute: &str,
        raw: &str,
    ) -> Result<DateTime<FixedOffset>, MappingError> {
        DateTime::parse_from_rfc3339(raw).map_err(|e| MappingError::MalformedValue {
            attribute: attribute.to_string(),
            detail: format!("'{raw}' is not RFC3339: {e}"),
        })
    }

    fn from_instance(
        &self,
        _descriptor: &AttributeDescriptor,
        value: &DateTime<FixedOffset>,
    ) -> String {
        value.to_rfc3339()
    }
}

/// Binary attributes travel as base64 in SCIM and as raw octets in LDAP;
/// this resolver decodes/encodes at that boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryResolver;

impl ValueResolver for BinaryResolver {
    type Instance = Vec<u8>;

    fn to_instance(&self, attribute: &str, raw: &str) -> Result<Vec<u8>, MappingError> {
        base64::engine::general_purpose::STANDARD
            .decode(raw)
            .map_err(|e| MappingError::MalformedValue {
                attribute: attribute.to_string(),
                detail: format!("invalid base64: {e}"),
            })
    }

    fn from_instance(&self, _descriptor: &AttributeDescriptor, value: &Vec<u8>) -> String {
        base64::engine::general_purpose::STANDARD.encode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AttributeDescriptor, Cardinality, ScimDataType};

    fn dummy_descriptor() -> AttributeDescriptor {
        AttributeDescriptor::new(
            "x",
            "urn:test",
            ScimDataType::String,
            Cardinality::Single,
        )
    }

    #[test]
    fn string_round_trip() {
        let r = StringResolver;
        let d = dummy_descriptor();
        let v = r.to_instance("x", "hello").unwrap();
        assert_eq!(r.from_instance(&d, &v), "hello");
    }

    #[test]
    fn boolean_round_trip_and_case_insensitive_decode() {
        let r = BooleanResolver;
        let d = dummy_descriptor();
        assert_eq!(r.to_instance("active", "TRUE").unwrap(), true);
        assert_eq!(r.to_instance("active", "false").unwrap(), false);
        assert_eq!(r.from_instance(&d, &true), "TRUE");
        assert!(r.to_instance("active", "yes").is_err());
    }

    #[test]
    fn datetime_round_trip() {
        let r = DateTimeResolver;
        let d = dummy_descriptor();
        let raw = "2020-01-02T03:04:05+00:00";
        let v = r.to_instance("meta.created", raw).unwrap();
        let back = r.from_instance(&d, &v);
        assert_eq!(r.to_instance("meta.created", &back).unwrap(), v);
        assert!(r.to_instance("meta.created", "not-a-date").is_err());
    }

    #[test]
    fn binary_round_trip() {
        let r = BinaryResolver;
        let d = dummy_descriptor();
        let original = vec![0u8, 1, 2, 250, 255];
        let encoded = r.from_instance(&d, &original);
        let decoded = r.to_instance("photo", &encoded).unwrap();
        assert_eq!(decoded, original);
        assert!(r.to_instance("photo", "not base64!!").is_err());
    }
}
