//! The in-memory SCIM resource model: attributes, values, and the resource
//! that holds them (spec.md §3).
//!
//! Grounded on the teacher's `resource/core.rs`, which represents a SCIM
//! resource as a descriptor-tagged attribute map; simplified here since
//! this crate does not perform schema validation, only translation.

use crate::descriptor::AttributeDescriptor;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// One element of a multi-valued attribute: an optional `type` discriminator
/// (e.g. `work`/`home`), the primary value, and any remaining sub-attributes
/// that don't participate in mapping but must round-trip on GET.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiValuedElement {
    pub type_: Option<String>,
    pub value: String,
    pub extra: HashMap<String, JsonValue>,
}

impl MultiValuedElement {
    pub fn new(type_: Option<impl Into<String>>, value: impl Into<String>) -> Self {
        Self {
            type_: type_.map(Into::into),
            value: value.into(),
            extra: HashMap::new(),
        }
    }

    pub fn is_type(&self, candidate: &str) -> bool {
        self.type_.as_deref() == Some(candidate)
    }
}

/// The value carried by a [`ScimAttribute`]: either a single scalar, a
/// complex (nested) object, or a sequence of multi-valued elements.
#[derive(Debug, Clone, PartialEq)]
pub enum ScimValue {
    Single(String),
    Complex(HashMap<String, ScimValue>),
    Multi(Vec<MultiValuedElement>),
}

impl ScimValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            ScimValue::Single(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&HashMap<String, ScimValue>> {
        match self {
            ScimValue::Complex(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[MultiValuedElement]> {
        match self {
            ScimValue::Multi(v) => Some(v),
            _ => None,
        }
    }
}

/// One named attribute on a resource: its descriptor plus its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimAttribute {
    pub descriptor: AttributeDescriptor,
    pub value: ScimValue,
}

impl ScimAttribute {
    pub fn new(descriptor: AttributeDescriptor, value: ScimValue) -> Self {
        Self { descriptor, value }
    }
}

/// A full SCIM resource: its kind (`User`, `Group`, ...), canonical id, and
/// its attribute map. Attributes absent from the map are treated as
/// "not present" rather than "present with empty value" (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct ScimResource {
    pub resource_type: String,
    pub id: Option<String>,
    attributes: HashMap<String, ScimAttribute>,
}

impl ScimResource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, attribute: ScimAttribute) {
        self.attributes.insert(name.into(), attribute);
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: ScimAttribute) -> Self {
        self.set(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ScimAttribute> {
        self.attributes.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&ScimValue> {
        self.get(name).map(|a| &a.value)
    }

    pub fn single(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(ScimValue::as_single)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScimAttribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Cardinality, ScimDataType};

    fn string_descriptor(name: &str) -> AttributeDescriptor {
        AttributeDescriptor::new(name, "urn:test", ScimDataType::String, Cardinality::Single)
    }

    #[test]
    fn absent_attribute_is_none_not_empty() {
        let resource = ScimResource::new("User");
        assert!(!resource.has("userName"));
        assert_eq!(resource.single("userName"), None);
    }

    #[test]
    fn single_valued_round_trip() {
        let resource = ScimResource::new("User").with_attribute(
            "userName",
            ScimAttribute::new(string_descriptor("userName"), ScimValue::Single("bjensen".into())),
        );
        assert_eq!(resource.single("userName"), Some("bjensen"));
    }

    #[test]
    fn multi_valued_element_type_discrimination() {
        let elements = vec![
            MultiValuedElement::new(Some("work"), "bjensen@example.com"),
            MultiValuedElement::new(Some("home"), "b.jensen@example.com"),
        ];
        let work = elements.iter().find(|e| e.is_type("work")).unwrap();
        assert_eq!(work.value, "bjensen@example.com");
    }
}
