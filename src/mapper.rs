//! Resource mappers: the translation between SCIM resources and directory
//! entries (spec.md §4.3).
//!
//! Grounded on the teacher's `resource_handlers/user.rs` getter/setter
//! builder shape and `resource/mapper.rs`'s `SchemaMapper` trait, generalized
//! to an object-safe `dyn ResourceMapper` so a [`crate::context::ScimLdapContext`]
//! can hold a heterogeneous registry of them (spec.md §4.3: "zero or more
//! mappers may contribute attributes to the same resource kind").

use crate::directory::{DirectoryEntry, Modification};
use crate::error::MappingError;
use crate::resource::{MultiValuedElement, ScimAttribute, ScimResource, ScimValue};

/// Translates between one SCIM resource kind and directory entries.
///
/// A mapper that returns `true` from [`ResourceMapper::is_creator`] is
/// responsible for choosing the entry's DN and populating the attributes
/// that establish object classes; at most one such mapper may be registered
/// per resource kind (spec.md §4.3, enforced by
/// [`crate::context::ScimLdapContext::register`]). Non-creator mappers only
/// ever add or modify attributes on an entry someone else created.
pub trait ResourceMapper: Send + Sync {
    /// The SCIM resource kind this mapper handles, e.g. `"User"`.
    fn resource_type(&self) -> &str;

    fn is_creator(&self) -> bool {
        false
    }

    /// Build a brand-new directory entry from a resource about to be
    /// created. Only called on the creator-capable mapper.
    fn to_entry(&self, resource: &ScimResource) -> Result<DirectoryEntry, MappingError>;

    /// Contribute attributes onto a jointly-built entry after a creator has
    /// produced the skeleton (spec.md §4.3 operation 3, `toLDAPAttributes`).
    /// Called on every non-creator mapper during POST; never on the creator,
    /// which uses [`ResourceMapper::to_entry`] instead. Default: no
    /// contribution.
    fn to_attributes(&self, _resource: &ScimResource) -> Vec<(String, Vec<String>)> {
        Vec::new()
    }

    /// Populate this mapper's attributes onto `resource` from `entry`. Called
    /// for every registered mapper of the resource's kind, in registration
    /// order, so that later mappers can overlay earlier ones (spec.md §4.3:
    /// "last mapper wins" on conflicting attribute names).
    fn from_entry(&self, entry: &DirectoryEntry, resource: &mut ScimResource);

    /// Compute the directory modifications needed to move `entry` toward the
    /// state implied by `desired`, restricted to the attributes this mapper
    /// owns. The diff policy (spec.md §4.3) is per-attribute: values present
    /// in `desired` but not `entry` become `Add`, values in `entry` but not
    /// `desired` become `Delete`, and an attribute whose entire value set
    /// changed becomes `Replace`.
    fn diff(
        &self,
        entry: &DirectoryEntry,
        desired: &ScimResource,
    ) -> Result<Vec<Modification>, MappingError>;
}

/// Compare two value sets order-independently and decide which kind of LDAP
/// modification (if any) covers the difference (spec.md §4.3: "a replace
/// only if the value set differs (order-independent compare)"). Shared by
/// every mapper's `diff`.
pub fn diff_values(name: &str, current: &[String], desired: &[String]) -> Option<Modification> {
    if value_sets_equal(current, desired) {
        return None;
    }
    if desired.is_empty() {
        return Some(Modification::Delete {
            name: name.to_string(),
            values: current.to_vec(),
        });
    }
    if current.is_empty() {
        return Some(Modification::Add {
            name: name.to_string(),
            values: desired.to_vec(),
        });
    }
    Some(Modification::Replace {
        name: name.to_string(),
        values: desired.to_vec(),
    })
}

/// True if two value lists hold the same multiset of values, regardless of
/// order. A multi-valued attribute like `mail` can come back from the
/// directory in a different order than the desired resource lists it; that
/// alone must not count as a change.
fn value_sets_equal(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}

fn required_single(resource: &ScimResource, name: &str) -> Result<String, MappingError> {
    resource
        .single(name)
        .map(str::to_string)
        .ok_or_else(|| MappingError::IncompleteResource(name.to_string()))
}

fn multi_by_type<'a>(resource: &'a ScimResource, name: &str, type_: &str) -> Option<&'a MultiValuedElement> {
    resource
        .value(name)
        .and_then(ScimValue::as_multi)
        .and_then(|elements| elements.iter().find(|e| e.is_type(type_)))
}

/// The sole creator-capable mapper for `User`, translating to/from the LDAP
/// `inetOrgPerson` object class. Reconciles spec.md §8's worked example: `cn`
/// is derived from `name.formatted` when present, falling back to composed
/// `givenName family Name`, while `uid` always comes from `userName`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InetOrgPersonMapper;

const OBJECT_CLASSES: &[&str] = &["top", "person", "organizationalPerson", "inetOrgPerson"];

impl InetOrgPersonMapper {
    fn common_name(resource: &ScimResource) -> Result<String, MappingError> {
        if let Some(name) = resource.value("name").and_then(ScimValue::as_complex) {
            if let Some(formatted) = name.get("formatted").and_then(ScimValue::as_single) {
                return Ok(formatted.to_string());
            }
            let given = name.get("givenName").and_then(ScimValue::as_single);
            let family = name.get("familyName").and_then(ScimValue::as_single);
            if let (Some(given), Some(family)) = (given, family) {
                return Ok(format!("{given} {family}"));
            }
        }
        Err(MappingError::IncompleteResource("name".to_string()))
    }
}

impl ResourceMapper for InetOrgPersonMapper {
    fn resource_type(&self) -> &str {
        "User"
    }

    fn is_creator(&self) -> bool {
        true
    }

    fn to_entry(&self, resource: &ScimResource) -> Result<DirectoryEntry, MappingError> {
        let uid = required_single(resource, "userName")?;
        let cn = Self::common_name(resource)?;

        // Relative DN only; the backend suffixes it with the configured base
        // DN before submitting the add (spec.md §6: "baseDN: parent
        // distinguished name under which POST creates entries").
        let mut entry = DirectoryEntry::new(format!("uid={uid}"));
        entry.set("objectClass", OBJECT_CLASSES.iter().map(|s| s.to_string()).collect());
        entry.set("uid", vec![uid]);
        entry.set("cn", vec![cn]);

        if let Some(name) = resource.value("name").and_then(ScimValue::as_complex) {
            if let Some(given) = name.get("givenName").and_then(ScimValue::as_single) {
                entry.set("givenName", vec![given.to_string()]);
            }
            if let Some(family) = name.get("familyName").and_then(ScimValue::as_single) {
                entry.set("sn", vec![family.to_string()]);
            }
        }

        if let Some(emails) = resource.value("emails").and_then(ScimValue::as_multi) {
            entry.set(
                "mail",
                emails.iter().map(|e| e.value.clone()).collect(),
            );
        }

        if let Some(work) = multi_by_type(resource, "phoneNumbers", "work") {
            entry.set("telephoneNumber", vec![work.value.clone()]);
        }
        if let Some(home) = multi_by_type(resource, "phoneNumbers", "home") {
            entry.set("homePhone", vec![home.value.clone()]);
        }

        if let Some(work) = multi_by_type(resource, "addresses", "work") {
            entry.set("postalAddress", vec![work.value.clone()]);
            copy_sub_attributes(work, &mut entry, "street", "st", "l", "postalCode");
        }
        if let Some(home) = multi_by_type(resource, "addresses", "home") {
            entry.set("homePostalAddress", vec![home.value.clone()]);
        }

        Ok(entry)
    }

    fn from_entry(&self, entry: &DirectoryEntry, resource: &mut ScimResource) {
        set_single(resource, entry, "userName", "uid");
        set_single(resource, entry, "cn", "cn");
        set_single(resource, entry, "givenName", "givenName");
        set_single(resource, entry, "sn", "sn");

        let emails: Vec<MultiValuedElement> = entry
            .values("mail")
            .iter()
            .map(|v| MultiValuedElement::new(None::<String>, v.clone()))
            .collect();
        if !emails.is_empty() {
            resource.set("emails", multi_attribute("emails", emails));
        }

        let mut phones = Vec::new();
        if let Some(work) = entry.first("telephoneNumber") {
            phones.push(MultiValuedElement::new(Some("work"), work.to_string()));
        }
        if let Some(home) = entry.first("homePhone") {
            phones.push(MultiValuedElement::new(Some("home"), home.to_string()));
        }
        if !phones.is_empty() {
            resource.set("phoneNumbers", multi_attribute("phoneNumbers", phones));
        }

        let mut addresses = Vec::new();
        if let Some(work) = entry.first("postalAddress") {
            let mut element = MultiValuedElement::new(Some("work"), work.to_string());
            for (ldap_name, key) in [
                ("street", "street"),
                ("st", "st"),
                ("l", "l"),
                ("postalCode", "postalCode"),
            ] {
                if let Some(value) = entry.first(ldap_name) {
                    element.extra.insert(key.to_string(), serde_json::Value::String(value.to_string()));
                }
            }
            addresses.push(element);
        }
        if let Some(home) = entry.first("homePostalAddress") {
            addresses.push(MultiValuedElement::new(Some("home"), home.to_string()));
        }
        if !addresses.is_empty() {
            resource.set("addresses", multi_attribute("addresses", addresses));
        }
    }

    fn diff(
        &self,
        entry: &DirectoryEntry,
        desired: &ScimResource,
    ) -> Result<Vec<Modification>, MappingError> {
        let proposed = self.to_entry(desired)?;
        let mut mods = Vec::new();
        for name in [
            "cn",
            "givenName",
            "sn",
            "mail",
            "telephoneNumber",
            "homePhone",
            "postalAddress",
            "street",
            "st",
            "l",
            "postalCode",
            "homePostalAddress",
        ] {
            if let Some(m) = diff_values(name, entry.values(name), proposed.values(name)) {
                mods.push(m);
            }
        }
        Ok(mods)
    }
}

fn multi_attribute(name: &str, elements: Vec<MultiValuedElement>) -> ScimAttribute {
    ScimAttribute::new(
        crate::descriptor::AttributeDescriptor::new(
            name,
            "urn:ietf:params:scim:schemas:core:2.0:User",
            crate::descriptor::ScimDataType::Complex,
            crate::descriptor::Cardinality::Multi,
        ),
        ScimValue::Multi(elements),
    )
}

fn copy_sub_attributes(
    element: &MultiValuedElement,
    entry: &mut DirectoryEntry,
    street: &str,
    region: &str,
    locality: &str,
    postal_code: &str,
) {
    for (key, ldap_name) in [
        (street, "street"),
        (region, "st"),
        (locality, "l"),
        (postal_code, "postalCode"),
    ] {
        if let Some(serde_json::Value::String(v)) = element.extra.get(key) {
            entry.set(ldap_name, vec![v.clone()]);
        }
    }
}

fn set_single(resource: &mut ScimResource, entry: &DirectoryEntry, scim_name: &str, ldap_name: &str) {
    if let Some(value) = entry.first(ldap_name) {
        resource.set(
            scim_name,
            ScimAttribute::new(
                crate::descriptor::AttributeDescriptor::new(
                    scim_name,
                    "urn:ietf:params:scim:schemas:core:2.0:User",
                    crate::descriptor::ScimDataType::String,
                    crate::descriptor::Cardinality::Single,
                ),
                ScimValue::Single(value.to_string()),
            ),
        );
    }
}

/// A non-creator mapper demonstrating multi-mapper composition (spec.md
/// §4.3): contributes `description` without owning entry creation or DN
/// assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionMapper;

impl ResourceMapper for DescriptionMapper {
    fn resource_type(&self) -> &str {
        "User"
    }

    fn to_entry(&self, _resource: &ScimResource) -> Result<DirectoryEntry, MappingError> {
        unreachable!("DescriptionMapper is not creator-capable")
    }

    fn to_attributes(&self, resource: &ScimResource) -> Vec<(String, Vec<String>)> {
        resource
            .single("description")
            .map(|v| vec![("description".to_string(), vec![v.to_string()])])
            .unwrap_or_default()
    }

    fn from_entry(&self, entry: &DirectoryEntry, resource: &mut ScimResource) {
        set_single(resource, entry, "description", "description");
    }

    fn diff(
        &self,
        entry: &DirectoryEntry,
        desired: &ScimResource,
    ) -> Result<Vec<Modification>, MappingError> {
        let desired_values = desired
            .single("description")
            .map(|s| vec![s.to_string()])
            .unwrap_or_default();
        Ok(diff_values("description", entry.values("description"), &desired_values).into_iter().collect())
    }
}
