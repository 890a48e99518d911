//! Request value objects for the four backend operations (spec.md §4.5, §6).
//!
//! Each carries a `request_id` for log correlation, generated the way the
//! teacher's `RequestContext` generates one (`uuid::Uuid::new_v4()`)
//! when the caller doesn't supply its own.

use crate::resource::ScimResource;
use crate::selection::AttributeSelection;

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// GET one resource by id.
#[derive(Debug, Clone)]
pub struct GetRequest {
    pub resource_type: String,
    pub id: String,
    pub selection: AttributeSelection,
    pub request_id: String,
}

impl GetRequest {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            selection: AttributeSelection::All,
            request_id: new_request_id(),
        }
    }

    pub fn with_selection(mut self, selection: AttributeSelection) -> Self {
        self.selection = selection;
        self
    }
}

/// POST a new resource.
#[derive(Debug, Clone)]
pub struct PostRequest {
    pub resource_type: String,
    pub resource: ScimResource,
    pub request_id: String,
}

impl PostRequest {
    pub fn new(resource_type: impl Into<String>, resource: ScimResource) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource,
            request_id: new_request_id(),
        }
    }
}

/// PUT a full replacement of an existing resource.
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub resource_type: String,
    pub id: String,
    pub resource: ScimResource,
    pub request_id: String,
}

impl PutRequest {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>, resource: ScimResource) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            resource,
            request_id: new_request_id(),
        }
    }
}

/// DELETE a resource by id.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub resource_type: String,
    pub id: String,
    pub request_id: String,
}

impl DeleteRequest {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            request_id: new_request_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_request_gets_a_distinct_correlation_id() {
        let a = GetRequest::new("User", "uid=a,dc=example,dc=com");
        let b = GetRequest::new("User", "uid=b,dc=example,dc=com");
        assert_ne!(a.request_id, b.request_id);
    }
}
