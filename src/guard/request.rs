//! Transport-agnostic admission request types.
//!
//! The webhook layer converts the wire `AdmissionRequest` into a
//! [`ReviewRequest`] so the decision engine never depends on the envelope.

use std::fmt;

use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, Operation};

/// Operation being admitted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReviewOperation {
    Create,
    Update,
    Delete,
    Connect,
}

impl ReviewOperation {
    /// Upper-case wire name, as the API server sends it
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOperation::Create => "CREATE",
            ReviewOperation::Update => "UPDATE",
            ReviewOperation::Delete => "DELETE",
            ReviewOperation::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for ReviewOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&Operation> for ReviewOperation {
    fn from(op: &Operation) -> Self {
        match op {
            Operation::Create => ReviewOperation::Create,
            Operation::Update => ReviewOperation::Update,
            Operation::Delete => ReviewOperation::Delete,
            Operation::Connect => ReviewOperation::Connect,
        }
    }
}

/// Group/version/resource descriptor of the object under review
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceType {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl ResourceType {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// The core/v1 `namespaces` resource, the only type this guard reviews
    pub fn namespaces() -> Self {
        Self::new("", "v1", "namespaces")
    }

    /// Exact match against the core/v1 `namespaces` resource
    pub fn is_namespace(&self) -> bool {
        self.group.is_empty() && self.version == "v1" && self.resource == "namespaces"
    }
}

/// Renders `v1/pods` for the core group and `apps/v1/deployments` otherwise.
impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.resource)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

/// One admission review, as seen by the decision engine
///
/// Carries no object annotations: the bypass marker is always read from the
/// live namespace, since a DELETE review normally has no embedded object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewRequest {
    /// Request UID, echoed in the response
    pub uid: String,
    /// Operation being admitted
    pub operation: ReviewOperation,
    /// Resource type of the target object
    pub resource: ResourceType,
    /// Target object name (the namespace name)
    pub name: String,
    /// Requesting principal
    pub username: String,
}

impl ReviewRequest {
    /// Convenience constructor for a namespace DELETE review
    pub fn delete_namespace(name: &str) -> Self {
        Self {
            uid: String::new(),
            operation: ReviewOperation::Delete,
            resource: ResourceType::namespaces(),
            name: name.to_string(),
            username: String::new(),
        }
    }
}

impl From<&AdmissionRequest<DynamicObject>> for ReviewRequest {
    fn from(request: &AdmissionRequest<DynamicObject>) -> Self {
        Self {
            uid: request.uid.clone(),
            operation: ReviewOperation::from(&request.operation),
            resource: ResourceType {
                group: request.resource.group.clone(),
                version: request.resource.version.clone(),
                resource: request.resource.resource.clone(),
            },
            name: request.name.clone(),
            username: request.user_info.username.clone().unwrap_or_default(),
        }
    }
}
