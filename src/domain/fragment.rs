use serde_json::{Map, Value};
use uuid::Uuid;

pub type FragmentMetadata = Map<String, Value>;

/// A piece of text recorded in the semantic index together with its
/// caller-supplied metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub id: FragmentId,
    pub text: String,
    pub metadata: FragmentMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentId(Uuid);

impl FragmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FragmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Fragment {
    pub fn new(text: String, metadata: FragmentMetadata) -> Self {
        Self {
            id: FragmentId::new(),
            text,
            metadata,
        }
    }
}
