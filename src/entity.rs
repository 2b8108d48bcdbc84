//! Entity types and identity.
//!
//! An entity is a catalog row: an opaque identifier plus the raw descriptor
//! text the matcher reads. Entities are owned by the caller and are never
//! mutated by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for identifiers derived from caller-supplied keys.
const ENTITY_KEY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_5a0e_9d2b_4c6e_8a41_3b7d_2e90_c5f1);

/// Stable, opaque entity identifier.
///
/// # Examples
///
/// ```
/// use persona::EntityId;
///
/// let a = EntityId::from_key("emp-1042");
/// let b = EntityId::from_key("emp-1042");
/// assert_eq!(a, b);
/// assert!(!a.is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives a deterministic ID from a caller key (e.g. a database primary key).
    ///
    /// The same key always yields the same ID, so catalogs rebuilt from the
    /// same source produce identical result identifiers.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        Self(Uuid::new_v5(&ENTITY_KEY_NAMESPACE, key.as_bytes()))
    }

    /// Creates an entity ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Classification of entity types.
///
/// The type selects the handler that extracts parts and scores queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A human person
    #[default]
    Person,
    /// A geographic location
    Location,
    /// A work role or job title
    Role,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => write!(f, "person"),
            Self::Location => write!(f, "location"),
            Self::Role => write!(f, "role"),
        }
    }
}

/// A catalog entry.
///
/// # Examples
///
/// ```
/// use persona::{Entity, EntityType};
///
/// let entity = Entity::new("John Smith - Engineer");
/// assert_eq!(entity.entity_type, EntityType::Person);
/// assert_eq!(entity.descriptor, "John Smith - Engineer");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Opaque identifier
    pub id: EntityId,

    /// Free-text label: a name segment and optional trailing context.
    pub descriptor: String,

    #[serde(default)]
    pub entity_type: EntityType,

    /// Arbitrary caller metadata, carried through untouched.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Entity {
    /// Creates a person entity with a random ID.
    #[must_use]
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self::with_id(EntityId::new(), descriptor)
    }

    /// Creates a person entity with a specific ID.
    #[must_use]
    pub fn with_id(id: EntityId, descriptor: impl Into<String>) -> Self {
        Self {
            id,
            descriptor: descriptor.into(),
            entity_type: EntityType::Person,
            metadata: serde_json::Value::Null,
        }
    }

    /// Creates a person entity whose ID is derived from a caller key.
    #[must_use]
    pub fn keyed(key: &str, descriptor: impl Into<String>) -> Self {
        Self::with_id(EntityId::from_key(key), descriptor)
    }

    /// Returns the same entity tagged with a different type.
    #[must_use]
    pub fn of_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = entity_type;
        self
    }

    /// Attaches caller metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
