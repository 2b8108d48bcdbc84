//! Prepared entity index.
//!
//! Building the index parses every descriptor and embeds it once. The index is
//! immutable afterwards; a changed catalog means a fresh build, published
//! through [`IndexHandle::swap`] so concurrent searches never see a
//! half-built state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::embedding::Embedder;
use crate::entity::{Entity, EntityId};
use crate::error::{EmbeddingError, ExecutionError, PersonaResult};
use crate::handler::{EntityHandler, PersonHandler};
use crate::name::{normalize_text, NameParts};

/// One prepared catalog row.
#[derive(Debug, Clone)]
pub struct IndexedEntity<P> {
    /// The caller's entity, unchanged.
    pub entity: Entity,
    /// Parsed descriptor.
    pub parts: P,
    /// Case-folded, whitespace-collapsed descriptor; also the text that is embedded.
    pub normalized_descriptor: String,
    /// Descriptor embedding.
    pub vector: Vec<f32>,
}

/// Immutable, prepared catalog.
#[derive(Debug, Clone)]
pub struct EntityIndex<P = NameParts> {
    entries: Vec<IndexedEntity<P>>,
    dimension: usize,
    built_at: DateTime<Utc>,
    generation: u64,
}

impl<P: Clone> EntityIndex<P> {
    /// Parses and embeds every entity, preserving catalog order.
    ///
    /// # Errors
    ///
    /// Fails on the first descriptor the provider cannot embed.
    pub fn build<H>(
        entities: impl IntoIterator<Item = Entity>,
        handler: &H,
        embedder: &dyn Embedder,
    ) -> Result<Self, EmbeddingError>
    where
        H: EntityHandler<Parts = P>,
    {
        let mut entries = Vec::new();
        let mut unmatchable = 0usize;

        for entity in entities {
            let parts = handler.extract_parts(&entity.descriptor);
            if handler.is_unmatchable(&parts) {
                unmatchable += 1;
                tracing::warn!(
                    entity_id = %entity.id,
                    descriptor = %entity.descriptor,
                    "descriptor yields no lexical parts; only semantic matches possible"
                );
            }
            let normalized_descriptor = normalize_text(&entity.descriptor);
            let vector = embedder.embed_checked(&normalized_descriptor)?;
            entries.push(IndexedEntity {
                normalized_descriptor,
                entity,
                parts,
                vector,
            });
        }

        tracing::info!(
            entities = entries.len(),
            unmatchable,
            dimension = embedder.dimension(),
            "entity index built"
        );

        Ok(Self {
            entries,
            dimension: embedder.dimension(),
            built_at: Utc::now(),
            generation: 0,
        })
    }
}

impl<P> EntityIndex<P> {
    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for an empty catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, IndexedEntity<P>> {
        self.entries.iter()
    }

    /// Entry at a catalog position.
    #[must_use]
    pub fn entry(&self, position: usize) -> Option<&IndexedEntity<P>> {
        self.entries.get(position)
    }

    /// First entry with the given id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&IndexedEntity<P>> {
        self.entries.iter().find(|e| e.entity.id == id)
    }

    /// Embedding dimension used at build time.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Build timestamp.
    #[must_use]
    pub const fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Generation assigned by the [`IndexHandle`] that published this index;
    /// zero for an unpublished index.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl<'a, P> IntoIterator for &'a EntityIndex<P> {
    type Item = &'a IndexedEntity<P>;
    type IntoIter = std::slice::Iter<'a, IndexedEntity<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builds a person-name index.
///
/// # Errors
///
/// Fails on the first descriptor the provider cannot embed.
pub fn build_index(
    entities: impl IntoIterator<Item = Entity>,
    embedder: &dyn Embedder,
) -> Result<EntityIndex<NameParts>, EmbeddingError> {
    EntityIndex::build(entities, &PersonHandler, embedder)
}

fn lock_err(context: &str) -> ExecutionError {
    ExecutionError::IndexUnavailable {
        message: format!("poisoned lock: {context}"),
    }
}

/// Atomically swappable reference to the current index.
///
/// Readers clone an [`Arc`] under a short read lock and search without
/// holding it, so a swap never waits on a running search and a running search
/// keeps its snapshot until it finishes.
#[derive(Debug)]
pub struct IndexHandle<P = NameParts> {
    current: RwLock<Arc<EntityIndex<P>>>,
    generation: AtomicU64,
}

impl<P> IndexHandle<P> {
    /// Publishes `index` as generation 1.
    #[must_use]
    pub fn new(mut index: EntityIndex<P>) -> Self {
        index.generation = 1;
        Self {
            current: RwLock::new(Arc::new(index)),
            generation: AtomicU64::new(1),
        }
    }

    /// Snapshot of the current index.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::IndexUnavailable`] if the lock is poisoned.
    pub fn load(&self) -> PersonaResult<Arc<EntityIndex<P>>> {
        let guard = self.current.read().map_err(|_| lock_err("index.load"))?;
        Ok(Arc::clone(&guard))
    }

    /// Replaces the current index and returns its generation.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::IndexUnavailable`] if the lock is poisoned.
    pub fn swap(&self, mut index: EntityIndex<P>) -> PersonaResult<u64> {
        let next = Arc::new({
            index.generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            index
        });
        let generation = next.generation;
        let entities = next.len();
        *self.current.write().map_err(|_| lock_err("index.swap"))? = next;
        tracing::info!(generation, entities, "entity index swapped");
        Ok(generation)
    }

    /// Generation of the most recently published index.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl<P: Clone> IndexHandle<P> {
    /// Builds a new index off-lock, then swaps it in.
    ///
    /// # Errors
    ///
    /// Provider errors leave the current index in place.
    pub fn rebuild<H>(
        &self,
        entities: impl IntoIterator<Item = Entity>,
        handler: &H,
        embedder: &dyn Embedder,
    ) -> PersonaResult<u64>
    where
        H: EntityHandler<Parts = P>,
    {
        let index = EntityIndex::build(entities, handler, embedder)?;
        self.swap(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::error::PersonaError;

    struct Offline;

    impl Embedder for Offline {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::ProviderUnavailable {
                message: "offline".into(),
            })
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    fn catalog() -> Vec<Entity> {
        vec![
            Entity::keyed("a", "John  Smith - Engineer"),
            Entity::keyed("b", "Madonna"),
            Entity::keyed("c", " - CEO"),
        ]
    }

    #[test]
    fn build_preserves_order_and_prepares_entries() {
        let embedder = HashingEmbedder::with_dim(32);
        let index = build_index(catalog(), &embedder).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), 32);
        assert_eq!(index.generation(), 0);
        let first = index.entry(0).unwrap();
        assert_eq!(first.entity.id, EntityId::from_key("a"));
        assert_eq!(first.normalized_descriptor, "john smith - engineer");
        assert_eq!(first.parts.last.as_deref(), Some("Smith"));
        assert_eq!(first.vector.len(), 32);

        // Unmatchable descriptors are kept for semantic search.
        let empty = index.get(EntityId::from_key("c")).unwrap();
        assert!(empty.parts.is_empty());
    }

    #[test]
    fn empty_catalog_builds() {
        let index = build_index(Vec::new(), &HashingEmbedder::default()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.iter().count(), 0);
    }

    #[test]
    fn build_fails_on_provider_error() {
        let err = build_index(catalog(), &Offline).unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderUnavailable { .. }));
    }

    #[test]
    fn swap_publishes_new_generation() {
        let embedder = HashingEmbedder::default();
        let handle = IndexHandle::new(build_index(catalog(), &embedder).unwrap());
        assert_eq!(handle.generation(), 1);

        let before = handle.load().unwrap();
        let generation = handle
            .rebuild(vec![Entity::new("Ada Lovelace")], &PersonHandler, &embedder)
            .unwrap();
        assert_eq!(generation, 2);

        // Old snapshot is untouched.
        assert_eq!(before.len(), 3);
        assert_eq!(before.generation(), 1);
        let after = handle.load().unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after.generation(), 2);
    }

    #[test]
    fn failed_rebuild_keeps_current_index() {
        let handle = IndexHandle::new(build_index(catalog(), &HashingEmbedder::default()).unwrap());
        let err = handle.rebuild(catalog(), &PersonHandler, &Offline).unwrap_err();
        assert!(matches!(err, PersonaError::Embedding(_)));
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.load().unwrap().len(), 3);
    }
}
