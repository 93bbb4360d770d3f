//! Resolvable entity references

use heapless::String;

use super::types::{bounded, MAX_KEY_LEN};
use crate::traits::{EntityId, EntityResolver};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle to a scene object with a lookup-key fallback
///
/// Resolution order: the direct handle if it is still live, then the
/// cached result of an earlier lookup if that is still live, then a lookup
/// by key. Results are only cached outside design-time editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityReference {
    /// Direct handle, if the loader had one
    #[cfg_attr(feature = "serde", serde(default))]
    pub handle: Option<EntityId>,
    /// Lookup key (object name or path)
    #[cfg_attr(feature = "serde", serde(default))]
    pub key: String<MAX_KEY_LEN>,
    #[cfg_attr(feature = "serde", serde(skip))]
    cached: Option<EntityId>,
}

impl EntityReference {
    /// Reference by lookup key only
    pub fn by_key(key: &str) -> Self {
        Self {
            handle: None,
            key: bounded(key),
            cached: None,
        }
    }

    /// Reference by direct handle with a fallback key
    pub fn with_handle(handle: EntityId, key: &str) -> Self {
        Self {
            handle: Some(handle),
            key: bounded(key),
            cached: None,
        }
    }

    /// Lookup key
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Resolve without caching
    pub fn resolve<R: EntityResolver + ?Sized>(&self, resolver: &R) -> Option<EntityId> {
        if let Some(handle) = self.handle.filter(|h| resolver.is_live(*h)) {
            return Some(handle);
        }
        if let Some(cached) = self.cached.filter(|c| resolver.is_live(*c)) {
            return Some(cached);
        }
        if self.key.is_empty() {
            return None;
        }
        resolver.lookup(self.key.as_str())
    }

    /// Resolve, caching a key lookup unless the resolver is in design time
    pub fn resolve_cached<R: EntityResolver + ?Sized>(&mut self, resolver: &R) -> Option<EntityId> {
        let resolved = self.resolve(resolver);
        if resolver.is_design_time() {
            self.cached = None;
        } else if resolved != self.handle {
            self.cached = resolved;
        }
        resolved
    }

    /// True iff the handle is live or the key resolves
    ///
    /// A cached lookup result does not count: the reference is only valid
    /// while one of its own sources still points at a live object.
    pub fn is_valid<R: EntityResolver + ?Sized>(&self, resolver: &R) -> bool {
        self.handle.is_some_and(|h| resolver.is_live(h))
            || (!self.key.is_empty() && resolver.lookup(self.key.as_str()).is_some())
    }

    /// Drop any cached lookup result
    pub fn clear_cache(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockWorld;

    #[test]
    fn test_live_handle_wins() {
        let mut world = MockWorld::new();
        let valve = world.spawn("valve");
        let other = world.spawn("other");
        let reference = EntityReference::with_handle(valve, "other");
        assert_eq!(reference.resolve(&world), Some(valve));
        assert_ne!(reference.resolve(&world), Some(other));
    }

    #[test]
    fn test_dead_handle_falls_back_to_key() {
        let mut world = MockWorld::new();
        let stale = world.spawn("valve");
        world.despawn(stale);
        let fresh = world.spawn("valve");

        let reference = EntityReference::with_handle(stale, "valve");
        assert_eq!(reference.resolve(&world), Some(fresh));
        assert!(reference.is_valid(&world));
    }

    #[test]
    fn test_invalid_when_nothing_resolves() {
        let world = MockWorld::new();
        assert!(!EntityReference::by_key("missing").is_valid(&world));
        assert!(!EntityReference::default().is_valid(&world));
    }

    #[test]
    fn test_cache_only_outside_design_time() {
        let mut world = MockWorld::new();
        let valve = world.spawn("valve");

        world.set_design_time(true);
        let mut reference = EntityReference::by_key("valve");
        assert_eq!(reference.resolve_cached(&world), Some(valve));
        world.rename(valve, "renamed");
        assert_eq!(reference.resolve_cached(&world), None);

        world.set_design_time(false);
        world.rename(valve, "valve");
        assert_eq!(reference.resolve_cached(&world), Some(valve));
        world.rename(valve, "renamed");
        // Cached handle is still live
        assert_eq!(reference.resolve_cached(&world), Some(valve));
    }

    #[test]
    fn test_cached_result_does_not_make_reference_valid() {
        let mut world = MockWorld::new();
        let valve = world.spawn("valve");
        let mut reference = EntityReference::by_key("valve");
        assert_eq!(reference.resolve_cached(&world), Some(valve));

        world.rename(valve, "renamed");
        assert_eq!(world.lookup("valve"), None);
        // Still resolves through the cache, but neither source is valid
        assert_eq!(reference.resolve(&world), Some(valve));
        assert!(!reference.is_valid(&world));
    }
}
