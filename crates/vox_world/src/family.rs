//! Family index — live archetype membership.
//!
//! A family is a declared required-kind set plus the live set of entity ids
//! currently holding all of those kinds. The index is refreshed after every
//! single attach/detach, never batched, so anything that runs later in the
//! same tick observes consistent membership. Membership sets are ordered by
//! entity id, which equals creation order.

use std::collections::BTreeSet;

use tracing::trace;

use vox_component::{Entity, KindMask};

/// Handle to a registered family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyId(usize);

/// Callback fired on a membership transition.
type MemberCallback = Box<dyn FnMut(Entity) + Send>;

struct Family {
    required: KindMask,
    members: BTreeSet<Entity>,
    on_added: Option<MemberCallback>,
    on_removed: Option<MemberCallback>,
}

impl std::fmt::Debug for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Family")
            .field("required", &self.required)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

/// Maintains, per declared archetype, the live set of qualifying entities.
#[derive(Debug, Default)]
pub struct FamilyIndex {
    families: Vec<Family>,
}

impl FamilyIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an archetype and get a handle to its family.
    pub fn register(&mut self, required: KindMask) -> FamilyId {
        self.families.push(Family {
            required,
            members: BTreeSet::new(),
            on_added: None,
            on_removed: None,
        });
        FamilyId(self.families.len() - 1)
    }

    /// Set the callback fired once whenever an entity enters the family.
    pub fn on_added(&mut self, id: FamilyId, callback: impl FnMut(Entity) + Send + 'static) {
        self.families[id.0].on_added = Some(Box::new(callback));
    }

    /// Set the callback fired once whenever an entity leaves the family.
    pub fn on_removed(&mut self, id: FamilyId, callback: impl FnMut(Entity) + Send + 'static) {
        self.families[id.0].on_removed = Some(Box::new(callback));
    }

    /// Re-test one entity against every family after a single mutation.
    ///
    /// Runs to fixed-point for that entity: membership after this call equals
    /// exactly the subset test of `mask` against each family's requirements,
    /// and each transition fires its callback exactly once.
    pub fn refresh(&mut self, entity: Entity, mask: KindMask) {
        for family in &mut self.families {
            let qualifies = mask.contains_all(family.required);
            let present = family.members.contains(&entity);

            if qualifies && !present {
                family.members.insert(entity);
                trace!(%entity, required = ?family.required, "entity entered family");
                if let Some(cb) = family.on_added.as_mut() {
                    cb(entity);
                }
            } else if !qualifies && present {
                family.members.remove(&entity);
                trace!(%entity, required = ?family.required, "entity left family");
                if let Some(cb) = family.on_removed.as_mut() {
                    cb(entity);
                }
            }
        }
    }

    /// Force-remove a destroyed entity from every family, regardless of its
    /// component state at destruction time.
    pub fn purge(&mut self, entity: Entity) {
        for family in &mut self.families {
            if family.members.remove(&entity)
                && let Some(cb) = family.on_removed.as_mut()
            {
                cb(entity);
            }
        }
    }

    /// The family's live members, in entity-id (creation) order.
    #[must_use]
    pub fn members(&self, id: FamilyId) -> &BTreeSet<Entity> {
        &self.families[id.0].members
    }

    /// The first member in id order, if any.
    #[must_use]
    pub fn first(&self, id: FamilyId) -> Option<Entity> {
        self.families[id.0].members.iter().next().copied()
    }

    /// Returns `true` if the entity is currently a member.
    #[must_use]
    pub fn is_member(&self, id: FamilyId, entity: Entity) -> bool {
        self.families[id.0].members.contains(&entity)
    }
}
