//! Owned-actor registry
//!
//! Records every actor this run spawned so teardown never touches foreign actors.

use contracts::{ActorId, ActorKind};

/// Camera owned by this run, with the vehicle it is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedCamera {
    pub actor_id: ActorId,
    pub parent_id: ActorId,
}

/// Actors spawned by this run, in creation order
#[derive(Debug, Default, Clone)]
pub struct ActorRegistry {
    vehicles: Vec<ActorId>,
    cameras: Vec<OwnedCamera>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_vehicle(&mut self, actor_id: ActorId) {
        self.vehicles.push(actor_id);
    }

    pub fn record_camera(&mut self, actor_id: ActorId, parent_id: ActorId) {
        self.cameras.push(OwnedCamera {
            actor_id,
            parent_id,
        });
    }

    pub fn vehicles(&self) -> &[ActorId] {
        &self.vehicles
    }

    pub fn cameras(&self) -> &[OwnedCamera] {
        &self.cameras
    }

    pub fn contains(&self, actor_id: ActorId) -> bool {
        self.kind_of(actor_id).is_some()
    }

    pub fn kind_of(&self, actor_id: ActorId) -> Option<ActorKind> {
        if self.cameras.iter().any(|c| c.actor_id == actor_id) {
            Some(ActorKind::Camera)
        } else if self.vehicles.contains(&actor_id) {
            Some(ActorKind::Vehicle)
        } else {
            None
        }
    }

    /// Destruction order: cameras before the vehicles they ride on,
    /// each group newest first.
    pub fn teardown_order(&self) -> Vec<(ActorId, ActorKind)> {
        self.cameras
            .iter()
            .rev()
            .map(|c| (c.actor_id, ActorKind::Camera))
            .chain(
                self.vehicles
                    .iter()
                    .rev()
                    .map(|&id| (id, ActorKind::Vehicle)),
            )
            .collect()
    }

    /// Forget an actor once it has been destroyed
    pub fn remove(&mut self, actor_id: ActorId) -> bool {
        let before = self.len();
        self.cameras.retain(|c| c.actor_id != actor_id);
        self.vehicles.retain(|&id| id != actor_id);
        self.len() != before
    }

    pub fn len(&self) -> usize {
        self.vehicles.len() + self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.cameras.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_order_cameras_first() {
        let mut registry = ActorRegistry::new();
        registry.record_vehicle(1000);
        registry.record_vehicle(1001);
        registry.record_camera(1002, 1000);
        registry.record_camera(1003, 1001);

        assert_eq!(
            registry.teardown_order(),
            vec![
                (1003, ActorKind::Camera),
                (1002, ActorKind::Camera),
                (1001, ActorKind::Vehicle),
                (1000, ActorKind::Vehicle),
            ]
        );
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_remove_and_lookup() {
        let mut registry = ActorRegistry::new();
        registry.record_vehicle(1000);
        registry.record_camera(1001, 1000);

        assert_eq!(registry.kind_of(1001), Some(ActorKind::Camera));
        assert!(registry.remove(1001));
        assert!(!registry.remove(1001));
        assert!(!registry.contains(1001));
        assert!(registry.contains(1000));
        assert!(registry.remove(1000));
        assert!(registry.is_empty());
    }
}
