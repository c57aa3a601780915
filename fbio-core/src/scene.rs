//! Scene roots and the weak handles displays hold to them
//!
//! The scene graph itself lives outside this crate. A display only needs
//! a root that can report what changed and paint a rectangle, which is the
//! [`Scene`] trait. Roots are owned by a [`SceneSlots`] arena; a display
//! keeps a [`SceneHandle`] that stops resolving once the root is removed.

use crate::area::{AreaList, CapacityError};
use crate::colorspace::Colorspace;
use crate::transform::Transform;
use crate::Area;

/// Root of a retained scene
pub trait Scene {
    /// Append the areas (in framebuffer coordinates) changed since the
    /// last finished refresh
    fn refresh_areas(&self, areas: &mut AreaList) -> Result<(), CapacityError>;

    /// Paint `area` into `buffer`, setting a `mask` bit for every pixel
    /// written. Pixel `i` of the chunk is `(x1 + i % width, y1 + i / width)`.
    ///
    /// Returns `true` if anything was drawn. Pixels left unwritten reach
    /// the framebuffer as zero either way.
    fn fill_area(
        &self,
        colorspace: &Colorspace,
        area: &Area,
        mask: &mut [u32],
        buffer: &mut [u32],
    ) -> bool;

    /// Display rotation or geometry changed
    fn update_transform(&mut self, transform: &Transform);

    /// The changes reported by [`Scene::refresh_areas`] are on screen
    fn finish_refresh(&mut self);
}

/// Weak reference to a scene root in a [`SceneSlots`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SceneHandle {
    index: u8,
    generation: u16,
}

impl SceneHandle {
    /// Slot index
    pub fn index(&self) -> usize {
        usize::from(self.index)
    }
}

struct Slot<S> {
    scene: Option<S>,
    generation: u16,
    attached: bool,
}

/// Fixed-capacity arena of scene roots
pub struct SceneSlots<S, const N: usize> {
    slots: [Slot<S>; N],
}

impl<S, const N: usize> Default for SceneSlots<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, const N: usize> SceneSlots<S, N> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot {
                scene: None,
                generation: 0,
                attached: false,
            }),
        }
    }

    /// Store a root
    ///
    /// Returns the scene back if every slot is in use.
    pub fn insert(&mut self, scene: S) -> Result<SceneHandle, S> {
        let Some((index, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .take(usize::from(u8::MAX))
            .find(|(_, slot)| slot.scene.is_none())
        else {
            return Err(scene);
        };

        slot.scene = Some(scene);
        slot.attached = false;
        Ok(SceneHandle {
            index: index as u8,
            generation: slot.generation,
        })
    }

    /// Remove a root; outstanding handles to it stop resolving
    pub fn remove(&mut self, handle: SceneHandle) -> Option<S> {
        let slot = self.live_slot_mut(handle)?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.attached = false;
        slot.scene.take()
    }

    /// Check whether the handle still refers to a stored root
    pub fn contains(&self, handle: SceneHandle) -> bool {
        self.live_slot(handle).is_some()
    }

    /// Borrow a root
    pub fn get(&self, handle: SceneHandle) -> Option<&S> {
        self.live_slot(handle)?.scene.as_ref()
    }

    /// Mutably borrow a root
    pub fn get_mut(&mut self, handle: SceneHandle) -> Option<&mut S> {
        self.live_slot_mut(handle)?.scene.as_mut()
    }

    /// True if the root is shown on a display
    pub fn is_attached(&self, handle: SceneHandle) -> bool {
        self.live_slot(handle).map(|s| s.attached).unwrap_or(false)
    }

    /// Number of stored roots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.scene.is_some()).count()
    }

    /// True if no roots are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set_attached(&mut self, handle: SceneHandle, attached: bool) {
        if let Some(slot) = self.live_slot_mut(handle) {
            slot.attached = attached;
        }
    }

    fn live_slot(&self, handle: SceneHandle) -> Option<&Slot<S>> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation && s.scene.is_some())
    }

    fn live_slot_mut(&mut self, handle: SceneHandle) -> Option<&mut Slot<S>> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation && s.scene.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut slots: SceneSlots<u32, 2> = SceneSlots::new();
        let a = slots.insert(10).unwrap();
        let b = slots.insert(20).unwrap();
        assert_eq!(slots.insert(30), Err(30));

        assert_eq!(slots.get(a), Some(&10));
        *slots.get_mut(b).unwrap() += 1;
        assert_eq!(slots.get(b), Some(&21));

        assert_eq!(slots.remove(a), Some(10));
        assert!(!slots.contains(a));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut slots: SceneSlots<u32, 1> = SceneSlots::new();
        let old = slots.insert(1).unwrap();
        slots.remove(old);
        let new = slots.insert(2).unwrap();

        assert_eq!(old.index(), new.index());
        assert_eq!(slots.get(old), None);
        assert_eq!(slots.get(new), Some(&2));
        assert_eq!(slots.remove(old), None);
    }

    #[test]
    fn test_attached_cleared_on_remove() {
        let mut slots: SceneSlots<u32, 1> = SceneSlots::new();
        let h = slots.insert(1).unwrap();
        slots.set_attached(h, true);
        assert!(slots.is_attached(h));
        slots.remove(h);
        assert!(!slots.is_attached(h));
    }
}
