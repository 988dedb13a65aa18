use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

use super::backend::RenderBackend;
use super::entry::RenderEntry;
use super::lookup::Lookup;

/// Opaque key of a registered render entry.
///
/// Handles start at 1 and are recycled: a released handle is handed out again
/// before a new one is allocated, so they are unique only among live entries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Handle(NonZeroU32);

impl Handle {
    /// Reconstructs a handle from its raw value. `0` is never a valid handle.
    #[inline]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Handle)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    #[inline]
    fn from_slot(index: usize) -> Self {
        Handle(NonZeroU32::MIN.saturating_add(index as u32))
    }

    #[inline]
    fn slot(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Slot arena of live render entries.
///
/// Slot `i` holds the entry for handle `i + 1`. Released slots are filled
/// again through the free-list instead of being compacted, so the snapshot
/// order (ascending handle) is stable for entries that stay registered.
pub struct Registry<B: RenderBackend> {
    slots: Vec<Option<RenderEntry<B>>>,
    /// Released handles; the most recently released is reused first.
    free: Vec<Handle>,
    len: usize,
    snapshot: Rc<[RenderEntry<B>]>,
}

impl<B: RenderBackend> Registry<B> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            snapshot: Rc::from(Vec::new()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Released handles awaiting reuse, oldest first.
    #[inline]
    pub fn free_handles(&self) -> &[Handle] {
        &self.free
    }

    /// Stores `entry` and returns its handle.
    pub fn register(&mut self, entry: RenderEntry<B>) -> Handle {
        let handle = match self.free.pop() {
            Some(handle) => handle,
            None => {
                self.slots.push(None);
                Handle::from_slot(self.slots.len() - 1)
            }
        };

        self.slots[handle.slot()] = Some(entry);
        self.len += 1;
        self.rebuild_snapshot();

        handle
    }

    /// Removes the entry behind `handle`.
    ///
    /// Unknown or already-released handles leave the registry untouched.
    pub fn unregister(&mut self, handle: Handle) -> Lookup<RenderEntry<B>> {
        let Some(entry) = self.slots.get_mut(handle.slot()).and_then(Option::take) else {
            return Lookup::NotFound;
        };

        self.free.push(handle);
        self.len -= 1;
        self.rebuild_snapshot();

        Lookup::Found(entry)
    }

    pub fn get(&self, handle: Handle) -> Lookup<&RenderEntry<B>> {
        self.slots
            .get(handle.slot())
            .and_then(Option::as_ref)
            .into()
    }

    /// Updates the drawable size of a live entry, returning the previous size.
    pub fn resize(&mut self, handle: Handle, width: u32, height: u32) -> Lookup<(u32, u32)> {
        let Some(entry) = self.slots.get_mut(handle.slot()).and_then(Option::as_mut) else {
            return Lookup::NotFound;
        };

        let previous = (entry.width, entry.height);
        entry.width = width;
        entry.height = height;
        self.rebuild_snapshot();

        Lookup::Found(previous)
    }

    /// Materialized copy of the live entries in ascending handle order.
    ///
    /// Rebuilt after every mutation; a frame holding an older snapshot keeps
    /// drawing what was registered when it started.
    #[inline]
    pub fn snapshot(&self) -> Rc<[RenderEntry<B>]> {
        Rc::clone(&self.snapshot)
    }

    /// Drops every entry and forgets all handles.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
        self.rebuild_snapshot();
    }

    fn rebuild_snapshot(&mut self) {
        self.snapshot = self.slots.iter().flatten().cloned().collect();
    }
}

impl<B: RenderBackend> Default for Registry<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::testing::{entry, RecordingBackend};

    fn registry() -> Registry<RecordingBackend> {
        Registry::new()
    }

    fn h(raw: u32) -> Handle {
        Handle::new(raw).unwrap()
    }

    // ── allocation ────────────────────────────────────────────────────────

    #[test]
    fn handles_start_at_one_and_increase() {
        let mut reg = registry();
        assert_eq!(reg.register(entry("a", "A")), h(1));
        assert_eq!(reg.register(entry("b", "B")), h(2));
        assert_eq!(reg.register(entry("c", "C")), h(3));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn released_handle_is_reused_before_allocating() {
        let mut reg = registry();
        reg.register(entry("a", "A"));
        reg.register(entry("b", "B"));

        assert!(reg.unregister(h(1)).is_found());
        assert_eq!(reg.free_handles(), &[h(1)]);

        assert_eq!(reg.register(entry("c", "C")), h(1));
        assert!(reg.free_handles().is_empty());
        assert_eq!(reg.register(entry("d", "D")), h(3));
    }

    #[test]
    fn most_recently_released_handle_is_reused_first() {
        let mut reg = registry();
        for t in ["a", "b", "c"] {
            reg.register(entry(t, t));
        }
        let _ = reg.unregister(h(1));
        let _ = reg.unregister(h(3));

        assert_eq!(reg.register(entry("d", "D")), h(3));
        assert_eq!(reg.register(entry("e", "E")), h(1));
    }

    // ── release ───────────────────────────────────────────────────────────

    #[test]
    fn unknown_handle_is_a_no_op() {
        let mut reg = registry();
        reg.register(entry("a", "A"));

        assert!(reg.unregister(h(7)).is_not_found());
        assert_eq!(reg.len(), 1);
        assert!(reg.free_handles().is_empty());
    }

    #[test]
    fn double_release_does_not_duplicate_free_handle() {
        let mut reg = registry();
        reg.register(entry("a", "A"));

        assert!(reg.unregister(h(1)).is_found());
        assert!(reg.unregister(h(1)).is_not_found());
        assert_eq!(reg.free_handles(), &[h(1)]);

        assert_eq!(reg.register(entry("b", "B")), h(1));
        assert_eq!(reg.register(entry("c", "C")), h(2));
    }

    #[test]
    fn unregister_returns_the_entry() {
        let mut reg = registry();
        let handle = reg.register(entry("a", "scene-a"));
        let removed = reg.unregister(handle).found().unwrap();
        assert_eq!(*removed.scene.borrow(), "scene-a");
    }

    // ── lookup / resize ───────────────────────────────────────────────────

    #[test]
    fn get_tags_missing_handles() {
        let mut reg = registry();
        let handle = reg.register(entry("a", "A"));
        assert!(reg.get(handle).is_found());
        assert!(reg.get(h(2)).is_not_found());
        let _ = reg.unregister(handle);
        assert!(reg.get(handle).is_not_found());
    }

    #[test]
    fn resize_updates_snapshot_and_returns_previous() {
        let mut reg = registry();
        let handle = reg.register(entry("a", "A"));

        assert_eq!(reg.resize(handle, 640, 480), Lookup::Found((100, 100)));
        let snap = reg.snapshot();
        assert_eq!((snap[0].width, snap[0].height), (640, 480));

        assert!(reg.resize(h(9), 1, 1).is_not_found());
    }

    // ── snapshot ──────────────────────────────────────────────────────────

    #[test]
    fn snapshot_is_ordered_by_handle_with_reused_slots_in_place() {
        let mut reg = registry();
        reg.register(entry("a", "A"));
        reg.register(entry("b", "B"));
        reg.register(entry("c", "C"));
        let _ = reg.unregister(h(2));
        reg.register(entry("d", "D"));

        let scenes: Vec<String> = reg.snapshot().iter().map(|e| e.scene.borrow().clone()).collect();
        assert_eq!(scenes, ["A", "D", "C"]);
    }

    #[test]
    fn held_snapshot_is_not_affected_by_later_mutation() {
        let mut reg = registry();
        let a = reg.register(entry("a", "A"));
        let before = reg.snapshot();

        let _ = reg.unregister(a);
        assert_eq!(before.len(), 1);
        assert!(reg.snapshot().is_empty());
    }

    #[test]
    fn clear_forgets_everything() {
        let mut reg = registry();
        let a = reg.register(entry("a", "A"));
        let _ = reg.unregister(a);
        reg.register(entry("b", "B"));

        reg.clear();
        assert!(reg.is_empty());
        assert!(reg.free_handles().is_empty());
        assert_eq!(reg.register(entry("c", "C")), h(1));
    }

    #[test]
    fn handle_zero_is_rejected() {
        assert!(Handle::new(0).is_none());
        assert_eq!(h(4).get(), 4);
        assert_eq!(h(4).to_string(), "#4");
    }
}
