//! Generational handle registry shared by every object kind.
//!
//! A handle is `slot index + 1` in the low 32 bits and the slot generation in
//! the high 32 bits, so a destroyed handle never aliases a later object placed
//! in the same slot. `0` is the null handle.
//!
//! Entries are either `Owned` (released by the caller through the kind's
//! destroy entry point) or `Borrowed` views of an owner. Owned entries may also
//! name a parent they must not outlive. Releasing an entry releases everything
//! bound to it.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;

use crate::config::limits;
use crate::error::ErrorCode;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct intl_handle(pub u64);

impl intl_handle {
    pub const NULL: Self = Self(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    fn from_parts(idx: usize, gen: u32) -> Self {
        Self(((gen as u64) << 32) | (idx as u64 + 1))
    }

    #[inline]
    fn parts(self) -> Option<(usize, u32)> {
        let low = self.0 as u32;
        if low == 0 {
            return None;
        }
        Some(((low - 1) as usize, (self.0 >> 32) as u32))
    }
}

/// A native object kind that can live behind a handle.
pub trait Object: Any + Send + Sync {
    const KIND: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed { owner: intl_handle },
}

struct Entry {
    kind: &'static str,
    ownership: Ownership,
    parent: Option<intl_handle>,
    object: Arc<dyn Any + Send + Sync>,
}

impl Entry {
    fn bound_to(&self, h: intl_handle) -> bool {
        self.parent == Some(h) || self.ownership == (Ownership::Borrowed { owner: h })
    }
}

struct Slot {
    gen: u32,
    entry: Option<Entry>,
}

#[derive(Default)]
struct Registry {
    slots: Vec<Slot>,
    live: usize,
}

impl Registry {
    fn entry(&self, h: intl_handle) -> Option<&Entry> {
        let (idx, gen) = h.parts()?;
        let slot = self.slots.get(idx)?;
        if slot.gen != gen {
            return None;
        }
        slot.entry.as_ref()
    }

    fn insert(&mut self, entry: Entry) -> Result<intl_handle, ErrorCode> {
        if self.live >= limits().max_handles as usize {
            return Err(ErrorCode::InternalLimitExceeded);
        }
        // Deterministic handle assignment: first free slot, else append.
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.is_none() {
                slot.entry = Some(entry);
                self.live += 1;
                return Ok(intl_handle::from_parts(idx, slot.gen));
            }
        }
        if self.slots.len() >= u32::MAX as usize {
            return Err(ErrorCode::InternalLimitExceeded);
        }
        self.slots.push(Slot {
            gen: 1,
            entry: Some(entry),
        });
        self.live += 1;
        Ok(intl_handle::from_parts(self.slots.len() - 1, 1))
    }

    fn take(&mut self, h: intl_handle) -> Option<Entry> {
        let (idx, gen) = h.parts()?;
        let slot = self.slots.get_mut(idx)?;
        if slot.gen != gen {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.gen = slot.gen.wrapping_add(1);
        self.live -= 1;
        Some(entry)
    }

    fn dependents_of(&self, h: intl_handle) -> Vec<intl_handle> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let entry = slot.entry.as_ref()?;
                entry
                    .bound_to(h)
                    .then(|| intl_handle::from_parts(idx, slot.gen))
            })
            .collect()
    }

    fn release_tree(&mut self, root: intl_handle, out: &mut Vec<Entry>) {
        let mut stack = vec![root];
        while let Some(cur) = stack.pop() {
            stack.extend(self.dependents_of(cur));
            if let Some(entry) = self.take(cur) {
                out.push(entry);
            }
        }
    }
}

static REGISTRY: OnceCell<Mutex<Registry>> = OnceCell::new();

fn registry() -> &'static Mutex<Registry> {
    REGISTRY.get_or_init(|| Mutex::new(Registry::default()))
}

fn lock() -> Result<MutexGuard<'static, Registry>, ErrorCode> {
    registry().lock().map_err(|_| ErrorCode::Unknown)
}

fn violation(op: &'static str, kind: &'static str, h: intl_handle, detail: &'static str) {
    if limits().checked_destroy {
        tracing::warn!(
            target: "intl_capi::handle",
            op,
            kind,
            handle = h.0,
            detail,
            "handle contract violation"
        );
    }
}

fn insert_entry<T: Object>(
    object: Arc<T>,
    ownership: Ownership,
    parent: Option<intl_handle>,
) -> Result<intl_handle, ErrorCode> {
    let mut reg = lock()?;
    if let Some(p) = parent {
        if reg.entry(p).is_none() {
            drop(reg);
            violation("derive", T::KIND, p, "parent handle is not live");
            return Err(ErrorCode::InvalidHandle);
        }
    }
    let h = reg.insert(Entry {
        kind: T::KIND,
        ownership,
        parent,
        object,
    })?;
    drop(reg);
    tracing::debug!(target: "intl_capi::handle", kind = T::KIND, handle = h.0, "handle created");
    Ok(h)
}

/// Registers a new owned object and hands its ownership to the caller.
pub fn insert<T: Object>(object: T) -> Result<intl_handle, ErrorCode> {
    insert_entry(Arc::new(object), Ownership::Owned, None)
}

/// Registers an owned object that must not outlive `parent`.
pub fn insert_dependent<T: Object>(
    parent: intl_handle,
    object: T,
) -> Result<intl_handle, ErrorCode> {
    insert_entry(Arc::new(object), Ownership::Owned, Some(parent))
}

/// Returns the borrowed `T` view of `owner`, registering it on first use.
/// Repeated calls return the same handle while the owner is live.
pub fn borrow_or_insert<T: Object>(
    owner: intl_handle,
    make: impl FnOnce() -> Arc<T>,
) -> Result<intl_handle, ErrorCode> {
    let mut reg = lock()?;
    if reg.entry(owner).is_none() {
        drop(reg);
        violation("borrow", T::KIND, owner, "owner handle is not live");
        return Err(ErrorCode::InvalidHandle);
    }
    let wanted = Ownership::Borrowed { owner };
    let existing = reg.slots.iter().enumerate().find_map(|(idx, slot)| {
        let entry = slot.entry.as_ref()?;
        (entry.kind == T::KIND && entry.ownership == wanted)
            .then(|| intl_handle::from_parts(idx, slot.gen))
    });
    if let Some(h) = existing {
        return Ok(h);
    }
    let h = reg.insert(Entry {
        kind: T::KIND,
        ownership: wanted,
        parent: None,
        object: make(),
    })?;
    drop(reg);
    tracing::debug!(
        target: "intl_capi::handle",
        kind = T::KIND,
        handle = h.0,
        owner = owner.0,
        "borrowed view created"
    );
    Ok(h)
}

/// Resolves a handle to its object, checking liveness and kind.
pub fn get<T: Object>(h: intl_handle) -> Result<Arc<T>, ErrorCode> {
    let object = {
        let reg = lock()?;
        let Some(entry) = reg.entry(h) else {
            drop(reg);
            violation("use", T::KIND, h, "handle is null, destroyed or never issued");
            return Err(ErrorCode::InvalidHandle);
        };
        if entry.kind != T::KIND {
            let found = entry.kind;
            drop(reg);
            tracing::warn!(
                target: "intl_capi::handle",
                expected = T::KIND,
                found,
                handle = h.0,
                "handle kind mismatch"
            );
            return Err(ErrorCode::InvalidHandle);
        }
        entry.object.clone()
    };
    object.downcast::<T>().map_err(|_| ErrorCode::InvalidHandle)
}

/// Releases an owned handle and everything bound to it. Returns the number of
/// entries released.
///
/// Null is ignored. Releasing a borrowed view, a stale handle or a handle of
/// another kind releases nothing and is reported as `InvalidHandle`.
pub fn release<T: Object>(h: intl_handle) -> Result<usize, ErrorCode> {
    if h.is_null() {
        return Ok(0);
    }
    let removed = {
        let mut reg = lock()?;
        let Some(entry) = reg.entry(h) else {
            drop(reg);
            violation("destroy", T::KIND, h, "handle already destroyed or never issued");
            return Err(ErrorCode::InvalidHandle);
        };
        if entry.kind != T::KIND {
            drop(reg);
            violation("destroy", T::KIND, h, "handle belongs to another kind");
            return Err(ErrorCode::InvalidHandle);
        }
        if matches!(entry.ownership, Ownership::Borrowed { .. }) {
            drop(reg);
            violation("destroy", T::KIND, h, "borrowed handles are released with their owner");
            return Err(ErrorCode::InvalidHandle);
        }
        let mut out = Vec::new();
        reg.release_tree(h, &mut out);
        out
    };
    let n = removed.len();
    // Objects drop outside the registry lock.
    drop(removed);
    tracing::debug!(
        target: "intl_capi::handle",
        kind = T::KIND,
        handle = h.0,
        released = n,
        "handle destroyed"
    );
    Ok(n)
}

pub fn ownership(h: intl_handle) -> Option<Ownership> {
    let reg = lock().ok()?;
    reg.entry(h).map(|e| e.ownership)
}

pub fn is_live(h: intl_handle) -> bool {
    lock().map(|reg| reg.entry(h).is_some()).unwrap_or(false)
}

pub fn live_count() -> usize {
    lock().map(|reg| reg.live).unwrap_or(0)
}

pub fn live_count_of<T: Object>() -> usize {
    lock()
        .map(|reg| {
            reg.slots
                .iter()
                .filter(|s| s.entry.as_ref().is_some_and(|e| e.kind == T::KIND))
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parent(u32);
    impl Object for Parent {
        const KIND: &'static str = "test.Parent";
    }

    struct Child;
    impl Object for Child {
        const KIND: &'static str = "test.Child";
    }

    struct View;
    impl Object for View {
        const KIND: &'static str = "test.View";
    }

    struct Lone;
    impl Object for Lone {
        const KIND: &'static str = "test.Lone";
    }

    #[test]
    fn handle_parts_round_trip() {
        let h = intl_handle::from_parts(41, 7);
        assert_eq!(h.parts(), Some((41, 7)));
        assert_eq!(intl_handle::NULL.parts(), None);
    }

    #[test]
    fn get_checks_kind_and_liveness() {
        let h = insert(Lone).unwrap();
        assert!(get::<Lone>(h).is_ok());
        assert_eq!(get::<Parent>(h).err(), Some(ErrorCode::InvalidHandle));
        assert_eq!(release::<Lone>(h), Ok(1));
        assert_eq!(get::<Lone>(h).err(), Some(ErrorCode::InvalidHandle));
        assert_eq!(release::<Lone>(h), Err(ErrorCode::InvalidHandle));
        assert_eq!(release::<Lone>(intl_handle::NULL), Ok(0));
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let a = insert(Parent(1)).unwrap();
        release::<Parent>(a).unwrap();
        let b = insert(Parent(2)).unwrap();
        assert_ne!(a, b);
        assert!(get::<Parent>(a).is_err());
        assert_eq!(get::<Parent>(b).unwrap().0, 2);
        release::<Parent>(b).unwrap();
    }

    #[test]
    fn owner_release_cascades() {
        let p = insert(Parent(3)).unwrap();
        let c = insert_dependent(p, Child).unwrap();
        let v1 = borrow_or_insert(p, || Arc::new(View)).unwrap();
        let v2 = borrow_or_insert(p, || Arc::new(View)).unwrap();
        assert_eq!(v1, v2);
        assert_eq!(ownership(v1), Some(Ownership::Borrowed { owner: p }));

        assert_eq!(release::<View>(v1), Err(ErrorCode::InvalidHandle));
        assert!(is_live(v1));

        assert_eq!(release::<Parent>(p), Ok(3));
        assert!(!is_live(c));
        assert!(!is_live(v1));
        assert_eq!(release::<Child>(c), Err(ErrorCode::InvalidHandle));
    }

    #[test]
    fn dependent_requires_live_parent() {
        let p = insert(Parent(4)).unwrap();
        release::<Parent>(p).unwrap();
        assert_eq!(insert_dependent(p, Child).err(), Some(ErrorCode::InvalidHandle));
    }
}
