//! Trace context storage strategies.
//!
//! A trace context holds at most one "current" [`CorrelationId`] per
//! execution thread and owns its create/attach/release lifecycle. The
//! default strategy is [`ThreadLocalContext`]; [`SharedContext`] keeps a
//! single slot visible to every thread and exists only to demonstrate the
//! cross-thread corruption the thread-local strategy prevents.

use super::correlation::CorrelationId;
use std::cell::Cell;
use std::sync::Mutex;

/// The current id plus the level the context was entered at.
///
/// Spans begun on this thread enter at level 0; ids adopted from another
/// thread enter at whatever level they were attached with. Stepping back
/// out to the entry level tears the context down completely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    id: CorrelationId,
    floor: u32,
}

/// Storage strategy for the current correlation id.
pub trait TraceContext: Send + Sync {
    /// The correlation id currently active for the calling thread, if any.
    fn current(&self) -> Option<CorrelationId>;

    /// Steps into one level of nesting and returns the resulting id.
    ///
    /// Creates a fresh root-level id when the slot is empty, otherwise
    /// replaces the slot with the current id one level deeper.
    fn sync_or_create(&self) -> CorrelationId;

    /// Force-sets the slot to the given id.
    ///
    /// This is the only path for cross-thread propagation: the id must be
    /// read on the originating thread and passed as a plain value. The id's
    /// level becomes the teardown point for [`release`](Self::release).
    fn attach(&self, id: CorrelationId);

    /// Steps out of one level of nesting.
    ///
    /// Empties the slot when the current id is back at the level the
    /// context was entered at (root for spans begun on this thread, the
    /// attach level for adopted ids); otherwise replaces it with the id
    /// one level shallower. Calling this with no active id is a caller bug
    /// (an end without a begin); it is logged and ignored.
    fn release(&self);
}

fn step_in(entry: Option<Entry>) -> Entry {
    match entry {
        Some(current) => Entry {
            id: current.id.next(),
            floor: current.floor,
        },
        None => Entry {
            id: CorrelationId::generate(),
            floor: 0,
        },
    }
}

fn step_out(entry: Option<Entry>) -> Option<Entry> {
    match entry {
        None => {
            tracing::warn!("trace context released with no active span");
            None
        }
        Some(current) if current.id.level() <= current.floor => None,
        Some(current) => match current.id.previous() {
            Ok(previous) => Some(Entry {
                id: previous,
                floor: current.floor,
            }),
            // Unreachable: level > floor >= 0 implies a non-root id.
            Err(_) => None,
        },
    }
}

thread_local! {
    static SLOT: Cell<Option<Entry>> = const { Cell::new(None) };
}

/// The default context strategy: one slot per execution thread.
///
/// The slot is process-wide, so every `ThreadLocalContext` on a given
/// thread observes the same current id. Isolation between threads is the
/// mechanism; no locking is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLocalContext;

impl ThreadLocalContext {
    /// Create a new thread-local context handle.
    pub fn new() -> Self {
        Self
    }
}

impl TraceContext for ThreadLocalContext {
    fn current(&self) -> Option<CorrelationId> {
        SLOT.with(Cell::get).map(|entry| entry.id)
    }

    fn sync_or_create(&self) -> CorrelationId {
        let entry = step_in(SLOT.with(Cell::get));
        SLOT.with(|slot| slot.set(Some(entry)));
        entry.id
    }

    fn attach(&self, id: CorrelationId) {
        SLOT.with(|slot| {
            slot.set(Some(Entry {
                id,
                floor: id.level(),
            }));
        });
    }

    fn release(&self) {
        let entry = step_out(SLOT.with(Cell::get));
        SLOT.with(|slot| slot.set(entry));
    }
}

/// A single shared slot with no per-thread isolation.
///
/// Under concurrent callers the begin/release protocol interleaves across
/// threads: level increments cross-contaminate and one thread's release
/// can tear down a context another thread is still using. Do not use this
/// outside of tests that assert exactly that behavior.
#[derive(Debug, Default)]
pub struct SharedContext {
    slot: Mutex<Option<Entry>>,
}

impl SharedContext {
    /// Create a new shared-slot context.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slot<R>(&self, f: impl FnOnce(&mut Option<Entry>) -> R) -> R {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut slot)
    }
}

impl TraceContext for SharedContext {
    fn current(&self) -> Option<CorrelationId> {
        self.with_slot(|slot| slot.map(|entry| entry.id))
    }

    fn sync_or_create(&self) -> CorrelationId {
        self.with_slot(|slot| {
            let entry = step_in(*slot);
            *slot = Some(entry);
            entry.id
        })
    }

    fn attach(&self, id: CorrelationId) {
        self.with_slot(|slot| {
            *slot = Some(Entry {
                id,
                floor: id.level(),
            });
        });
    }

    fn release(&self) {
        self.with_slot(|slot| {
            *slot = step_out(*slot);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_local_lifecycle() {
        let context = ThreadLocalContext::new();
        assert!(context.current().is_none());

        let outer = context.sync_or_create();
        assert!(outer.is_root());

        let inner = context.sync_or_create();
        assert_eq!(inner.level(), 1);
        assert_eq!(inner.to_string(), outer.to_string());

        context.release();
        assert_eq!(context.current().map(CorrelationId::level), Some(0));

        context.release();
        assert!(context.current().is_none());
    }

    #[test]
    fn test_thread_local_release_without_begin() {
        let context = ThreadLocalContext::new();
        context.release();
        assert!(context.current().is_none());
    }

    #[test]
    fn test_attach_sets_teardown_floor() {
        let context = ThreadLocalContext::new();
        let from_elsewhere = CorrelationId::generate().next();
        context.attach(from_elsewhere);
        assert_eq!(context.current(), Some(from_elsewhere));

        // One step out from the attach level empties the slot; the
        // originating thread still owns the shallower levels.
        context.release();
        assert!(context.current().is_none());
    }

    #[test]
    fn test_attach_then_deeper_nesting() {
        let context = ThreadLocalContext::new();
        let handoff = CorrelationId::generate().next();
        context.attach(handoff);

        let deeper = context.sync_or_create();
        assert_eq!(deeper.level(), 2);

        context.release();
        assert_eq!(context.current(), Some(handoff));
        context.release();
        assert!(context.current().is_none());
    }

    #[test]
    fn test_thread_isolation() {
        let context = ThreadLocalContext::new();
        let outer = context.sync_or_create();

        let seen = std::thread::spawn(move || {
            let context = ThreadLocalContext::new();
            context.current()
        })
        .join()
        .unwrap();

        // The spawned thread starts with an empty slot of its own.
        assert!(seen.is_none());
        assert_eq!(context.current(), Some(outer));
        context.release();
    }

    #[test]
    fn test_shared_slot_visible_across_threads() {
        let context = std::sync::Arc::new(SharedContext::new());
        let outer = context.sync_or_create();

        let context2 = context.clone();
        let seen = std::thread::spawn(move || context2.current())
            .join()
            .unwrap();

        // The shared strategy leaks the id across threads.
        assert_eq!(seen, Some(outer));
        context.release();
        assert!(context.current().is_none());
    }
}
