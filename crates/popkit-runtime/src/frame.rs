#![forbid(unsafe_code)]

//! Animation-frame scheduling.
//!
//! [`FrameScheduler`] is the engine's `requestAnimationFrame`. Callers queue
//! one-shot callbacks; the host calls [`FrameScheduler::run_frame`] once per
//! frame. Callbacks queued while a frame is running land in the next frame,
//! which is what makes "at most once per frame" debouncing possible.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use web_time::Instant;

use crate::reactive::Subscription;

struct Queued {
    id: u64,
    alive: Rc<Cell<bool>>,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct FrameQueue {
    queued: Vec<Queued>,
    next_id: u64,
    frames_run: u64,
    last_frame: Option<Instant>,
}

/// Shared queue of per-frame callbacks.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    inner: Rc<RefCell<FrameQueue>>,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `callback` for the next frame.
    ///
    /// Releasing the returned subscription before the frame runs cancels
    /// the callback; releasing it afterwards is a no-op.
    pub fn request_frame(&self, callback: impl FnOnce() + 'static) -> Subscription {
        let alive = Rc::new(Cell::new(true));
        let id = {
            let mut queue = self.inner.borrow_mut();
            let id = queue.next_id;
            queue.next_id += 1;
            queue.queued.push(Queued {
                id,
                alive: Rc::clone(&alive),
                callback: Box::new(callback),
            });
            id
        };

        let weak: Weak<RefCell<FrameQueue>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            alive.set(false);
            if let Some(queue) = weak.upgrade() {
                queue.borrow_mut().queued.retain(|q| q.id != id);
            }
        })
    }

    /// Run every callback queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let batch = {
            let mut queue = self.inner.borrow_mut();
            queue.frames_run += 1;
            queue.last_frame = Some(Instant::now());
            std::mem::take(&mut queue.queued)
        };

        let mut ran = 0;
        for item in batch {
            // Cancelled by an earlier callback in this same frame.
            if !item.alive.get() {
                continue;
            }
            item.alive.set(false);
            (item.callback)();
            ran += 1;
        }
        tracing::trace!(ran, "frame flushed");
        ran
    }

    /// Callbacks waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().queued.len()
    }

    #[must_use]
    pub fn frames_run(&self) -> u64 {
        self.inner.borrow().frames_run
    }

    /// When the last frame ran, if any has.
    #[must_use]
    pub fn last_frame(&self) -> Option<Instant> {
        self.inner.borrow().last_frame
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.inner.borrow();
        f.debug_struct("FrameScheduler")
            .field("pending", &queue.queued.len())
            .field("frames_run", &queue.frames_run)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_run_on_next_frame() {
        let scheduler = FrameScheduler::new();
        let ran = Rc::new(Cell::new(0));
        let r = Rc::clone(&ran);
        let _sub = scheduler.request_frame(move || r.set(r.get() + 1));
        assert_eq!(ran.get(), 0);
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(ran.get(), 1);
        assert_eq!(scheduler.run_frame(), 0, "one-shot");
        assert_eq!(scheduler.frames_run(), 2);
        assert!(scheduler.last_frame().is_some());
    }

    #[test]
    fn releasing_cancels() {
        let scheduler = FrameScheduler::new();
        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        let sub = scheduler.request_frame(move || r.set(true));
        drop(sub);
        assert_eq!(scheduler.pending(), 0);
        scheduler.run_frame();
        assert!(!ran.get());
    }

    #[test]
    fn queued_during_frame_runs_next_frame() {
        let scheduler = FrameScheduler::new();
        let ran = Rc::new(Cell::new(0));
        let inner_sub: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let s = scheduler.clone();
        let r = Rc::clone(&ran);
        let slot = Rc::clone(&inner_sub);
        let _outer = scheduler.request_frame(move || {
            let r2 = Rc::clone(&r);
            *slot.borrow_mut() = Some(s.request_frame(move || r2.set(r2.get() + 1)));
        });

        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(ran.get(), 0);
        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn cancelled_by_earlier_callback_in_same_frame() {
        let scheduler = FrameScheduler::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let ran = Rc::new(Cell::new(false));

        let v = Rc::clone(&victim);
        let _killer = scheduler.request_frame(move || {
            v.borrow_mut().take();
        });
        let r = Rc::clone(&ran);
        *victim.borrow_mut() = Some(scheduler.request_frame(move || r.set(true)));

        assert_eq!(scheduler.run_frame(), 1);
        assert!(!ran.get());
    }
}
