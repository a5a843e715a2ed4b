//! Deferred tasks keyed on the audio clock.
//!
//! Tasks are plain data; the owner pops the ones that are due between
//! render quanta and acts on them. Every scheduled task returns a
//! [`TaskHandle`] that can cancel it.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug)]
pub struct Scheduler<T> {
    queue: BTreeMap<(u64, u64), T>,
    frames: HashMap<u64, u64>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Scheduler {
            queue: BTreeMap::new(),
            frames: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to become due once the clock reaches `at_frame`.
    pub fn schedule(&mut self, at_frame: u64, task: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.insert((at_frame, id), task);
        self.frames.insert(id, at_frame);
        TaskHandle(id)
    }

    /// Cancel a pending task, returning it. Cancelling a task that already
    /// ran (or was cancelled) returns `None`.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let frame = self.frames.remove(&handle.0)?;
        self.queue.remove(&(frame, handle.0))
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.frames.contains_key(&handle.0)
    }

    /// Frame at which a pending task is due.
    pub fn due_frame(&self, handle: TaskHandle) -> Option<u64> {
        self.frames.get(&handle.0).copied()
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<T> {
        let (&(frame, id), _) = self.queue.first_key_value()?;
        if frame > now {
            return None;
        }
        self.frames.remove(&id);
        self.queue.remove(&(frame, id))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
