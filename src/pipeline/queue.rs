// src/pipeline/queue.rs

use std::collections::VecDeque;
use parking_lot::{Condvar, Mutex};
use log::trace;

use crate::types::ChunkTask;

struct QueueState<T> {
    tasks: VecDeque<T>,
    closed: bool,
}

/// Multi-producer/multi-consumer FIFO of pending chunk tasks.
///
/// Unbounded by default, in which case `push` never waits. With a capacity the
/// queue applies back-pressure: `push` waits for room. Closing the queue wakes
/// every waiter; consumers then drain what is left and receive `None`.
pub struct TaskQueue<T = ChunkTask> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// `capacity == 0` means unbounded.
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(if capacity == 0 { None } else { Some(capacity) })
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Enqueue a task and wake one waiting consumer. A closed queue hands the
    /// task back.
    pub fn push(&self, task: T) -> std::result::Result<(), T> {
        let mut state = self.state.lock();
        if let Some(capacity) = self.capacity {
            while state.tasks.len() >= capacity && !state.closed {
                self.not_full.wait(&mut state);
            }
        }
        if state.closed {
            return Err(task);
        }
        state.tasks.push_back(task);
        trace!("Task queued, {} pending", state.tasks.len());
        self.not_empty.notify_one();
        Ok(())
    }

    /// Take the front task, or `None` right away if there is nothing queued.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        let task = state.tasks.pop_front();
        if task.is_some() {
            self.not_full.notify_one();
        }
        task
    }

    /// Take the front task, waiting while the queue is empty but still open.
    /// Returns `None` once the queue is closed and drained.
    pub fn pop_wait(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                self.not_full.notify_one();
                return Some(task);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Stop accepting tasks and release every waiter.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn size(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
