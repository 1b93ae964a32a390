//! Fair single-writer gate for the store.
//!
//! Kept as a plain `std::sync::{Mutex, Condvar}` pair rather than an async
//! lock: nothing here may itself block on I/O, so there's no need for an
//! async runtime just to guard this.

use std::sync::{Condvar, Mutex};

/// Who is asking for the write ticket.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Writer {
    BlockProcessor,
    Rollback,
    Testing,
}

struct State {
    held_by: Option<Writer>,
    /// FIFO order of waiters, oldest first; a released ticket goes to the
    /// head of this queue before any freshly-arrived waiter.
    waiting: Vec<u64>,
    next_ticket: u64,
}

pub struct WriteQueue {
    state: Mutex<State>,
    cond: Condvar,
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Held while a writer has the ticket. Releases automatically on drop, so
/// an early return or a panic unwind never leaves the queue stuck
///.
pub struct WriteTicket<'a> {
    queue: &'a WriteQueue,
    id: u64,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                held_by: None,
                waiting: Vec::new(),
                next_ticket: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Blocks until this writer is next in line, then holds the ticket
    /// until the returned guard is dropped.
    pub fn acquire(&self, writer: Writer) -> WriteTicket<'_> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_ticket;
        state.next_ticket += 1;
        state.waiting.push(id);

        while state.held_by.is_some() || state.waiting.first() != Some(&id) {
            state = self.cond.wait(state).unwrap();
        }
        state.waiting.remove(0);
        state.held_by = Some(writer);
        drop(state);

        WriteTicket { queue: self, id }
    }
}

impl Drop for WriteTicket<'_> {
    fn drop(&mut self) {
        let mut state = self.queue.state.lock().unwrap();
        state.held_by = None;
        let _ = self.id;
        drop(state);
        self.queue.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn only_one_writer_at_a_time() {
        let queue = Arc::new(WriteQueue::new());
        let counter = Arc::new(Mutex::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = queue.clone();
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                let _ticket = queue.acquire(Writer::Testing);
                let mut c = counter.lock().unwrap();
                *c += 1;
                assert_eq!(*c, 1, "two writers overlapped");
                *c -= 1;
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
