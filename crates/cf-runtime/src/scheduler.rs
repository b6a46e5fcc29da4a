//! Virtual millisecond clock with generation-tagged tasks.

use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Scheduled<T> {
    generation: u64,
    task: T,
}

/// Pending tasks ordered by `(due, insertion order)`. Time only moves when the
/// owner pops tasks or sets the clock forward.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn schedule(&mut self, delay_ms: u64, generation: u64, task: T) {
        let due = self.now.saturating_add(delay_ms);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((due, seq), Scheduled { generation, task });
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Pops the earliest task due at or before `until`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until: u64) -> Option<(u64, T)> {
        let (&(due, seq), _) = self.queue.iter().next()?;
        if due > until {
            return None;
        }
        let scheduled = self.queue.remove(&(due, seq))?;
        self.now = self.now.max(due);
        Some((scheduled.generation, scheduled.task))
    }

    /// Moves the clock forward; never backwards.
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    /// Drops every task not belonging to `generation`. Returns how many went.
    pub fn purge_except(&mut self, generation: u64) -> usize {
        let before = self.queue.len();
        self.queue
            .retain(|_, scheduled| scheduled.generation == generation);
        before - self.queue.len()
    }
}

#[cfg(test)]
mod scheduler_tests {
    use super::*;

    #[test]
    fn tasks_pop_in_deadline_then_insertion_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(300, 1, "late");
        scheduler.schedule(0, 1, "first");
        scheduler.schedule(0, 1, "second");
        assert_eq!(scheduler.next_deadline(), Some(0));

        assert_eq!(scheduler.pop_due(1_000), Some((1, "first")));
        assert_eq!(scheduler.pop_due(1_000), Some((1, "second")));
        assert_eq!(scheduler.pop_due(100), None);
        assert_eq!(scheduler.now(), 0);
        assert_eq!(scheduler.pop_due(1_000), Some((1, "late")));
        assert_eq!(scheduler.now(), 300);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn delays_are_relative_to_current_time() {
        let mut scheduler = Scheduler::default();
        scheduler.set_now(1_000);
        scheduler.schedule(250, 0, ());
        assert_eq!(scheduler.next_deadline(), Some(1_250));
        scheduler.set_now(10);
        assert_eq!(scheduler.now(), 1_000);
    }

    #[test]
    fn purge_keeps_only_current_generation() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(10, 1, 'a');
        scheduler.schedule(20, 2, 'b');
        scheduler.schedule(30, 1, 'c');
        assert_eq!(scheduler.purge_except(2), 2);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.pop_due(u64::MAX), Some((2, 'b')));
    }
}
