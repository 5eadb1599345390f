//! Owned timer queue on the virtual clock
//!
//! One-shot and repeating timers ordered by (deadline, scheduling order).
//! Dropping the queue drops every pending callback with it.

/// Handle for cancelling a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// A timer that came due
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// When it was scheduled to fire, not when it was popped
    pub deadline: f64,
    pub event: E,
}

#[derive(Debug, Clone)]
struct Entry<E> {
    id: TimerId,
    deadline: f64,
    seq: u64,
    period: Option<f64>,
    event: E,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
    next_seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            next_seq: 0,
        }
    }
}

impl<E: Clone> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, deadline: f64, period: Option<f64>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            id,
            deadline,
            seq,
            period,
            event,
        });
        id
    }

    /// Fire `event` once at `deadline`
    pub fn schedule(&mut self, deadline: f64, event: E) -> TimerId {
        self.push(deadline, None, event)
    }

    /// Fire `event` at `first`, then every `period` after the previous
    /// deadline. Non-positive periods are clamped to 1 ms.
    pub fn schedule_interval(&mut self, first: f64, period: f64, event: E) -> TimerId {
        self.push(first, Some(period.max(1.0)), event)
    }

    /// Remove a pending timer. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.deadline).min_by(f64::total_cmp)
    }

    /// Pop the earliest timer due at `now`. Repeating timers are re-armed.
    pub fn pop_due(&mut self, now: f64) -> Option<Fired<E>> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by(|(_, a), (_, b)| a.deadline.total_cmp(&b.deadline).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;

        let fired = Fired {
            id: self.entries[index].id,
            deadline: self.entries[index].deadline,
            event: self.entries[index].event.clone(),
        };

        match self.entries[index].period {
            Some(period) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                let entry = &mut self.entries[index];
                entry.deadline += period;
                entry.seq = seq;
            }
            None => {
                self.entries.swap_remove(index);
            }
        }
        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_deadline_then_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule(30.0, "c");
        q.schedule(10.0, "a");
        q.schedule(10.0, "b");
        q.schedule(99.0, "late");

        let mut order = Vec::new();
        while let Some(f) = q.pop_due(50.0) {
            order.push(f.event);
        }
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_deadline(), Some(99.0));
    }

    #[test]
    fn test_interval_rearms_from_deadline() {
        let mut q = TimerQueue::new();
        q.schedule_interval(100.0, 40.0, 'x');
        let deadlines: Vec<f64> = std::iter::from_fn(|| q.pop_due(230.0)).map(|f| f.deadline).collect();
        assert_eq!(deadlines, vec![100.0, 140.0, 180.0, 220.0]);
        assert_eq!(q.next_deadline(), Some(260.0));
    }

    #[test]
    fn test_cancel_and_clear() {
        let mut q = TimerQueue::new();
        let a = q.schedule(5.0, 1);
        let b = q.schedule_interval(5.0, 5.0, 2);
        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        assert_eq!(q.pop_due(5.0).map(|f| f.id), Some(b));

        q.clear();
        assert!(q.is_empty());
        assert!(q.pop_due(f64::MAX).is_none());
    }

    #[test]
    fn test_interval_with_oneshot_interleaves() {
        let mut q = TimerQueue::new();
        q.schedule_interval(0.0, 10.0, "tick");
        q.schedule(15.0, "once");
        let events: Vec<&str> = std::iter::from_fn(|| q.pop_due(25.0)).map(|f| f.event).collect();
        assert_eq!(events, vec!["tick", "tick", "once", "tick"]);
    }
}
