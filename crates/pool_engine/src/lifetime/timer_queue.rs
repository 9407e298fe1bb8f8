//! Countdown timers driven from the update loop
//!
//! Timers count down in simulated seconds passed to [`TimerQueue::advance`].
//! Timers that expire in the same advance are returned in the order they
//! were scheduled.

use std::collections::BTreeMap;

/// Identity of a scheduled timer; increases monotonically per queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    remaining: f32,
    paused: bool,
    payload: T,
}

/// Ordered set of pending timers, each carrying a payload
#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: BTreeMap<TimerId, Timer<T>>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Fire `payload` after `seconds`. Non-positive delays fire on the next advance.
    pub fn schedule(&mut self, seconds: f32, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let remaining = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.timers.insert(
            id,
            Timer {
                remaining,
                paused: false,
                payload,
            },
        );
        log::trace!("Timer {:?} scheduled in {:.3}s", id, remaining);
        id
    }

    /// Remove a pending timer, returning its payload
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.timers.remove(&id).map(|timer| timer.payload)
    }

    /// Stop a timer from counting down. Returns false if it is not pending.
    pub fn pause(&mut self, id: TimerId) -> bool {
        self.set_paused(id, true)
    }

    /// Let a paused timer count down again. Returns false if it is not pending.
    pub fn resume(&mut self, id: TimerId) -> bool {
        self.set_paused(id, false)
    }

    fn set_paused(&mut self, id: TimerId, paused: bool) -> bool {
        match self.timers.get_mut(&id) {
            Some(timer) => {
                timer.paused = paused;
                true
            }
            None => false,
        }
    }

    /// Whether the timer is pending and paused
    pub fn is_paused(&self, id: TimerId) -> bool {
        self.timers.get(&id).is_some_and(|timer| timer.paused)
    }

    /// Seconds left on a pending timer
    pub fn remaining(&self, id: TimerId) -> Option<f32> {
        self.timers.get(&id).map(|timer| timer.remaining)
    }

    /// Whether the timer is still pending
    pub fn contains(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Payload of a pending timer
    pub fn payload(&self, id: TimerId) -> Option<&T> {
        self.timers.get(&id).map(|timer| &timer.payload)
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True when no timer is pending
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Count down every running timer by `dt` and return the expired ones in
    /// scheduling order
    pub fn advance(&mut self, dt: f32) -> Vec<(TimerId, T)> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut expired = Vec::new();
        for (id, timer) in &mut self.timers {
            if timer.paused {
                continue;
            }
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                expired.push(*id);
            }
        }

        expired
            .into_iter()
            .filter_map(|id| self.timers.remove(&id).map(|timer| (id, timer.payload)))
            .collect()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fires_after_duration() {
        let mut timers = TimerQueue::new();
        timers.schedule(1.0, "bang");

        assert!(timers.advance(0.6).is_empty());
        let fired = timers.advance(0.6);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, "bang");
        assert!(timers.is_empty());
    }

    #[test]
    fn test_same_tick_expirations_fire_in_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(0.9, 'a');
        timers.schedule(0.1, 'b');
        timers.schedule(0.5, 'c');

        let order: Vec<char> = timers.advance(1.0).into_iter().map(|(_, c)| c).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(0.5, 1);
        assert_eq!(timers.cancel(id), Some(1));
        assert_eq!(timers.cancel(id), None);
        assert!(timers.advance(1.0).is_empty());
    }

    #[test]
    fn test_paused_timer_keeps_remaining_time() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(2.0, ());
        timers.advance(0.5);
        assert!(timers.pause(id));
        assert!(timers.advance(10.0).is_empty());
        assert_relative_eq!(timers.remaining(id).unwrap(), 1.5);

        assert!(timers.resume(id));
        assert!(timers.advance(1.0).is_empty());
        assert_eq!(timers.advance(0.5).len(), 1);
        assert!(!timers.pause(id));
    }

    #[test]
    fn test_zero_delay_fires_on_next_advance() {
        let mut timers = TimerQueue::new();
        timers.schedule(0.0, ());
        timers.schedule(-3.0, ());
        assert_eq!(timers.advance(0.0).len(), 2);
    }
}
