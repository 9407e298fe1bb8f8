//! Returns active instances to their pool when their lifetime ends
//!
//! Each kind gets a [`ReclaimPolicy`]. After acquiring, callers [`arm`] the
//! handle; domain events arrive through [`notify`] and timed endings are
//! collected by [`update`]. Whatever ends an activation first wins: the
//! entry is removed and its pending timer cancelled, so one activation is
//! released at most once. A timer that fires for an instance that is no
//! longer active is dropped silently.
//!
//! [`arm`]: Reclaimer::arm
//! [`notify`]: Reclaimer::notify
//! [`update`]: Reclaimer::update

use super::timer_queue::{TimerId, TimerQueue};
use crate::events::EventType;
use crate::pool::{
    ConfigurationError, InstanceFactory, InstanceHandle, InstanceId, KindId, Pool, Poolable,
    ReleaseOutcome,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Domain event that can end an activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimTrigger {
    /// Hit something
    Collision,
    /// Left the visible world
    LeftView,
    /// Health reached zero
    Death,
}

impl From<EventType> for ReclaimTrigger {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Collided => Self::Collision,
            EventType::LeftView => Self::LeftView,
            EventType::Died => Self::Death,
        }
    }
}

/// How instances of one kind end their activation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ReclaimPolicy {
    /// Release on the first of the listed triggers
    FirstTrigger {
        /// Triggers that end the activation
        triggers: Vec<ReclaimTrigger>,
    },
    /// Release a fixed time after arming
    AfterDuration {
        /// Lifetime in seconds
        seconds: f32,
    },
    /// Release on death, optionally after a telegraph delay. An optional
    /// fuse self-destructs the instance if nothing kills it first.
    OnDeath {
        /// Seconds between death and release
        #[serde(default)]
        delay: f32,
        /// Seconds until self-destruction
        #[serde(default)]
        fuse: Option<f32>,
    },
}

impl ReclaimPolicy {
    /// Validate the policy's durations
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigurationError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        };

        match self {
            Self::FirstTrigger { triggers } if triggers.is_empty() => Err(
                ConfigurationError::Invalid("first_trigger policy needs at least one trigger".into()),
            ),
            Self::FirstTrigger { .. } => Ok(()),
            Self::AfterDuration { seconds } => positive("lifetime", *seconds),
            Self::OnDeath { delay, fuse } => {
                if !delay.is_finite() || *delay < 0.0 {
                    return Err(ConfigurationError::Invalid(format!(
                        "death delay cannot be negative, got {delay}"
                    )));
                }
                fuse.map_or(Ok(()), |fuse| positive("fuse", fuse))
            }
        }
    }
}

/// Why an activation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimCause {
    /// A listed trigger arrived
    Triggered(ReclaimTrigger),
    /// The fixed lifetime ran out
    Expired,
    /// The fuse burnt down before anything killed the instance
    SelfDestructed,
    /// Death, after its telegraph delay if one is configured
    Died,
}

/// One instance handed back to its pool
#[derive(Debug, Clone, PartialEq)]
pub struct Reclaimed {
    /// Handle of the ended activation
    pub handle: InstanceHandle,
    /// Kind the instance was armed as
    pub kind: KindId,
    /// What ended it
    pub cause: ReclaimCause,
    /// Result of the pool release
    pub outcome: ReleaseOutcome,
}

/// Reclaimer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimerStats {
    /// Activations armed
    pub armed: u64,
    /// Releases caused by a trigger
    pub triggered: u64,
    /// Releases after a fixed lifetime
    pub expired: u64,
    /// Releases by a burnt fuse
    pub self_destructed: u64,
    /// Releases after death
    pub died: u64,
    /// Activations disarmed before anything fired
    pub disarmed: u64,
    /// Endings dropped because the instance was no longer active
    pub stale: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Lifetime,
    Fuse,
    Telegraph,
}

#[derive(Debug)]
struct Armed {
    handle: InstanceHandle,
    kind: KindId,
    policy: ReclaimPolicy,
    timer: Option<TimerId>,
    dying: bool,
}

/// Per-kind lifetime policies plus the armed activations they govern
#[derive(Debug, Default)]
pub struct Reclaimer {
    policies: HashMap<KindId, ReclaimPolicy>,
    armed: HashMap<InstanceId, Armed>,
    timers: TimerQueue<(InstanceHandle, Stage)>,
    stats: ReclaimerStats,
}

impl Reclaimer {
    /// Create a reclaimer with no policies
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the policy for a kind, replacing any previous one
    pub fn set_policy(
        &mut self,
        kind: impl Into<KindId>,
        policy: ReclaimPolicy,
    ) -> Result<(), ConfigurationError> {
        policy.validate()?;
        let kind = kind.into();
        log::debug!("Reclaim policy for '{}': {:?}", kind, policy);
        self.policies.insert(kind, policy);
        Ok(())
    }

    /// Policy registered for a kind
    pub fn policy(&self, kind: &KindId) -> Option<&ReclaimPolicy> {
        self.policies.get(kind)
    }

    /// Start tracking a fresh activation. Returns false if the kind has no policy.
    ///
    /// Arming an instance again replaces whatever was pending for it.
    pub fn arm(&mut self, handle: InstanceHandle, kind: &KindId) -> bool {
        let Some(policy) = self.policies.get(kind).cloned() else {
            log::debug!("No reclaim policy for '{}', {:?} not armed", kind, handle);
            return false;
        };

        self.forget(handle.id());

        let timer = match policy {
            ReclaimPolicy::AfterDuration { seconds } => {
                Some(self.timers.schedule(seconds, (handle, Stage::Lifetime)))
            }
            ReclaimPolicy::OnDeath { fuse: Some(fuse), .. } => {
                Some(self.timers.schedule(fuse, (handle, Stage::Fuse)))
            }
            ReclaimPolicy::OnDeath { fuse: None, .. } | ReclaimPolicy::FirstTrigger { .. } => None,
        };

        self.armed.insert(
            handle.id(),
            Armed {
                handle,
                kind: kind.clone(),
                policy,
                timer,
                dying: false,
            },
        );
        self.stats.armed += 1;
        log::trace!("Armed {:?} as '{}'", handle, kind);
        true
    }

    /// Deliver a domain event. Returns the release if the event ended the activation.
    pub fn notify<T, F>(
        &mut self,
        handle: InstanceHandle,
        trigger: ReclaimTrigger,
        pool: &mut Pool<T, F>,
    ) -> Option<Reclaimed>
    where
        T: Poolable,
        F: InstanceFactory<T>,
    {
        let entry = self
            .armed
            .get(&handle.id())
            .filter(|entry| entry.handle == handle)?;

        let delay = match &entry.policy {
            ReclaimPolicy::FirstTrigger { triggers } if triggers.contains(&trigger) => None,
            ReclaimPolicy::OnDeath { delay, .. }
                if trigger == ReclaimTrigger::Death && !entry.dying =>
            {
                Some(*delay)
            }
            _ => return None,
        };

        let Some(delay) = delay else {
            return self.finish(handle, ReclaimCause::Triggered(trigger), pool);
        };
        if delay <= 0.0 {
            return self.finish(handle, ReclaimCause::Died, pool);
        }

        if let Some(entry) = self.armed.get_mut(&handle.id()) {
            if let Some(fuse) = entry.timer.take() {
                self.timers.cancel(fuse);
            }
            entry.dying = true;
            entry.timer = Some(self.timers.schedule(delay, (handle, Stage::Telegraph)));
        }
        log::debug!("{:?} dying, released in {:.2}s", handle, delay);
        None
    }

    /// Advance every running timer and release the instances whose time is up
    pub fn update<T, F>(&mut self, dt: f32, pool: &mut Pool<T, F>) -> Vec<Reclaimed>
    where
        T: Poolable,
        F: InstanceFactory<T>,
    {
        let mut reclaimed = Vec::new();
        for (timer, (handle, stage)) in self.timers.advance(dt) {
            let current = self
                .armed
                .get(&handle.id())
                .is_some_and(|entry| entry.handle == handle && entry.timer == Some(timer));
            if !current {
                self.stats.stale += 1;
                continue;
            }
            if let Some(entry) = self.armed.get_mut(&handle.id()) {
                entry.timer = None;
            }

            let cause = match stage {
                Stage::Lifetime => ReclaimCause::Expired,
                Stage::Fuse => ReclaimCause::SelfDestructed,
                Stage::Telegraph => ReclaimCause::Died,
            };
            reclaimed.extend(self.finish(handle, cause, pool));
        }
        reclaimed
    }

    /// Stop tracking an activation; any pending timer is cancelled
    pub fn disarm(&mut self, handle: InstanceHandle) -> bool {
        let matches = self
            .armed
            .get(&handle.id())
            .is_some_and(|entry| entry.handle == handle);
        if matches {
            self.forget(handle.id());
            self.stats.disarmed += 1;
        }
        matches
    }

    /// Release an instance early, cancelling whatever was pending for it
    pub fn release<T, F>(&mut self, handle: InstanceHandle, pool: &mut Pool<T, F>) -> ReleaseOutcome
    where
        T: Poolable,
        F: InstanceFactory<T>,
    {
        self.disarm(handle);
        pool.release(handle)
    }

    /// Freeze the pending timer of an activation
    pub fn pause(&mut self, handle: InstanceHandle) -> bool {
        self.current_timer(handle)
            .is_some_and(|timer| self.timers.pause(timer))
    }

    /// Let a frozen timer run again
    pub fn resume(&mut self, handle: InstanceHandle) -> bool {
        self.current_timer(handle)
            .is_some_and(|timer| self.timers.resume(timer))
    }

    /// Whether the activation is being tracked
    pub fn is_armed(&self, handle: InstanceHandle) -> bool {
        self.armed
            .get(&handle.id())
            .is_some_and(|entry| entry.handle == handle)
    }

    /// Whether the activation is in its death telegraph
    pub fn is_dying(&self, handle: InstanceHandle) -> bool {
        self.armed
            .get(&handle.id())
            .is_some_and(|entry| entry.handle == handle && entry.dying)
    }

    /// Whether the activation's timer is frozen
    pub fn is_paused(&self, handle: InstanceHandle) -> bool {
        self.current_timer(handle)
            .is_some_and(|timer| self.timers.is_paused(timer))
    }

    /// Seconds left on the activation's pending timer
    pub fn remaining(&self, handle: InstanceHandle) -> Option<f32> {
        self.current_timer(handle)
            .and_then(|timer| self.timers.remaining(timer))
    }

    /// Number of tracked activations
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Counters since creation
    pub fn stats(&self) -> &ReclaimerStats {
        &self.stats
    }

    /// Forget every tracked activation, e.g. at session end
    pub fn clear(&mut self) {
        self.armed.clear();
        self.timers.clear();
    }

    fn current_timer(&self, handle: InstanceHandle) -> Option<TimerId> {
        self.armed
            .get(&handle.id())
            .filter(|entry| entry.handle == handle)
            .and_then(|entry| entry.timer)
    }

    fn forget(&mut self, id: InstanceId) -> Option<Armed> {
        let entry = self.armed.remove(&id)?;
        if let Some(timer) = entry.timer {
            self.timers.cancel(timer);
        }
        Some(entry)
    }

    fn finish<T, F>(
        &mut self,
        handle: InstanceHandle,
        cause: ReclaimCause,
        pool: &mut Pool<T, F>,
    ) -> Option<Reclaimed>
    where
        T: Poolable,
        F: InstanceFactory<T>,
    {
        let entry = self.forget(handle.id())?;
        if !pool.is_active(handle) {
            self.stats.stale += 1;
            log::debug!("{:?} already inactive, {:?} dropped", handle, cause);
            return None;
        }

        let outcome = pool.release(handle);
        match cause {
            ReclaimCause::Triggered(_) => self.stats.triggered += 1,
            ReclaimCause::Expired => self.stats.expired += 1,
            ReclaimCause::SelfDestructed => self.stats.self_destructed += 1,
            ReclaimCause::Died => self.stats.died += 1,
        }
        log::trace!("Reclaimed {:?} ({:?})", handle, cause);
        Some(Reclaimed {
            handle,
            kind: entry.kind,
            cause,
            outcome,
        })
    }
}
