//! # Instance Lifetimes
//!
//! Countdown timers and the reclaimer that hands instances back to their
//! pool when a timer runs out or a domain event ends them.

pub mod reclaimer;
pub mod timer_queue;

pub use reclaimer::{
    ReclaimCause, ReclaimPolicy, ReclaimTrigger, Reclaimed, Reclaimer, ReclaimerStats,
};
pub use timer_queue::{TimerId, TimerQueue};
