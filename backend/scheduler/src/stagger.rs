//! Stagger: spacing between the first ticks of timers started together.
//!
//! Timers promoted in the same pass would otherwise fire their first
//! submission in the same instant. The policy maps a timer's index within
//! its promotion pass to the delay before its first tick.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

type OffsetFn = dyn Fn(usize) -> Duration + Send + Sync;

#[derive(Clone)]
pub enum StaggerPolicy {
    /// Timer `i` starts `i * step` after the pass began.
    Linear(Duration),
    /// Each timer starts at a random point in `[0, window)`.
    Random(Duration),
    /// Caller-supplied offset function.
    Custom(Arc<OffsetFn>),
}

impl StaggerPolicy {
    pub fn from_seconds(stagger_secs: u64) -> Self {
        StaggerPolicy::Linear(Duration::from_secs(stagger_secs))
    }

    pub fn custom(f: impl Fn(usize) -> Duration + Send + Sync + 'static) -> Self {
        StaggerPolicy::Custom(Arc::new(f))
    }

    /// Delay before the first tick of the `index`-th timer in a pass.
    pub fn offset(&self, index: usize) -> Duration {
        match self {
            StaggerPolicy::Linear(step) => {
                step.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
            }
            StaggerPolicy::Random(window) => {
                let window_ms = window.as_millis() as u64;
                if window_ms == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rand::thread_rng().gen_range(0..window_ms))
            }
            StaggerPolicy::Custom(f) => f(index),
        }
    }
}

impl Default for StaggerPolicy {
    fn default() -> Self {
        StaggerPolicy::Linear(Duration::ZERO)
    }
}

impl fmt::Debug for StaggerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaggerPolicy::Linear(step) => f.debug_tuple("Linear").field(step).finish(),
            StaggerPolicy::Random(window) => f.debug_tuple("Random").field(window).finish(),
            StaggerPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
