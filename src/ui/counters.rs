//! Animated stat counters.
//!
//! Each stat owns at most one interpolation task. A new target aborts the
//! running task and bumps the stat's generation, and a step only writes while
//! its generation is still current, so a superseded animation can never
//! overwrite a newer one even if it is mid-step when aborted.

use crate::feeds::StatsSnapshot;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const ANIMATION_STEPS: u32 = 20;
pub const ANIMATION_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Total,
    Whatsapp,
    Instagram,
    Facebook,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::Total, Stat::Whatsapp, Stat::Instagram, Stat::Facebook];

    pub fn label(self) -> &'static str {
        match self {
            Stat::Total => "Total",
            Stat::Whatsapp => "WhatsApp",
            Stat::Instagram => "Instagram",
            Stat::Facebook => "Facebook",
        }
    }

    pub fn value_in(self, snapshot: &StatsSnapshot) -> u64 {
        match self {
            Stat::Total => snapshot.total,
            Stat::Whatsapp => snapshot.whatsapp,
            Stat::Instagram => snapshot.instagram,
            Stat::Facebook => snapshot.facebook,
        }
    }
}

#[derive(Debug, Default)]
struct CounterState {
    displayed: Option<u64>,
    target: u64,
    generation: u64,
}

type Counters = Arc<Mutex<HashMap<Stat, CounterState>>>;

#[derive(Default)]
pub struct CounterAnimator {
    counters: Counters,
    animations: HashMap<Stat, JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

fn lock(counters: &Mutex<HashMap<Stat, CounterState>>) -> MutexGuard<'_, HashMap<Stat, CounterState>> {
    counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CounterAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value currently on screen; 0 before the first stats load.
    pub fn displayed(&self, stat: Stat) -> u64 {
        lock(&self.counters)
            .get(&stat)
            .and_then(|state| state.displayed)
            .unwrap_or(0)
    }

    pub fn target(&self, stat: Stat) -> u64 {
        lock(&self.counters)
            .get(&stat)
            .map(|state| state.target)
            .unwrap_or(0)
    }

    /// Number of interpolation steps written since creation, across all stats.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_animating(&self, stat: Stat) -> bool {
        self.animations
            .get(&stat)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn apply_snapshot(&mut self, snapshot: &StatsSnapshot) {
        for stat in Stat::ALL {
            self.animate_to(stat, stat.value_in(snapshot));
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn animate_to(&mut self, stat: Stat, target: u64) {
        let (start, generation) = {
            let mut counters = lock(&self.counters);
            let state = counters.entry(stat).or_default();
            let start = state.displayed.unwrap_or(0);
            state.target = target;
            if start == target && !self.is_animating(stat) {
                state.displayed = Some(start);
                return;
            }
            state.generation += 1;
            (start, state.generation)
        };

        if let Some(previous) = self.animations.remove(&stat) {
            previous.abort();
        }

        if start == target {
            return;
        }

        let counters = Arc::clone(&self.counters);
        let ticks = Arc::clone(&self.ticks);
        let handle = tokio::spawn(async move {
            run_animation(counters, ticks, stat, generation, start, target).await;
        });
        self.animations.insert(stat, handle);
    }

    /// Stop every running animation, leaving counters at their current values.
    pub fn shutdown(&mut self) {
        let mut counters = lock(&self.counters);
        for (stat, handle) in self.animations.drain() {
            handle.abort();
            if let Some(state) = counters.get_mut(&stat) {
                state.generation += 1;
            }
        }
    }
}

impl Drop for CounterAnimator {
    fn drop(&mut self) {
        for handle in self.animations.values() {
            handle.abort();
        }
    }
}

async fn run_animation(
    counters: Counters,
    ticks: Arc<AtomicU64>,
    stat: Stat,
    generation: u64,
    start: u64,
    target: u64,
) {
    let step_duration = ANIMATION_DURATION / ANIMATION_STEPS;
    let step_value = (target as f64 - start as f64) / ANIMATION_STEPS as f64;
    let mut current = start as f64;

    let mut interval = tokio::time::interval(step_duration);
    // First tick completes immediately.
    interval.tick().await;

    for step in 1..=ANIMATION_STEPS {
        interval.tick().await;
        current += step_value;

        let value = if step == ANIMATION_STEPS {
            target
        } else {
            current.round().max(0.0) as u64
        };

        let mut counters = lock(&counters);
        let Some(state) = counters.get_mut(&stat) else {
            return;
        };
        if state.generation != generation {
            return;
        }
        state.displayed = Some(value);
        ticks.fetch_add(1, Ordering::Relaxed);
    }
}
