//! Tick scheduler — registration-ordered systems with per-system throttling.
//!
//! Each registered system carries `{ last_run, interval }`. On a tick with
//! elapsed step `dt`, world time advances first, then every system whose
//! interval has elapsed runs, in registration order. A zero interval runs
//! every tick (continuously-updated subsystems); a longer interval runs at a
//! sub-multiple of the tick rate, at most once per interval boundary.
//!
//! Both drivers use this scheduler unchanged: the server with a fixed-rate
//! timer step, the client with a measured per-frame `dt` — the core assumes
//! nothing about `dt`.

use std::time::Duration;

use tracing::{debug, warn};

use crate::world::World;

/// One simulation step's logic.
pub trait System: Send {
    /// Human-readable name, used in diagnostics.
    fn name(&self) -> &str;

    /// Run one update with the elapsed step `dt`.
    fn update(&mut self, world: &mut World, dt: Duration);
}

struct Slot {
    system: Box<dyn System>,
    interval: Duration,
    last_run: Duration,
}

/// Advances registered systems against a [`World`].
#[derive(Default)]
pub struct Scheduler {
    slots: Vec<Slot>,
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system that runs every tick.
    pub fn add_system(&mut self, system: impl System + 'static) {
        self.add_throttled(system, Duration::ZERO);
    }

    /// Register a system that runs at most once per `interval`.
    pub fn add_throttled(&mut self, system: impl System + 'static, interval: Duration) {
        self.slots.push(Slot {
            system: Box::new(system),
            interval,
            last_run: Duration::ZERO,
        });
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no systems are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run one tick: advance world time by `dt`, then run every due system
    /// in registration order.
    ///
    /// A system panicking would poison the whole loop, so systems are
    /// expected to report failures through the world's state instead; the
    /// dispatch path already downgrades per-action errors before they reach
    /// here.
    pub fn tick(&mut self, world: &mut World, dt: Duration) {
        world.advance(dt);
        let elapsed = world.elapsed();

        for slot in &mut self.slots {
            if elapsed - slot.last_run >= slot.interval {
                slot.last_run = elapsed;
                debug!(system = slot.system.name(), ?dt, "running system");
                slot.system.update(world, dt);
            }
        }

        if dt > Duration::from_millis(250) {
            warn!(?dt, "unusually large tick step");
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("systems", &self.slots.len())
            .finish()
    }
}
