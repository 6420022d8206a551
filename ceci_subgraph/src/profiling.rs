//! Per-phase wall-clock profiling, compiled in with the `profiling` feature.
//!
//! `Timer` records its lifetime under a static label when dropped. Without
//! the feature every call is a no-op.

#[cfg(feature = "profiling")]
mod enabled {
    use std::sync::OnceLock;
    use std::time::{Duration, Instant};

    use dashmap::DashMap;

    type Calls = u64;
    type TotalNanos = u128;

    static PHASES: OnceLock<DashMap<&'static str, (Calls, TotalNanos)>> = OnceLock::new();

    #[inline]
    fn phases() -> &'static DashMap<&'static str, (Calls, TotalNanos)> {
        PHASES.get_or_init(DashMap::new)
    }

    /// Records the time until it is dropped under its phase label.
    pub struct Timer {
        phase: &'static str,
        start: Instant,
    }

    impl Timer {
        /// Start timing `phase`.
        #[inline]
        pub fn new(phase: &'static str) -> Self {
            Self {
                phase,
                start: Instant::now(),
            }
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            record(self.phase, self.start.elapsed());
        }
    }

    /// Add one call taking `elapsed` to `phase`.
    pub fn record(phase: &'static str, elapsed: Duration) {
        let mut entry = phases().entry(phase).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += elapsed.as_nanos();
    }

    /// Phases sorted by total time, longest first.
    pub fn snapshot() -> Vec<(&'static str, Calls, TotalNanos)> {
        let mut rows: Vec<_> = phases()
            .iter()
            .map(|kv| (*kv.key(), kv.value().0, kv.value().1))
            .collect();
        rows.sort_by(|a, b| b.2.cmp(&a.2));
        rows
    }

    /// Print the phase table to stdout.
    pub fn report() {
        println!("==== ceci_subgraph phase profile ====");
        for (phase, calls, total_ns) in snapshot() {
            let total_ms = total_ns as f64 / 1_000_000.0;
            let avg_us = if calls == 0 {
                0.0
            } else {
                total_ns as f64 / calls as f64 / 1_000.0
            };
            println!("{phase:<32} calls={calls:<8} total={total_ms:>10.3} ms avg={avg_us:>10.1} us");
        }
        println!("=====================================");
    }
}

#[cfg(not(feature = "profiling"))]
mod disabled {
    use std::time::Duration;

    /// Records the time until it is dropped under its phase label.
    #[derive(Clone, Copy)]
    pub struct Timer;

    impl Timer {
        /// Start timing `phase`.
        #[inline]
        pub const fn new(_: &'static str) -> Self {
            Self
        }
    }

    /// Add one call taking `elapsed` to `phase`.
    pub const fn record(_: &'static str, _: Duration) {}

    /// Phases sorted by total time, longest first.
    pub const fn snapshot() -> Vec<(&'static str, u64, u128)> {
        Vec::new()
    }

    /// Print the phase table to stdout.
    pub const fn report() {}
}

#[cfg(feature = "profiling")]
pub use enabled::*;

#[cfg(not(feature = "profiling"))]
pub use disabled::*;
