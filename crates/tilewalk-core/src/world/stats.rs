//! Streaming statistics collection trait

/// Trait for collecting chunk streaming statistics
///
/// Levels record what they did without knowing whether anyone is counting.
pub trait StreamingStats {
    /// A chunk record was created for a coordinate seen for the first time
    fn record_generated(&mut self);

    /// A chunk's visuals were instantiated
    fn record_loaded(&mut self);

    /// A chunk's visuals were disposed
    fn record_unloaded(&mut self);

    /// A structure object could not be placed
    fn record_spawn_failure(&mut self);
}

/// A no-op implementation for when stats collection is not needed
#[derive(Default)]
pub struct NoopStats;

impl StreamingStats for NoopStats {
    fn record_generated(&mut self) {}
    fn record_loaded(&mut self) {}
    fn record_unloaded(&mut self) {}
    fn record_spawn_failure(&mut self) {}
}

/// Plain counters over a level's lifetime
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamingCounters {
    pub generated: u64,
    pub loaded: u64,
    pub unloaded: u64,
    pub spawn_failures: u64,
}

impl StreamingStats for StreamingCounters {
    fn record_generated(&mut self) {
        self.generated += 1;
    }

    fn record_loaded(&mut self) {
        self.loaded += 1;
    }

    fn record_unloaded(&mut self) {
        self.unloaded += 1;
    }

    fn record_spawn_failure(&mut self) {
        self.spawn_failures += 1;
    }
}
