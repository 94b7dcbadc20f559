/// Scoped timing for render layers.
///
/// A scope borrows the stats it reports to and records its elapsed time into
/// them when dropped.
use crate::render::queue::RenderLayer;
use crate::render::stats::RenderStats;
use std::time::Instant;

/// RAII timer that records one layer's render time.
pub struct ProfilerScope<'a> {
    start: Instant,
    layer: RenderLayer,
    stats: &'a mut RenderStats,
}

impl<'a> ProfilerScope<'a> {
    /// Starts timing `layer`.
    pub fn new(stats: &'a mut RenderStats, layer: RenderLayer) -> Self {
        Self {
            start: Instant::now(),
            layer,
            stats,
        }
    }

    pub fn layer(&self) -> RenderLayer {
        self.layer
    }

    /// Gets elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope<'_> {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        self.stats.record_layer(self.layer, elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_profiler_scope_measures_time() {
        let mut stats = RenderStats::default();
        {
            let scope = ProfilerScope::new(&mut stats, RenderLayer::Clouds);
            thread::sleep(Duration::from_millis(10));
            let elapsed = scope.elapsed_ms();
            assert!(elapsed >= 10.0, "Expected at least 10ms, got {elapsed}");
            assert!(elapsed < 50.0, "Expected less than 50ms, got {elapsed}");
        }
        assert!(stats.avg_layer_ms(RenderLayer::Clouds) >= 10.0);
    }

    #[test]
    fn test_scope_records_only_its_layer() {
        let mut stats = RenderStats::default();
        {
            let scope = ProfilerScope::new(&mut stats, RenderLayer::Effects);
            assert_eq!(scope.layer(), RenderLayer::Effects);
        }
        assert!(stats.report(1.0).layers.contains_key("effects"));
        assert_eq!(stats.avg_layer_ms(RenderLayer::Clouds), 0.0);
    }
}
