use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Latest-value cell backing a pull-based gauge.
///
/// The workload thread is the only writer. Readers are export cycles running on
/// the sink's own threads; they may observe a stale value but never a torn one.
#[derive(Debug, Clone, Default)]
pub struct GaugeCell {
    value: Arc<AtomicU64>,
}

impl GaugeCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
