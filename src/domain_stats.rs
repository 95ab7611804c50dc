use dashmap::DashMap;

use crate::error::MonitorError;

/// Cumulative probe counts for one domain. `success <= total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStats {
    pub success: u64,
    pub total: u64,
}

impl DomainStats {
    /// `round(100 * success / total)`, half away from zero. 0 before any probe.
    pub fn availability_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (100.0 * self.success as f64 / self.total as f64).round() as u8
    }
}

/// Per-domain availability counters, keyed by domain.
///
/// Records are created by `seed` and only ever incremented by `record`.
/// Each entry sits behind its shard lock, so concurrent writers to the same
/// domain are serialised.
#[derive(Debug, Default)]
pub struct DomainStatsRegistry {
    stats: DashMap<String, DomainStats>,
}

impl DomainStatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures a record exists for `domain`. Existing counts are left alone.
    pub fn seed(&self, domain: &str) {
        if !self.stats.contains_key(domain) {
            self.stats.entry(domain.to_string()).or_default();
        }
    }

    pub fn record(&self, domain: &str, healthy: bool) -> Result<(), MonitorError> {
        let mut entry = self
            .stats
            .get_mut(domain)
            .ok_or_else(|| MonitorError::UnseededDomain(domain.to_string()))?;
        entry.total += 1;
        if healthy {
            entry.success += 1;
        }
        Ok(())
    }

    pub fn get(&self, domain: &str) -> Option<DomainStats> {
        self.stats.get(domain).map(|entry| *entry)
    }

    /// Copy of every record, sorted by domain.
    pub fn snapshot(&self) -> Vec<(String, DomainStats)> {
        let mut records: Vec<(String, DomainStats)> = self
            .stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
