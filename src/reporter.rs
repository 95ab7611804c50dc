use std::io::Write;

use crate::domain_stats::{DomainStats, DomainStatsRegistry};
use crate::error::MonitorError;

pub fn format_line(domain: &str, stats: &DomainStats) -> String {
    format!("{} has {}% availability", domain, stats.availability_percent())
}

/// One report line per domain, sorted by domain.
pub fn render(registry: &DomainStatsRegistry) -> Vec<String> {
    registry
        .snapshot()
        .iter()
        .map(|(domain, stats)| format_line(domain, stats))
        .collect()
}

pub fn write_report<W: Write>(registry: &DomainStatsRegistry, out: &mut W) -> Result<(), MonitorError> {
    for line in render(registry) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
