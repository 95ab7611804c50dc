use futures::future::join_all;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info};

use crate::config::{MonitorConfig, ProbeMode};
use crate::domain::extract_domain;
use crate::domain_stats::DomainStatsRegistry;
use crate::endpoint::Endpoint;
use crate::error::MonitorError;
use crate::health_check::{HealthClassifier, ProbeVerdict};
use crate::http_client::HttpClient;
use crate::reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u64,
    pub probes: usize,
    pub healthy: usize,
}

struct Target {
    endpoint: Endpoint,
    domain: String,
}

/// Probes every endpoint once per round, accumulates per-domain availability
/// and reports it after each round.
pub struct HealthMonitor {
    targets: Vec<Target>,
    classifier: HealthClassifier,
    registry: DomainStatsRegistry,
    config: MonitorConfig,
    rounds: AtomicU64,
}

impl HealthMonitor {
    /// Seeds a registry record for every endpoint's domain, so each domain
    /// exists before the first probe is recorded.
    pub fn new(
        endpoints: Vec<Endpoint>,
        http_client: Box<dyn HttpClient>,
        config: MonitorConfig,
    ) -> Self {
        let registry = DomainStatsRegistry::new();
        let targets: Vec<Target> = endpoints
            .into_iter()
            .map(|endpoint| {
                let domain = extract_domain(&endpoint.url);
                registry.seed(&domain);
                Target { endpoint, domain }
            })
            .collect();

        Self {
            targets,
            classifier: HealthClassifier::new(http_client, &config),
            registry,
            config,
            rounds: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &DomainStatsRegistry {
        &self.registry
    }

    pub fn get_cycle_interval(&self) -> Duration {
        self.config.check_interval
    }

    /// Probes every endpoint once and records each verdict, in config order.
    pub async fn run_round(&self) -> Result<RoundSummary, MonitorError> {
        let round = self.rounds.fetch_add(1, Ordering::Relaxed) + 1;
        let mut healthy = 0;

        match self.config.probe_mode {
            ProbeMode::Sequential => {
                for target in &self.targets {
                    let verdict = self.classifier.probe(&target.endpoint).await;
                    healthy += usize::from(verdict.healthy);
                    self.record(target, &verdict)?;
                }
            }
            ProbeMode::Concurrent => {
                let verdicts = join_all(
                    self.targets
                        .iter()
                        .map(|target| self.classifier.probe(&target.endpoint)),
                )
                .await;

                for (target, verdict) in self.targets.iter().zip(&verdicts) {
                    healthy += usize::from(verdict.healthy);
                    self.record(target, verdict)?;
                }
            }
        }

        let summary = RoundSummary {
            round,
            probes: self.targets.len(),
            healthy,
        };
        info!(
            round = summary.round,
            probes = summary.probes,
            healthy = summary.healthy,
            "Round completed"
        );
        Ok(summary)
    }

    fn record(&self, target: &Target, verdict: &ProbeVerdict) -> Result<(), MonitorError> {
        debug!(
            endpoint = %target.endpoint.name,
            domain = %target.domain,
            healthy = verdict.healthy,
            "Recording probe"
        );
        self.registry.record(&target.domain, verdict.healthy)
    }

    pub fn report<W: Write>(&self, out: &mut W) -> Result<(), MonitorError> {
        reporter::write_report(&self.registry, out)
    }

    /// Runs rounds until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Each round is followed by a report to `out` and then the cycle interval.
    /// Shutdown is only observed between rounds; a round in progress always
    /// finishes and is reported.
    pub async fn run<W: Write + Send>(
        &self,
        out: &mut W,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), MonitorError> {
        info!(
            endpoints = self.targets.len(),
            domains = self.registry.len(),
            request_timeout = ?self.classifier.timeout(),
            interval = ?self.get_cycle_interval(),
            mode = %self.config.probe_mode,
            "Monitor started"
        );

        while !*shutdown.borrow_and_update() {
            self.run_round().await?;
            self.report(out)?;

            if self.wait_for_next_round(&mut shutdown).await {
                break;
            }
        }

        info!(rounds = self.rounds.load(Ordering::Relaxed), "Monitor stopped");
        Ok(())
    }

    /// Sleeps one cycle interval. Returns `true` if shutdown was requested
    /// meanwhile.
    async fn wait_for_next_round(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let sleep = time::sleep(self.get_cycle_interval());
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow_and_update() => return true,
                    Ok(()) => continue,
                    Err(_) => return true,
                },
            }
        }
    }
}
