//! Diagnostics collector
//!
//! Starts every probe at once and gathers their outputs. Probes are
//! independent: completion order is whatever their latency dictates, and a
//! failing probe never holds up or cancels the others.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::host::{Host, NativeHost};
use crate::probes::{ProbeContext, ProbeKind, ProbeOutput, ProbeSettings};
use crate::report::Report;
use crate::services::ServiceClient;

pub struct Collector {
    ctx: Arc<ProbeContext>,
}

impl Collector {
    pub fn new(host: Arc<dyn Host>, services: ServiceClient, settings: ProbeSettings) -> Self {
        Collector {
            ctx: Arc::new(ProbeContext {
                host,
                services,
                settings,
            }),
        }
    }

    /// Collector for the local machine, wired from configuration
    pub fn from_config(config: &Config) -> Self {
        let host = NativeHost::new(config.host_settings());
        let services = ServiceClient::from_config(&config.services);
        Self::new(Arc::new(host), services, config.probe_settings())
    }

    fn spawn_all(&self) -> JoinSet<ProbeOutput> {
        let mut tasks = JoinSet::new();
        for probe in ProbeKind::ALL {
            tasks.spawn(probe.run(Arc::clone(&self.ctx)));
        }
        tasks
    }

    /// Run every probe and wait for them, up to the collection deadline.
    ///
    /// Probes still running at the deadline are abandoned; their slots stay
    /// unset in the returned report.
    pub async fn run_all(&self) -> Report {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.ctx.settings.collection_deadline;
        let mut report = Report::new();
        let mut pending: Vec<ProbeKind> = ProbeKind::ALL.to_vec();
        let mut tasks = self.spawn_all();

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(output))) => {
                    pending.retain(|probe| *probe != output.probe);
                    report.record(output);
                }
                Ok(Some(Err(err))) => error!("probe task aborted: {err}"),
                Ok(None) => break,
                Err(_) => {
                    let names: Vec<&str> = pending.iter().map(|probe| probe.name()).collect();
                    warn!(
                        pending = %names.join(","),
                        "collection deadline reached, reporting without pending probes"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        info!(
            slots = report.slots.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "diagnostics collected"
        );
        report
    }

    /// Run every probe, yielding each output as soon as its probe finishes.
    ///
    /// The channel closes once all probes are done.
    pub fn stream(&self) -> mpsc::UnboundedReceiver<ProbeOutput> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut tasks = self.spawn_all();

        tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(output) => {
                        if tx.send(output).is_err() {
                            // Receiver gone; let the remaining probes finish unobserved
                            tasks.detach_all();
                            break;
                        }
                    }
                    Err(err) => error!("probe task aborted: {err}"),
                }
            }
        });

        rx
    }
}
