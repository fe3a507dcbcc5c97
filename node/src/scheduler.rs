//! Periodic governance jobs.
//!
//! Two tasks mirror the original scheduler registrations: a 5-minute
//! maintenance pass (orphan cleanup and re-requests, cache sweeps) and a
//! relay flush every 5 seconds (1 second on mockable chains, whose tests
//! need tighter timings). Both exit promptly on shutdown and are joined.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use orin_governance::GovernanceManager;
use orin_protocol::{GovernanceNet, InvRelay};
use orin_types::{NetworkParams, Timestamp};

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(5 * 60);
const RELAY_INTERVAL: Duration = Duration::from_secs(5);
const RELAY_INTERVAL_MOCKABLE: Duration = Duration::from_secs(1);

pub struct GovernanceScheduler {
    maintenance: JoinHandle<()>,
    relay: JoinHandle<()>,
}

impl GovernanceScheduler {
    /// Spawn both jobs. `shutdown` flipping to `true` stops them.
    pub fn start(
        manager: Arc<GovernanceManager>,
        net: Arc<dyn GovernanceNet>,
        relay_sink: Arc<dyn InvRelay>,
        params: &NetworkParams,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let maintenance = {
            let manager = Arc::clone(&manager);
            let net = Arc::clone(&net);
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
                interval.tick().await; // immediate first tick
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let now = Timestamp::now();
                            manager.clean_orphan_votes(now);
                            manager.request_orphan_objects(&*net);
                            manager.check_and_remove(now);
                        }
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
                tracing::debug!("governance maintenance job stopped");
            })
        };

        let relay_interval = if params.is_mockable() {
            RELAY_INTERVAL_MOCKABLE
        } else {
            RELAY_INTERVAL
        };
        let relay = {
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(relay_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            manager.flush_relay_queue(&*relay_sink);
                        }
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
                tracing::debug!("governance relay job stopped");
            })
        };

        Self { maintenance, relay }
    }

    /// Wait for both jobs to finish after shutdown was signalled.
    pub async fn join(self) {
        let _ = self.maintenance.await;
        let _ = self.relay.await;
    }
}
