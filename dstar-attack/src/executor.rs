//! Spawns attacks onto the runtime and tracks them through handles

use dstar_core::{Attack, AttackContext, AttackHandle, Error, Result};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs one attack as a tokio task
pub struct AttackExecutor {
    /// Unique identifier for this attack instance
    id: Uuid,
    attack_name: String,
}

impl AttackExecutor {
    pub fn new(attack_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            attack_name: attack_name.into(),
        }
    }

    /// Spawn `attack` and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn execute(self, attack: Arc<dyn Attack>, context: AttackContext) -> AttackHandle {
        let id = self.id;
        let attack_name = self.attack_name;
        let running = context.running.clone();
        let stats = context.stats.clone();
        let started_at = SystemTime::now();

        info!(id = %id, attack = %attack_name, "Starting attack");

        let task_name = attack_name.clone();
        let task_handle = tokio::spawn(async move {
            let result = attack.execute(context.clone()).await;
            context.stop();

            match &result {
                Ok(()) => info!(id = %id, attack = %task_name, "Attack completed"),
                Err(e) => error!(id = %id, attack = %task_name, error = %e, "Attack failed"),
            }
            result
        });

        AttackHandle {
            id,
            attack_name,
            running,
            stats,
            started_at,
            task_handle: Some(task_handle),
        }
    }
}

/// Wait for an attack task to finish and return its result
pub async fn wait_for_attack(handle: &mut AttackHandle) -> Result<()> {
    let Some(task_handle) = handle.task_handle.take() else {
        warn!(id = %handle.id, "Attack task already joined");
        return Ok(());
    };

    match task_handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            error!(id = %handle.id, "Attack task panicked");
            Err(Error::ExecutionFailed("Attack task panicked".to_string()))
        }
        Err(e) => {
            error!(id = %handle.id, error = %e, "Failed to join attack task");
            Err(Error::ExecutionFailed(format!(
                "Failed to join attack task: {}",
                e
            )))
        }
    }
}

/// Signal an attack to stop and wait for it to wind down
pub async fn stop_and_wait(handle: &mut AttackHandle) -> Result<()> {
    debug!(id = %handle.id, "Stopping attack");
    handle.stop();
    wait_for_attack(handle).await
}
