// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! DRPolicy reconciler - makes sure the pairing behind a DR policy has its
//! secrets mirrored.

use crate::error::{Result, SyncError};
use crate::reconcilers::{requeue_action, PairingLocks};
use crate::sync::{DeliveryMode, PairingDirectory, SyncEngine};
use crate::types::DRPolicy;
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, ResourceExt,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct DRPolicyReconciler {
    engine: Arc<SyncEngine>,
    locks: Arc<PairingLocks>,
}

impl DRPolicyReconciler {
    pub fn new(engine: Arc<SyncEngine>, locks: Arc<PairingLocks>) -> Self {
        Self { engine, locks }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let policies: Api<DRPolicy> = Api::all(self.engine.client().clone());
        let context = Arc::new(self);

        Controller::new(policies, watcher::Config::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled DRPolicy: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Sync the pairing of the policy's clusters. Returns `false` when
    /// there was nothing to do.
    #[instrument(skip(self, policy), fields(dr_policy = %policy.name_any()))]
    async fn sync_policy(&self, policy: &DRPolicy) -> Result<bool> {
        let [cluster_a, cluster_b] = policy.spec.dr_clusters.as_slice() else {
            warn!(
                "DRPolicy names {} clusters, expected 2",
                policy.spec.dr_clusters.len()
            );
            return Ok(false);
        };

        let directory = PairingDirectory::load(self.engine.client()).await?;
        let pairing = directory.resolve_pairing_for_cluster_set(cluster_a, cluster_b)?;
        if pairing.is_storage_client_type() {
            info!(
                "MirrorPeer {} references a storage client, nothing to mirror",
                pairing.name_any()
            );
            return Ok(false);
        }

        let _guard = self.locks.lock(&pairing.name_any()).await;
        self.engine
            .sync_pairing(pairing, &directory, DeliveryMode::CreateOnly)
            .await?;
        Ok(true)
    }
}

async fn reconcile(policy: Arc<DRPolicy>, ctx: Arc<DRPolicyReconciler>) -> Result<Action> {
    debug!("Reconciling DRPolicy: {}", policy.name_any());
    ctx.sync_policy(&policy).await?;
    Ok(Action::await_change())
}

fn error_policy(policy: Arc<DRPolicy>, error: &SyncError, ctx: Arc<DRPolicyReconciler>) -> Action {
    error!("Reconciliation error for DRPolicy {}: {}", policy.name_any(), error);
    requeue_action(error, ctx.engine.config())
}
