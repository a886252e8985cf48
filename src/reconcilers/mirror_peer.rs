// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! MirrorPeer reconciler - mirrors the secrets of a pairing and sweeps orphans
//! once the pairing is deleted.

use crate::constants::FINALIZER;
use crate::error::{Result, SyncError};
use crate::reconcilers::{requeue_action, PairingLocks};
use crate::sync::{DeliveryMode, PairingDirectory, SyncEngine, SyncReport};
use crate::types::MirrorPeer;
use futures::StreamExt;
use kube::{
    runtime::{
        controller::Action,
        finalizer::{finalizer, Event},
        watcher, Controller,
    },
    Api, ResourceExt,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct MirrorPeerReconciler {
    engine: Arc<SyncEngine>,
    locks: Arc<PairingLocks>,
}

impl MirrorPeerReconciler {
    pub fn new(engine: Arc<SyncEngine>, locks: Arc<PairingLocks>) -> Self {
        Self { engine, locks }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let pairings: Api<MirrorPeer> = Api::all(self.engine.client().clone());
        let context = Arc::new(self);

        Controller::new(pairings, watcher::Config::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled MirrorPeer: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    #[instrument(skip(self, pairing), fields(mirror_peer = %pairing.name_any()))]
    async fn apply(&self, pairing: &MirrorPeer) -> Result<SyncReport> {
        let _guard = self.locks.lock(&pairing.name_any()).await;
        let directory = PairingDirectory::load(self.engine.client()).await?;
        self.engine
            .sync_pairing(pairing, &directory, DeliveryMode::CreateOnly)
            .await
    }

    /// Sweep with the pairing left out; the finalizer is only released
    /// once this succeeds
    #[instrument(skip(self, pairing), fields(mirror_peer = %pairing.name_any()))]
    async fn cleanup(&self, pairing: &MirrorPeer) -> Result<usize> {
        let name = pairing.name_any();
        let guard = self.locks.lock(&name).await;

        let removed = self.engine.sweep(Some(&name)).await?;
        info!("MirrorPeer {} deleted, removed {} orphaned secrets", name, removed);

        drop(guard);
        self.locks.forget(&name);
        Ok(removed)
    }
}

async fn reconcile(pairing: Arc<MirrorPeer>, ctx: Arc<MirrorPeerReconciler>) -> Result<Action> {
    debug!("Reconciling MirrorPeer: {}", pairing.name_any());
    let api: Api<MirrorPeer> = Api::all(ctx.engine.client().clone());

    finalizer(&api, FINALIZER, pairing, |event| async {
        match event {
            Event::Apply(pairing) => ctx.apply(&pairing).await.map(|_| Action::await_change()),
            Event::Cleanup(pairing) => ctx
                .cleanup(&pairing)
                .await
                .map(|_| Action::await_change()),
        }
    })
    .await
    .map_err(|e| SyncError::Finalizer(Box::new(e)))
}

fn error_policy(
    pairing: Arc<MirrorPeer>,
    error: &SyncError,
    ctx: Arc<MirrorPeerReconciler>,
) -> Action {
    error!("Reconciliation error for MirrorPeer {}: {}", pairing.name_any(), error);
    requeue_action(error, ctx.engine.config())
}
