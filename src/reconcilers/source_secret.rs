// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Source secret reconciler - refreshes the mirrors of every pairing whose
//! member produced or rotated a credential.

use crate::error::{Result, SyncError};
use crate::reconcilers::{requeue_action, PairingLocks};
use crate::sync::engine::source_selector;
use crate::sync::matcher::matches_peer;
use crate::sync::{DeliveryMode, PairingDirectory, SyncEngine};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, ResourceExt,
};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

pub struct SourceSecretReconciler {
    engine: Arc<SyncEngine>,
    locks: Arc<PairingLocks>,
}

impl SourceSecretReconciler {
    pub fn new(engine: Arc<SyncEngine>, locks: Arc<PairingLocks>) -> Self {
        Self { engine, locks }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let secrets: Api<Secret> = Api::all(self.engine.client().clone());
        let context = Arc::new(self);

        Controller::new(secrets, watcher::Config::default().labels(&source_selector()))
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled source secret: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Refresh every live pairing in which `secret` is the credential of
    /// its member. Returns the number of pairings synced.
    #[instrument(skip(self, secret), fields(secret = %secret.name_any()))]
    async fn refresh_pairings(&self, secret: &Secret) -> Result<usize> {
        let Some(cluster) = secret.namespace() else {
            return Ok(0);
        };

        let directory = PairingDirectory::load(self.engine.client()).await?;
        let mut synced = 0;
        let mut failure = None;

        for pairing in directory.pairings_for_cluster(&cluster) {
            let name = pairing.name_any();
            if !pairing
                .peer_for_cluster(&cluster)
                .is_some_and(|peer| matches_peer(peer, secret))
            {
                debug!("Secret does not belong to cluster {} in MirrorPeer {}", cluster, name);
                continue;
            }

            let _guard = self.locks.lock(&name).await;
            match self
                .engine
                .sync_pairing(pairing, &directory, DeliveryMode::Refresh)
                .await
            {
                Ok(_) => synced += 1,
                Err(e) if e.is_terminal() => {
                    warn!("Skipping invalid MirrorPeer {}: {}", name, e);
                }
                Err(e) => {
                    warn!("Failed to refresh MirrorPeer {}: {}", name, e);
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(synced),
        }
    }
}

async fn reconcile(secret: Arc<Secret>, ctx: Arc<SourceSecretReconciler>) -> Result<Action> {
    debug!(
        "Reconciling source secret: {}/{}",
        secret.namespace().unwrap_or_default(),
        secret.name_any()
    );
    ctx.refresh_pairings(&secret).await?;
    Ok(Action::await_change())
}

fn error_policy(
    secret: Arc<Secret>,
    error: &SyncError,
    ctx: Arc<SourceSecretReconciler>,
) -> Action {
    error!("Reconciliation error for secret {}: {}", secret.name_any(), error);
    requeue_action(error, ctx.engine.config())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::keys;
    use crate::sync::engine::tests::{
        make_engine, make_hub, make_source, owned_names, peer_a, peer_b, peer_c,
    };
    use crate::sync::transcoder::mirror_name;
    use crate::test_utils::FakeApiServer;
    use crate::types::mirror_peer::tests::make_mirror_peer;

    fn make_reconciler(server: &FakeApiServer) -> SourceSecretReconciler {
        SourceSecretReconciler::new(Arc::new(make_engine(server)), Arc::new(PairingLocks::new()))
    }

    fn mirrored_token(server: &FakeApiServer, namespace: &str, name: &str) -> Vec<u8> {
        server.secret(namespace, name).unwrap().data.unwrap()[keys::SECRET_DATA]
            .0
            .clone()
    }

    #[tokio::test]
    async fn test_rotated_credential_reaches_every_pairing() {
        let server = make_hub();
        server.insert(&make_mirror_peer("p1", vec![peer_a(), peer_b()]));
        server.insert(&make_mirror_peer("p2", vec![peer_a(), peer_c()]));
        let reconciler = make_reconciler(&server);

        let rotated = make_source(&peer_a(), "t1");
        server.insert(&rotated);
        let synced = reconciler.refresh_pairings(&rotated).await.unwrap();

        assert_eq!(synced, 2);
        for namespace in ["clusterB", "clusterC"] {
            assert_eq!(
                mirrored_token(&server, namespace, &mirror_name(&peer_a())),
                br#"{"token":"t1"}"#.to_vec()
            );
        }
    }

    #[tokio::test]
    async fn test_unrelated_secret_syncs_nothing() {
        let server = make_hub();
        server.insert(&make_mirror_peer("p1", vec![peer_a(), peer_b()]));
        let reconciler = make_reconciler(&server);

        let synced = reconciler
            .refresh_pairings(&make_source(&peer_c(), "t0"))
            .await
            .unwrap();

        assert_eq!(synced, 0);
        assert!(owned_names(&server, "clusterB").is_empty());
    }

    #[tokio::test]
    async fn test_invalid_pairing_does_not_block_others() {
        let server = make_hub();
        server.insert(&make_mirror_peer("p1", vec![peer_a(), peer_b()]));
        server.insert(&make_mirror_peer("p2", vec![peer_b(), peer_a()]));
        let reconciler = make_reconciler(&server);

        let synced = reconciler
            .refresh_pairings(&make_source(&peer_a(), "t0"))
            .await
            .unwrap();

        assert_eq!(synced, 1);
        assert_eq!(owned_names(&server, "clusterB"), vec![mirror_name(&peer_a())]);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported() {
        let server = make_hub().fail("POST", "/api/v1/namespaces/clusterB/secrets", 500);
        server.insert(&make_mirror_peer("p1", vec![peer_a(), peer_b()]));
        let reconciler = make_reconciler(&server);

        let err = reconciler
            .refresh_pairings(&make_source(&peer_a(), "t0"))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::MemberSync(_)));
        assert_eq!(
            requeue_action(&err, &crate::config::Config::default()),
            Action::requeue(std::time::Duration::from_secs(60))
        );
    }
}
