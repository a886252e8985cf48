// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Mirrors each member's source secret into its siblings and sweeps
//! mirrors no live pairing justifies any more.
//!
//! Failures while delivering are isolated per member; the sweep only runs
//! after a delivery pass without any failure, so a mirror whose delivery
//! merely failed is never taken for an orphan.

use crate::config::Config;
use crate::constants::{labels, OPERATOR_NAME};
use crate::error::{Result, SyncError};
use crate::kubernetes::secrets::{
    create_if_absent, create_or_refresh, delete_if_present, list_secrets, Delivery,
};
use crate::sync::directory::{validate_managed_clusters, PairingDirectory};
use crate::sync::matcher::find_match;
use crate::sync::transcoder::{derive_mirror, mirror_name, s3_profile_name};
use crate::types::{MirrorPeer, OwnedSecret, PeerRef};
use futures::future::join_all;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client, ResourceExt};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// How existing destination secrets are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Create only; an existing secret under the derived name is left alone
    CreateOnly,
    /// Create, or update in place when the derived payload changed
    Refresh,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Storage client pairing, nothing was done
    pub skipped: bool,
    /// Mirrors created or updated
    pub written: usize,
    /// Mirrors that were already in place
    pub unchanged: usize,
    /// Orphans deleted by the sweep
    pub removed: usize,
}

pub fn source_selector() -> String {
    format!("{}={}", labels::SECRET_TYPE, labels::SOURCE)
}

pub fn owned_selector() -> String {
    format!("{}={}", labels::CREATED_BY, OPERATOR_NAME)
}

pub struct SyncEngine {
    client: Client,
    config: Config,
    /// Deliveries share it; a sweep holds it exclusively while it decides
    /// and deletes across all hub namespaces
    delivery_lock: RwLock<()>,
}

impl SyncEngine {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            config,
            delivery_lock: RwLock::new(()),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate against `directory`, deliver every member's mirrors, then
    /// sweep orphans
    #[instrument(skip(self, pairing, directory), fields(mirror_peer = %pairing.name_any()))]
    pub async fn sync_pairing(
        &self,
        pairing: &MirrorPeer,
        directory: &PairingDirectory,
        mode: DeliveryMode,
    ) -> Result<SyncReport> {
        directory.validate_pairing(pairing)?;
        validate_managed_clusters(&self.client, pairing).await?;
        debug!("All validations for MirrorPeer passed");

        if pairing.is_storage_client_type() {
            info!("MirrorPeer references a storage client, no secrets to mirror");
            return Ok(SyncReport {
                skipped: true,
                ..Default::default()
            });
        }

        let results = join_all(
            pairing
                .spec
                .items
                .iter()
                .map(|peer| self.sync_member(pairing, peer, mode)),
        )
        .await;

        let mut report = SyncReport::default();
        let mut errors = Vec::new();
        for (peer, result) in pairing.spec.items.iter().zip(results) {
            match result {
                Ok(deliveries) => {
                    for delivery in deliveries {
                        match delivery {
                            Delivery::Created | Delivery::Updated => report.written += 1,
                            Delivery::AlreadyExists | Delivery::Unchanged => report.unchanged += 1,
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to sync secrets of cluster {}: {}", peer.cluster_name, e);
                    errors.push(format!("{}: {}", peer.cluster_name, e));
                }
            }
        }

        if !errors.is_empty() {
            return Err(SyncError::MemberSync(errors));
        }

        report.removed = self.sweep(None).await?;
        info!(
            "Synced MirrorPeer: {} written, {} unchanged, {} orphans removed",
            report.written, report.unchanged, report.removed
        );
        Ok(report)
    }

    async fn sync_member(
        &self,
        pairing: &MirrorPeer,
        peer: &PeerRef,
        mode: DeliveryMode,
    ) -> Result<Vec<Delivery>> {
        match timeout(self.config.member_timeout, self.deliver_member(pairing, peer, mode)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(format!(
                "syncing secrets of cluster {} took longer than {:?}",
                peer.cluster_name, self.config.member_timeout
            ))),
        }
    }

    /// Match `peer`'s source secret and deliver its mirror to each sibling
    #[instrument(skip(self, pairing, peer, mode), fields(cluster = %peer.cluster_name))]
    async fn deliver_member(
        &self,
        pairing: &MirrorPeer,
        peer: &PeerRef,
        mode: DeliveryMode,
    ) -> Result<Vec<Delivery>> {
        let _delivering = self.delivery_lock.read().await;
        let sources: Api<Secret> = Api::namespaced(self.client.clone(), &peer.cluster_name);
        let candidates = list_secrets(&sources, &source_selector()).await?;

        let Some(source) = find_match(peer, &candidates) else {
            debug!("No source secret yet for cluster {}", peer.cluster_name);
            return Ok(Vec::new());
        };

        let mut deliveries = Vec::new();
        for sibling in pairing
            .spec
            .items
            .iter()
            .filter(|s| s.cluster_name != peer.cluster_name)
        {
            let mirror = derive_mirror(source, peer, &sibling.cluster_name)?;
            let destination: Api<Secret> =
                Api::namespaced(self.client.clone(), &sibling.cluster_name);

            let delivery = match mode {
                DeliveryMode::CreateOnly => create_if_absent(&destination, &mirror).await?,
                DeliveryMode::Refresh => create_or_refresh(&destination, &mirror).await?,
            };
            debug!(
                "Mirror {}/{} of {}: {:?}",
                sibling.cluster_name,
                mirror.name_any(),
                source.name_any(),
                delivery
            );
            deliveries.push(delivery);
        }

        Ok(deliveries)
    }

    /// Delete every owned secret no live pairing justifies. Failing deletes
    /// do not stop the sweep; they are reported together at the end.
    ///
    /// Pairings are listed only after all deliveries are locked out, so a
    /// pairing created while this sweep waited still justifies its mirrors.
    /// `excluding` names a pairing whose deletion is being finalized.
    #[instrument(skip(self))]
    pub async fn sweep(&self, excluding: Option<&str>) -> Result<usize> {
        let _guard = self.delivery_lock.write().await;

        let loaded = PairingDirectory::load(&self.client).await?;
        let directory = match excluding {
            Some(name) => PairingDirectory::from_pairings(
                loaded
                    .pairings()
                    .iter()
                    .filter(|p| p.name_any() != name)
                    .cloned()
                    .collect(),
            ),
            None => loaded,
        };

        let all: Api<Secret> = Api::all(self.client.clone());
        let owned = list_secrets(&all, &owned_selector()).await?;
        let sources = list_secrets(&all, &source_selector()).await?;

        let mut removed = 0;
        let mut failures = Vec::new();
        for secret in &owned {
            let Some(tagged) = OwnedSecret::from_secret(secret) else {
                continue;
            };
            if is_justified(&tagged, &directory, &sources) {
                continue;
            }

            let api: Api<Secret> = Api::namespaced(self.client.clone(), tagged.namespace());
            match delete_if_present(&api, tagged.name()).await {
                Ok(true) => {
                    info!("Deleted orphaned secret {}/{}", tagged.namespace(), tagged.name());
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        "Failed to delete orphaned secret {}/{}: {}",
                        tagged.namespace(),
                        tagged.name(),
                        e
                    );
                    failures.push(format!("{}/{}: {}", tagged.namespace(), tagged.name(), e));
                }
            }
        }

        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(SyncError::Sweep(failures))
        }
    }
}

/// Whether a live pairing still accounts for `owned`
pub fn is_justified(owned: &OwnedSecret, directory: &PairingDirectory, sources: &[Secret]) -> bool {
    match owned {
        OwnedSecret::Mirror { namespace, name } => directory
            .pairings_for_cluster(namespace)
            .filter(|p| !p.is_storage_client_type())
            .any(|p| {
                p.spec.items.iter().any(|member| {
                    member.cluster_name != *namespace
                        && mirror_name(member) == *name
                        && find_match(member, sources).is_some()
                })
            }),
        OwnedSecret::S3Profile { namespace, name } => directory
            .pairings_for_cluster(namespace)
            .filter_map(|p| p.peer_for_cluster(namespace))
            .any(|peer| s3_profile_name(peer) == *name),
    }
}
