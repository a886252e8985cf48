// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Publishing of object bucket credentials from a member cluster to the hub

use crate::constants::s3;
use crate::error::{Result, SyncError};
use crate::kubernetes::secrets::{create_if_absent, Delivery};
use crate::sync::directory::PairingDirectory;
use crate::sync::transcoder::derive_s3_profile;
use crate::types::Route;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client, ResourceExt};
use tracing::{info, instrument};

/// Whether the secret was generated for an object bucket claim
pub fn is_bucket_claim_secret(secret: &Secret) -> bool {
    secret
        .owner_references()
        .iter()
        .any(|owner| owner.kind == s3::BUCKET_CLAIM_KIND)
}

pub struct S3ProfileSync {
    spoke: Client,
    hub: Client,
    spoke_cluster_name: String,
}

impl S3ProfileSync {
    pub fn new(spoke: Client, hub: Client, spoke_cluster_name: String) -> Self {
        Self {
            spoke,
            hub,
            spoke_cluster_name,
        }
    }

    pub fn spoke_client(&self) -> &Client {
        &self.spoke
    }

    /// Derive the object storage profile for the bucket claim `name` in
    /// `namespace` and create it on the hub
    #[instrument(skip(self), fields(cluster = %self.spoke_cluster_name))]
    pub async fn sync_s3_secret(&self, name: &str, namespace: &str) -> Result<Delivery> {
        let secrets: Api<Secret> = Api::namespaced(self.spoke.clone(), namespace);
        let bucket_secret = secrets.get(name).await?;

        let config_maps: Api<ConfigMap> = Api::namespaced(self.spoke.clone(), namespace);
        let bucket_config = config_maps.get(name).await?;

        let directory = PairingDirectory::load(&self.hub).await?;
        let storage_ref = directory
            .resolve_storage_ref(&self.spoke_cluster_name)?
            .clone();

        let routes: Api<Route> = Api::namespaced(self.spoke.clone(), &storage_ref.namespace);
        let route = routes.get(s3::ROUTE_NAME).await?;
        if route.spec.host.is_empty() {
            return Err(SyncError::NotFound(format!(
                "route {}/{} has no host yet",
                storage_ref.namespace,
                s3::ROUTE_NAME
            )));
        }

        let profile = derive_s3_profile(
            &bucket_secret,
            &bucket_config,
            &route.spec.host,
            &storage_ref,
            &self.spoke_cluster_name,
        )?;

        let hub_secrets: Api<Secret> = Api::namespaced(self.hub.clone(), &self.spoke_cluster_name);
        let delivery = create_if_absent(&hub_secrets, &profile).await?;
        info!(
            "Synced bucket secret {}/{} to hub as {}/{} ({:?})",
            namespace,
            name,
            self.spoke_cluster_name,
            profile.name_any(),
            delivery
        );
        Ok(delivery)
    }
}
