// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use crate::types::MirrorPeer;
use kube::{discovery::Discovery, Client, Resource};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait for the MirrorPeer CRD to become available on the hub.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_mirror_peer_crd(client: &Client) -> Result<()> {
    let api_version = MirrorPeer::api_version(&());
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_mirror_peer_crd_exists(client).await {
            Ok(true) => {
                info!("MirrorPeer CRD ({}) is available", api_version);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "MirrorPeer CRD ({}) not yet available, waiting {} seconds...",
                    api_version, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for MirrorPeer CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        interval = next_interval(interval);
    }
}

fn next_interval(interval: u64) -> u64 {
    (interval * 2).min(POLL_MAX_INTERVAL_SECS)
}

async fn check_mirror_peer_crd_exists(client: &Client) -> Result<bool> {
    let group = MirrorPeer::group(&());
    let version = MirrorPeer::version(&());
    let kind = MirrorPeer::kind(&());

    let discovery = Discovery::new(client.clone())
        .filter(&[group.as_ref()])
        .run()
        .await?;

    let exists = discovery
        .groups()
        .filter(|g| g.name() == group)
        .flat_map(|g| g.recommended_resources())
        .any(|(ar, _)| ar.kind == kind && ar.version == version);
    Ok(exists)
}
