// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mirror_secret_sync::config::{Config, Role};
use mirror_secret_sync::kubernetes::{create_hub_client, wait_for_mirror_peer_crd};
use mirror_secret_sync::reconcilers::{
    DRPolicyReconciler, MirrorPeerReconciler, PairingLocks, S3SecretReconciler,
    SourceSecretReconciler,
};
use mirror_secret_sync::sync::{S3ProfileSync, SyncEngine};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting mirror-secret-sync operator");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: role={:?}, member_timeout={:?}",
        config.role, config.member_timeout
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    match config.role.clone() {
        Role::Hub => run_hub(client, config).await?,
        Role::Agent {
            spoke_cluster_name,
            hub_kubeconfig,
        } => {
            let hub_client = create_hub_client(&hub_kubeconfig).await?;
            info!("Connected to hub cluster as member {}", spoke_cluster_name);

            let sync = S3ProfileSync::new(client, hub_client, spoke_cluster_name);
            S3SecretReconciler::new(sync, config).run().await?;
        }
    }

    // This should never be reached as reconcilers run forever
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}

async fn run_hub(client: Client, config: Config) -> Result<()> {
    info!("Waiting for MirrorPeer CRD to become available...");
    wait_for_mirror_peer_crd(&client).await?;

    let engine = Arc::new(SyncEngine::new(client, config));
    let locks = Arc::new(PairingLocks::new());

    let mirror_peer_reconciler = MirrorPeerReconciler::new(engine.clone(), locks.clone());
    let source_secret_reconciler = SourceSecretReconciler::new(engine.clone(), locks.clone());
    let dr_policy_reconciler = DRPolicyReconciler::new(engine, locks);

    info!("Starting reconcilers...");

    tokio::try_join!(
        mirror_peer_reconciler.run(),
        source_secret_reconciler.run(),
        dr_policy_reconciler.run()
    )?;

    Ok(())
}
