// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hub cluster client creation for the member cluster agent

use crate::error::{Result, SyncError};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::{info, instrument};

/// Create a client for the hub from the kubeconfig file at `path`
#[instrument]
pub async fn create_hub_client(path: &str) -> Result<Client> {
    info!("Reading hub kubeconfig from '{}'...", path);
    let kubeconfig = tokio::fs::read_to_string(path).await.map_err(|e| {
        SyncError::KubeconfigError(format!("Failed to read kubeconfig {}: {}", path, e))
    })?;
    create_client_from_kubeconfig(&kubeconfig).await
}

/// Create a Kubernetes client from a kubeconfig string
pub async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| SyncError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| SyncError::KubeconfigError(format!("Failed to create config: {}", e)))?;

    Client::try_from(client_config)
        .map_err(|e| SyncError::KubeconfigError(format!("Failed to create client: {}", e)))
}
