// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret store operations with the idempotency rules of the synchronizer

use crate::error::Result;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{DeleteParams, ListParams, PostParams},
    Api, ResourceExt,
};
use tracing::{debug, info, instrument};

/// Outcome of delivering a secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Created,
    /// The name already exists; deterministic naming makes it the same object
    AlreadyExists,
    Updated,
    Unchanged,
}

/// List secrets matching a label selector
pub async fn list_secrets(api: &Api<Secret>, selector: &str) -> Result<Vec<Secret>> {
    let list = api.list(&ListParams::default().labels(selector)).await?;
    Ok(list.items)
}

/// Create a secret, treating AlreadyExists as success
#[instrument(skip(api, secret), fields(secret = %secret.name_any()))]
pub async fn create_if_absent(api: &Api<Secret>, secret: &Secret) -> Result<Delivery> {
    match api.create(&PostParams::default(), secret).await {
        Ok(_) => {
            info!("Created secret {}", secret.name_any());
            Ok(Delivery::Created)
        }
        Err(kube::Error::Api(err)) if err.code == 409 && err.reason == "AlreadyExists" => {
            debug!("Secret {} already exists, not creating again", secret.name_any());
            Ok(Delivery::AlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// Create a secret, or update the existing one in place when its payload
/// or labels drifted from the derived secret
#[instrument(skip(api, secret), fields(secret = %secret.name_any()))]
pub async fn create_or_refresh(api: &Api<Secret>, secret: &Secret) -> Result<Delivery> {
    if create_if_absent(api, secret).await? == Delivery::Created {
        return Ok(Delivery::Created);
    }

    let name = secret.name_any();
    let mut existing = api.get(&name).await?;
    if existing.data == secret.data && existing.metadata.labels == secret.metadata.labels {
        debug!("Secret {} is up to date", name);
        return Ok(Delivery::Unchanged);
    }

    existing.data = secret.data.clone();
    existing.metadata.labels = secret.metadata.labels.clone();
    existing.type_ = secret.type_.clone();
    // resourceVersion is kept so a concurrent writer surfaces as a Conflict
    api.replace(&name, &PostParams::default(), &existing).await?;
    info!("Updated secret {}", name);
    Ok(Delivery::Updated)
}

/// Delete a secret, treating NotFound as success. Returns whether it existed.
#[instrument(skip(api))]
pub async fn delete_if_present(api: &Api<Secret>, name: &str) -> Result<bool> {
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(false),
        Err(e) => Err(e.into()),
    }
}
