// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bucket secret reconciler - runs on a member cluster and publishes object
//! bucket credentials to the hub as storage profiles.

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::reconcilers::requeue_action;
use crate::sync::s3::is_bucket_claim_secret;
use crate::sync::S3ProfileSync;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, ResourceExt,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct S3SecretReconciler {
    sync: S3ProfileSync,
    config: Config,
}

impl S3SecretReconciler {
    pub fn new(sync: S3ProfileSync, config: Config) -> Self {
        Self { sync, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let secrets: Api<Secret> = Api::all(self.sync.spoke_client().clone());
        let context = Arc::new(self);

        Controller::new(secrets, watcher::Config::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled bucket secret: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(secret: Arc<Secret>, ctx: Arc<S3SecretReconciler>) -> Result<Action> {
    let name = secret.name_any();
    let namespace = secret.namespace().unwrap_or_default();

    if !is_bucket_claim_secret(&secret) {
        return Ok(Action::await_change());
    }

    debug!("Reconciling bucket secret: {}/{}", namespace, name);
    ctx.sync.sync_s3_secret(&name, &namespace).await?;
    Ok(Action::await_change())
}

fn error_policy(secret: Arc<Secret>, error: &SyncError, ctx: Arc<S3SecretReconciler>) -> Action {
    error!("Reconciliation error for secret {}: {}", secret.name_any(), error);
    requeue_action(error, &ctx.config)
}
