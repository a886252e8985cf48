// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, hub client creation and secret writes.

pub mod client;
pub mod crd;
pub mod secrets;

pub use client::create_hub_client;
pub use crd::wait_for_mirror_peer_crd;
