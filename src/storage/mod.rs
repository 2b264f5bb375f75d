// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod endpoint_store;

pub use endpoint_store::{EndpointStore, StoreError, StoreResult};
