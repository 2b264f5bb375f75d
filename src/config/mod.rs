// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod endpoint;

pub use endpoint::{is_valid_name, EndpointConfig, DEFAULT_ENDPOINT_NAME, DEFAULT_STORE_DIR};
