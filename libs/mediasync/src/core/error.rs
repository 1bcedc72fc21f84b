// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

use crate::core::endpoints::EndpointError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to subscribe to {endpoint} event '{event}': {source}")]
    Subscribe {
        endpoint: &'static str,
        event: &'static str,
        #[source]
        source: EndpointError,
    },

    #[error("No tokio runtime available to drive the connector")]
    NoRuntime,

    #[error("Malformed vector: {0}")]
    MalformedVector(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
