// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! CLI command implementations.

pub mod config;
pub mod embed;
pub mod simulate;
