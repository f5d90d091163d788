// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Hibiscus registry core
//!
//! Domain model, federation aggregation and the HTTP surface of a Hibiscus
//! agent registry. The `hibiscus` binary in the `cli` crate wires these
//! pieces together.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain, application services, infrastructure adapters and
//!   the axum router

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
