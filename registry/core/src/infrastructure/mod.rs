// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod federation_client;
pub mod repositories;
pub mod search;

pub use federation_client::HttpFederationClient;
