// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Hibiscus CLI

pub mod config;
pub mod key;
pub mod migrate;
pub mod peer;

pub use self::config::ConfigCommand;
pub use self::key::KeyCommand;
pub use self::migrate::MigrateCommand;
pub use self::peer::PeerCommand;
