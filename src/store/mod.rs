// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ConfigData;
use crate::database::{connect_db, run_embedded_migrations};
use crate::model::GuildConfig;
use async_trait::async_trait;
use std::sync::Arc;
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

mod memory;
mod postgres;

pub use memory::MemoryGuildConfigStore;
pub use postgres::PgGuildConfigStore;

/// Persistence for per-guild support settings.
///
/// Callers read, modify, and save whole documents. Nothing guards against two concurrent edits of the same guild;
/// the later save wins.
#[async_trait]
pub trait GuildConfigStore: Send + Sync {
	/// Gets the settings for a guild, or `None` if the guild was never configured.
	async fn find_one(&self, guild_id: Id<GuildMarker>) -> miette::Result<Option<GuildConfig>>;

	/// Creates or fully replaces the settings document for the config's guild.
	async fn save(&self, config: &GuildConfig) -> miette::Result<()>;
}

/// Opens the configured database (running any pending migrations), falling back to in-memory storage when no
/// database is configured.
pub fn open_store(config: &ConfigData) -> miette::Result<Arc<dyn GuildConfigStore>> {
	match &config.database {
		Some(db_config) => {
			let db_connection_pool = connect_db(db_config)?;
			run_embedded_migrations(&db_connection_pool)?;
			Ok(Arc::new(PgGuildConfigStore::new(db_connection_pool)))
		}
		None => {
			tracing::warn!("No database configured; guild settings will be lost when the bot stops");
			Ok(Arc::new(MemoryGuildConfigStore::default()))
		}
	}
}
