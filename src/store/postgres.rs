// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::GuildConfigStore;
use crate::database::DbPool;
use crate::model::{GuildConfig, database_id_from_discord_id};
use crate::schema::guild_configs;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use miette::IntoDiagnostic;
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

pub struct PgGuildConfigStore {
	db_connection_pool: DbPool,
}

impl PgGuildConfigStore {
	pub fn new(db_connection_pool: DbPool) -> Self {
		Self { db_connection_pool }
	}
}

#[async_trait]
impl GuildConfigStore for PgGuildConfigStore {
	async fn find_one(&self, guild_id: Id<GuildMarker>) -> miette::Result<Option<GuildConfig>> {
		let mut db_connection = self.db_connection_pool.get().into_diagnostic()?;
		let db_guild_id = database_id_from_discord_id(guild_id.get());
		guild_configs::table
			.find(db_guild_id)
			.select(GuildConfig::as_select())
			.first(&mut db_connection)
			.optional()
			.into_diagnostic()
	}

	async fn save(&self, config: &GuildConfig) -> miette::Result<()> {
		let mut db_connection = self.db_connection_pool.get().into_diagnostic()?;
		let mut config = config.clone();
		config.updated_at = Utc::now();
		diesel::insert_into(guild_configs::table)
			.values(&config)
			.on_conflict(guild_configs::guild_id)
			.do_update()
			.set(&config)
			.execute(&mut db_connection)
			.into_diagnostic()?;
		Ok(())
	}
}
