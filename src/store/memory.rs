// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::GuildConfigStore;
use crate::model::GuildConfig;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

#[derive(Debug, Default)]
pub struct MemoryGuildConfigStore {
	configs: RwLock<HashMap<Id<GuildMarker>, GuildConfig>>,
}

#[async_trait]
impl GuildConfigStore for MemoryGuildConfigStore {
	async fn find_one(&self, guild_id: Id<GuildMarker>) -> miette::Result<Option<GuildConfig>> {
		let configs = self.configs.read().await;
		Ok(configs.get(&guild_id).cloned())
	}

	async fn save(&self, config: &GuildConfig) -> miette::Result<()> {
		let mut config = config.clone();
		config.updated_at = Utc::now();
		let mut configs = self.configs.write().await;
		configs.insert(config.get_guild_id(), config);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn missing_guild_is_none() {
		let store = MemoryGuildConfigStore::default();
		assert!(store.find_one(Id::new(1)).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn save_replaces_document() {
		let store = MemoryGuildConfigStore::default();
		let guild_id = Id::new(7);
		let mut config = GuildConfig::new(guild_id);
		store.save(&config).await.unwrap();

		config.set_support_role(Id::new(99));
		config.embed_title = String::from("Help desk");
		store.save(&config).await.unwrap();

		let stored = store.find_one(guild_id).await.unwrap().unwrap();
		assert_eq!(stored.get_support_role(), Some(Id::new(99)));
		assert_eq!(stored.embed_title, "Help desk");
		assert!(store.find_one(Id::new(8)).await.unwrap().is_none());
	}
}
