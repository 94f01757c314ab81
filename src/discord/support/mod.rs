// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Support tickets: a per-guild support message whose button opens a private thread for each ticket.

use super::context::InteractionContext;
use super::deploy::CommandMentions;
use super::errors::UserError;
use super::registry::HandlerCatalog;
use crate::model::GuildConfig;
use crate::store::GuildConfigStore;
use std::sync::Arc;
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

mod components;
mod config_command;
mod embeds;
mod modals;
mod state;
mod tickets;

/// Adds every support handler to the catalog under the names definition files use.
pub fn register_handlers(catalog: &mut HandlerCatalog<InteractionContext>) {
	catalog
		.add_command(
			config_command::command_definition(),
			Arc::new(config_command::ConfigCommand),
			Some(Arc::new(config_command::EmojiAutocomplete)),
		)
		.add_interaction("open_ticket_modal", Arc::new(tickets::OpenTicketButton))
		.add_interaction("create_ticket", Arc::new(tickets::CreateTicketModal))
		.add_interaction("close_ticket", Arc::new(tickets::CloseTicketButton))
		.add_interaction("reopen_ticket", Arc::new(tickets::ReopenTicketButton))
		.add_interaction("update_support_embed", Arc::new(config_command::UpdateEmbedModal));
}

/// Gets a guild's support settings, failing with a user-facing error when the guild hasn't been set up.
pub async fn require_config(
	store: &dyn GuildConfigStore,
	mentions: &CommandMentions,
	guild_id: Id<GuildMarker>,
) -> miette::Result<GuildConfig> {
	match store.find_one(guild_id).await? {
		Some(config) => Ok(config),
		None => Err(UserError::NotConfigured {
			command_mention: mentions.mention(Some(guild_id), "config support role"),
		}
		.into()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::discord::errors::{ErrorDisposition, classify};
	use crate::discord::loader::{load_commands, load_interactions};
	use crate::store::MemoryGuildConfigStore;
	use std::path::{Path, PathBuf};

	fn definitions_dir(category: &str) -> PathBuf {
		Path::new(env!("CARGO_MANIFEST_DIR")).join("definitions").join(category)
	}

	#[tokio::test]
	async fn unconfigured_guilds_get_a_reply() {
		let store = MemoryGuildConfigStore::default();
		let mentions = CommandMentions::default();
		let guild_id = Id::new(1);

		let error = require_config(&store, &mentions, guild_id).await.unwrap_err();
		let ErrorDisposition::Reply(reply) = classify(&error) else {
			panic!("expected a reply for {:?}", error);
		};
		assert!(reply.contains("`/config support role`"));

		store.save(&GuildConfig::new(guild_id)).await.unwrap();
		let config = require_config(&store, &mentions, guild_id).await.unwrap();
		assert_eq!(config.get_guild_id(), guild_id);
	}

	#[tokio::test]
	async fn shipped_definitions_match_the_handlers() {
		let mut catalog = HandlerCatalog::new();
		register_handlers(&mut catalog);

		let commands = load_commands(Some(definitions_dir("commands").as_path()), &catalog).await.unwrap();
		assert!(commands.errors.is_empty());
		let names: Vec<&str> = commands.definitions.iter().map(|definition| definition.name()).collect();
		assert_eq!(names, vec!["config"]);
		assert!(commands.definitions[0].has_autocomplete());

		let buttons = load_interactions(Some(definitions_dir("buttons").as_path()), &catalog).await.unwrap();
		assert!(buttons.errors.is_empty());
		let mut prefixes: Vec<&str> = buttons
			.definitions
			.iter()
			.map(|definition| definition.custom_id_prefix())
			.collect();
		prefixes.sort_unstable();
		assert_eq!(
			prefixes,
			vec![
				components::CLOSE_TICKET_BUTTON,
				components::REOPEN_TICKET_BUTTON,
				components::OPEN_TICKET_BUTTON
			]
		);

		let modal_definitions = load_interactions(Some(definitions_dir("modals").as_path()), &catalog).await.unwrap();
		assert!(modal_definitions.errors.is_empty());
		let mut prefixes: Vec<&str> = modal_definitions
			.definitions
			.iter()
			.map(|definition| definition.custom_id_prefix())
			.collect();
		prefixes.sort_unstable();
		assert_eq!(prefixes, vec![modals::EMBED_MODAL, modals::TICKET_MODAL]);
	}
}
