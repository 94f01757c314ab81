// © 2024 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::schema::guild_configs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, RoleMarker};

pub const DEFAULT_SUPPORT_EMOJI: &str = "🎫";
pub const DEFAULT_EMBED_TITLE: &str = "Support";
pub const DEFAULT_EMBED_DESCRIPTION: &str = "Press the button below to open a support ticket.";

/// The support settings for a guild using the bot.
#[derive(AsChangeset, Clone, Debug, Insertable, PartialEq, Queryable, Selectable)]
#[diesel(table_name = guild_configs)]
#[diesel(primary_key(guild_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GuildConfig {
	/// The ID of the guild in question.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_guild_id].
	pub guild_id: i64,
	/// The ID of the role pinged when tickets are opened or reopened.
	/// Ticket features refuse to run until this is set.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_support_role].
	pub support_role: Option<i64>,
	/// The ID of a role added to new ticket threads without being pinged.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_support_other_role].
	pub support_other_role: Option<i64>,
	/// The emoji shown on the "Open Ticket" button, either a unicode emoji or a custom emoji mention.
	pub support_emoji: String,
	/// The title of the embed posted with the "Open Ticket" button.
	pub embed_title: String,
	/// The description of the embed posted with the "Open Ticket" button.
	pub embed_description: String,
	pub updated_at: DateTime<Utc>,
}

impl GuildConfig {
	/// Creates the settings a guild starts with before anything is configured.
	pub fn new(guild_id: Id<GuildMarker>) -> Self {
		Self {
			guild_id: database_id_from_discord_id(guild_id.get()),
			support_role: None,
			support_other_role: None,
			support_emoji: String::from(DEFAULT_SUPPORT_EMOJI),
			embed_title: String::from(DEFAULT_EMBED_TITLE),
			embed_description: String::from(DEFAULT_EMBED_DESCRIPTION),
			updated_at: Utc::now(),
		}
	}

	/// Gets the Discord-facing guild information.
	///
	/// For the raw database representation, use [Self::guild_id].
	pub fn get_guild_id(&self) -> Id<GuildMarker> {
		Id::new(discord_id_from_database_id(self.guild_id))
	}

	/// Gets the support role, if one has been configured.
	///
	/// For the raw database representation, use [Self::support_role].
	pub fn get_support_role(&self) -> Option<Id<RoleMarker>> {
		self.support_role
			.map(|database_id| Id::new(discord_id_from_database_id(database_id)))
	}

	/// Gets the role silently added to new tickets, if one has been configured.
	///
	/// For the raw database representation, use [Self::support_other_role].
	pub fn get_support_other_role(&self) -> Option<Id<RoleMarker>> {
		self.support_other_role
			.map(|database_id| Id::new(discord_id_from_database_id(database_id)))
	}

	pub fn set_support_role(&mut self, role: Id<RoleMarker>) {
		self.support_role = Some(database_id_from_discord_id(role.get()));
	}

	pub fn set_support_other_role(&mut self, role: Id<RoleMarker>) {
		self.support_other_role = Some(database_id_from_discord_id(role.get()));
	}
}

pub fn database_id_from_discord_id(discord_id: u64) -> i64 {
	discord_id as i64
}

pub fn discord_id_from_database_id(database_id: i64) -> u64 {
	database_id as u64
}
