// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::modals::TicketSubmission;
use crate::model::GuildConfig;
use twilight_mention::Mention;
use twilight_model::channel::message::Embed;
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::embed::{EmbedAuthorBuilder, EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};

pub const SUPPORT_COLOR: u32 = 0x5865f2;
pub const OPEN_TICKET_COLOR: u32 = 0x57f287;
pub const CLOSED_TICKET_COLOR: u32 = 0xed4245;

const OPEN_FOOTER: &str = "Open";
const CLOSED_FOOTER: &str = "Closed";
const REOPENED_FOOTER: &str = "Reopened";

/// The embed posted above the "Open Ticket" button.
pub fn support_embed(config: &GuildConfig) -> Embed {
	EmbedBuilder::new()
		.title(&config.embed_title)
		.description(&config.embed_description)
		.color(SUPPORT_COLOR)
		.build()
}

pub fn ticket_embed(submission: &TicketSubmission, author_name: &str, created_at: Option<Timestamp>) -> Embed {
	let builder = EmbedBuilder::new()
		.title(submission.subject.trim())
		.description(&submission.body)
		.author(EmbedAuthorBuilder::new(author_name))
		.color(OPEN_TICKET_COLOR)
		.footer(EmbedFooterBuilder::new(OPEN_FOOTER));
	match created_at {
		Some(created_at) => builder.timestamp(created_at).build(),
		None => builder.build(),
	}
}

/// Restyles a ticket message's embed as closed, keeping what the user wrote.
pub fn closed_ticket_embed(existing: Option<&Embed>) -> Embed {
	restyle(existing, CLOSED_TICKET_COLOR, CLOSED_FOOTER)
}

pub fn reopened_ticket_embed(existing: Option<&Embed>) -> Embed {
	restyle(existing, OPEN_TICKET_COLOR, REOPENED_FOOTER)
}

fn restyle(existing: Option<&Embed>, color: u32, footer: &str) -> Embed {
	let mut embed = existing
		.cloned()
		.unwrap_or_else(|| EmbedBuilder::new().title("Support Ticket").build());
	embed.color = Some(color);
	embed.footer = Some(EmbedFooterBuilder::new(footer).build());
	embed
}

/// Summarizes a guild's support settings for `/config support show`.
pub fn settings_embed(config: &GuildConfig) -> Embed {
	let role_text = |role: Option<String>| role.unwrap_or_else(|| String::from("Not set"));
	let support_role = role_text(config.get_support_role().map(|role| role.mention().to_string()));
	let other_role = role_text(config.get_support_other_role().map(|role| role.mention().to_string()));

	EmbedBuilder::new()
		.title("Support Settings")
		.color(SUPPORT_COLOR)
		.field(EmbedFieldBuilder::new("Support Role", support_role).inline())
		.field(EmbedFieldBuilder::new("Other Role", other_role).inline())
		.field(EmbedFieldBuilder::new("Button Emoji", &config.support_emoji).inline())
		.field(EmbedFieldBuilder::new("Embed Title", &config.embed_title))
		.field(EmbedFieldBuilder::new("Embed Description", &config.embed_description))
		.build()
}
