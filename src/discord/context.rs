// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::deploy::CommandMentions;
use super::registry::CustomIdRouting;
use crate::store::GuildConfigStore;
use miette::{IntoDiagnostic, bail};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use twilight_http::client::{Client, InteractionClient};
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::application::interaction::message_component::MessageComponentInteractionData;
use twilight_model::application::interaction::modal::ModalInteractionData;
use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::channel::message::component::Component;
use twilight_model::channel::message::{AllowedMentions, Embed, MessageFlags};
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, GuildMarker};
use twilight_model::user::User;
use twilight_util::builder::InteractionResponseDataBuilder;

/// How much of a response Discord has seen for an interaction
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseState {
	/// Nothing has been sent yet.
	Pending,
	/// A "thinking" message is showing and the original response can still be filled in.
	Deferred,
	/// The original response is final; anything else has to be a followup.
	Responded,
}

/// Where a message sent after handler code has run should go
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LateReply {
	Respond,
	EditResponse,
	Followup,
}

impl ResponseState {
	pub fn late_reply(self) -> LateReply {
		match self {
			Self::Pending => LateReply::Respond,
			Self::Deferred => LateReply::EditResponse,
			Self::Responded => LateReply::Followup,
		}
	}
}

/// Tracks the [ResponseState] of one interaction. Only successful requests are recorded.
#[derive(Debug, Default)]
pub struct ResponseTracker(AtomicU8);

impl ResponseTracker {
	const PENDING: u8 = 0;
	const DEFERRED: u8 = 1;
	const RESPONDED: u8 = 2;

	pub fn state(&self) -> ResponseState {
		match self.0.load(Ordering::Acquire) {
			Self::PENDING => ResponseState::Pending,
			Self::DEFERRED => ResponseState::Deferred,
			_ => ResponseState::Responded,
		}
	}

	/// Records an initial response of the given type.
	pub fn responded_with(&self, kind: InteractionResponseType) {
		let state = match kind {
			InteractionResponseType::DeferredChannelMessageWithSource => Self::DEFERRED,
			_ => Self::RESPONDED,
		};
		self.0.store(state, Ordering::Release);
	}

	/// Records that the original response was edited, which replaces any "thinking" message.
	pub fn edited(&self) {
		self.0.store(Self::RESPONDED, Ordering::Release);
	}
}

/// Everything a handler gets for one incoming interaction
pub struct InteractionContext {
	pub interaction: Interaction,
	pub http_client: Arc<Client>,
	pub application_id: Id<ApplicationMarker>,
	pub store: Arc<dyn GuildConfigStore>,
	pub mentions: Arc<CommandMentions>,
	pub routing: CustomIdRouting,
	response: ResponseTracker,
}

impl InteractionContext {
	pub fn new(
		interaction: Interaction,
		http_client: Arc<Client>,
		application_id: Id<ApplicationMarker>,
		store: Arc<dyn GuildConfigStore>,
		mentions: Arc<CommandMentions>,
		routing: CustomIdRouting,
	) -> Self {
		Self {
			interaction,
			http_client,
			application_id,
			store,
			mentions,
			routing,
			response: ResponseTracker::default(),
		}
	}

	pub fn response_state(&self) -> ResponseState {
		self.response.state()
	}

	pub fn interaction_client(&self) -> InteractionClient<'_> {
		self.http_client.interaction(self.application_id)
	}

	pub fn guild_id(&self) -> miette::Result<Id<GuildMarker>> {
		match self.interaction.guild_id {
			Some(guild_id) => Ok(guild_id),
			None => bail!("Guild-only interaction was used outside of a guild"),
		}
	}

	pub fn user(&self) -> miette::Result<&User> {
		match self.interaction.author() {
			Some(user) => Ok(user),
			None => bail!("Interaction has no user"),
		}
	}

	pub fn command_data(&self) -> miette::Result<&CommandData> {
		match &self.interaction.data {
			Some(InteractionData::ApplicationCommand(command_data)) => {
				let command_data: &CommandData = command_data;
				Ok(command_data)
			}
			_ => bail!("Expected application command data for interaction {}", self.interaction.id),
		}
	}

	pub fn component_data(&self) -> miette::Result<&MessageComponentInteractionData> {
		match &self.interaction.data {
			Some(InteractionData::MessageComponent(component_data)) => {
				let component_data: &MessageComponentInteractionData = component_data;
				Ok(component_data)
			}
			_ => bail!("Expected message component data for interaction {}", self.interaction.id),
		}
	}

	pub fn modal_data(&self) -> miette::Result<&ModalInteractionData> {
		match &self.interaction.data {
			Some(InteractionData::ModalSubmit(modal_data)) => {
				let modal_data: &ModalInteractionData = modal_data;
				Ok(modal_data)
			}
			_ => bail!("Expected modal data for interaction {}", self.interaction.id),
		}
	}

	/// Renders a clickable mention for a command path in the current guild.
	pub fn command_mention(&self, command_path: &str) -> String {
		self.mentions.mention(self.interaction.guild_id, command_path)
	}

	pub async fn respond(&self, response: &InteractionResponse) -> miette::Result<()> {
		self.interaction_client()
			.create_response(self.interaction.id, &self.interaction.token, response)
			.await
			.into_diagnostic()?;
		self.response.responded_with(response.kind);
		Ok(())
	}

	/// Sends a visible reply that doesn't ping anyone.
	pub async fn reply(&self, content: impl Into<String>) -> miette::Result<()> {
		let response = InteractionResponseDataBuilder::new()
			.content(content)
			.allowed_mentions(AllowedMentions::default())
			.build();
		self.respond(&InteractionResponse {
			kind: InteractionResponseType::ChannelMessageWithSource,
			data: Some(response),
		})
		.await
	}

	/// Sends a visible reply that pings only what `allowed_mentions` permits.
	pub async fn reply_mentioning(
		&self,
		content: impl Into<String>,
		allowed_mentions: AllowedMentions,
	) -> miette::Result<()> {
		let response = InteractionResponseDataBuilder::new()
			.content(content)
			.allowed_mentions(allowed_mentions)
			.build();
		self.respond(&InteractionResponse {
			kind: InteractionResponseType::ChannelMessageWithSource,
			data: Some(response),
		})
		.await
	}

	pub async fn reply_ephemeral(&self, content: impl Into<String>) -> miette::Result<()> {
		self.reply_ephemeral_with_components(content, Vec::new()).await
	}

	pub async fn reply_ephemeral_with_components(
		&self,
		content: impl Into<String>,
		components: Vec<Component>,
	) -> miette::Result<()> {
		let response = InteractionResponseDataBuilder::new()
			.content(content)
			.components(components)
			.allowed_mentions(AllowedMentions::default())
			.flags(MessageFlags::EPHEMERAL)
			.build();
		self.respond(&InteractionResponse {
			kind: InteractionResponseType::ChannelMessageWithSource,
			data: Some(response),
		})
		.await
	}

	pub async fn reply_ephemeral_embed(&self, content: impl Into<String>, embed: Embed) -> miette::Result<()> {
		let response = InteractionResponseDataBuilder::new()
			.content(content)
			.embeds([embed])
			.allowed_mentions(AllowedMentions::default())
			.flags(MessageFlags::EPHEMERAL)
			.build();
		self.respond(&InteractionResponse {
			kind: InteractionResponseType::ChannelMessageWithSource,
			data: Some(response),
		})
		.await
	}

	/// Acknowledges the interaction with a private "thinking" state, for handlers that need longer than Discord's
	/// response window. Follow up with [Self::edit_reply].
	pub async fn defer_ephemeral(&self) -> miette::Result<()> {
		let response = InteractionResponseDataBuilder::new()
			.flags(MessageFlags::EPHEMERAL)
			.build();
		self.respond(&InteractionResponse {
			kind: InteractionResponseType::DeferredChannelMessageWithSource,
			data: Some(response),
		})
		.await
	}

	pub async fn edit_reply(&self, content: &str) -> miette::Result<()> {
		self.interaction_client()
			.update_response(&self.interaction.token)
			.content(Some(content))
			.await
			.into_diagnostic()?;
		self.response.edited();
		Ok(())
	}

	/// Sends a private message after the original response is final.
	pub async fn followup_ephemeral(&self, content: &str) -> miette::Result<()> {
		self.interaction_client()
			.create_followup(&self.interaction.token)
			.content(content)
			.allowed_mentions(Some(&AllowedMentions::default()))
			.flags(MessageFlags::EPHEMERAL)
			.await
			.into_diagnostic()?;
		Ok(())
	}

	/// Sends a private message however the interaction's response state allows, for replies that can come after a
	/// handler has already acknowledged the interaction.
	pub async fn late_reply_ephemeral(&self, content: &str) -> miette::Result<()> {
		match self.response_state().late_reply() {
			LateReply::Respond => self.reply_ephemeral(content).await,
			LateReply::EditResponse => self.edit_reply(content).await,
			LateReply::Followup => self.followup_ephemeral(content).await,
		}
	}

	pub async fn open_modal(
		&self,
		custom_id: impl Into<String>,
		title: impl Into<String>,
		components: Vec<Component>,
	) -> miette::Result<()> {
		let response = InteractionResponseDataBuilder::new()
			.custom_id(custom_id)
			.title(title)
			.components(components)
			.build();
		self.respond(&InteractionResponse {
			kind: InteractionResponseType::Modal,
			data: Some(response),
		})
		.await
	}
}
