// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::embeds::{closed_ticket_embed, reopened_ticket_embed, ticket_embed};
use super::modals::{TICKET_MODAL, TicketSubmission, ticket_modal_components};
use super::require_config;
use super::state::TicketState;
use crate::discord::context::InteractionContext;
use crate::discord::errors::UserError;
use crate::discord::registry::InteractionHandler;
use crate::discord::utils::timestamp::timestamp_from_id;
use crate::discord::utils::users::member_display_name;
use async_trait::async_trait;
use miette::{IntoDiagnostic, bail};
use twilight_mention::Mention;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::component::Component;
use twilight_model::channel::message::{AllowedMentions, Embed};
use twilight_model::channel::thread::AutoArchiveDuration;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker, RoleMarker, UserMarker};

/// Opens the ticket form from the support message's button.
pub struct OpenTicketButton;

#[async_trait]
impl InteractionHandler<InteractionContext> for OpenTicketButton {
	async fn execute(&self, context: &InteractionContext) -> miette::Result<()> {
		context
			.open_modal(TICKET_MODAL, "Create a Ticket", ticket_modal_components())
			.await
	}
}

/// Turns a submitted ticket form into a private thread.
pub struct CreateTicketModal;

#[async_trait]
impl InteractionHandler<InteractionContext> for CreateTicketModal {
	async fn execute(&self, context: &InteractionContext) -> miette::Result<()> {
		let guild_id = context.guild_id()?;
		let user = context.user()?;
		let submission = TicketSubmission::from_modal(context.modal_data()?)?;

		let config = require_config(context.store.as_ref(), &context.mentions, guild_id).await?;
		let Some(support_role) = config.get_support_role() else {
			return Err(UserError::SupportRoleNotSet {
				command_mention: context.command_mention("config support role"),
			}
			.into());
		};
		let Some(channel) = context.interaction.channel.as_ref() else {
			bail!("Ticket modal was submitted without a channel");
		};

		context.defer_ephemeral().await?;

		let http = &context.http_client;
		let thread = http
			.create_thread(channel.id, &submission.thread_name(), ChannelType::PrivateThread)
			.invitable(false)
			.await
			.into_diagnostic()?
			.model()
			.await
			.into_diagnostic()?;
		http.add_thread_member(thread.id, user.id).await.into_diagnostic()?;

		let author_name = member_display_name(context.interaction.member.as_ref(), user);
		let created_at = timestamp_from_id(context.interaction.id).ok();
		let embed = ticket_embed(&submission, &author_name, created_at);
		let content = ticket_message_content(user.id, support_role);
		let allowed_mentions = ticket_allowed_mentions(user.id, support_role);
		let message = http
			.create_message(thread.id)
			.content(&content)
			.embeds(&[embed])
			.components(&TicketState::Open.components())
			.allowed_mentions(Some(&allowed_mentions))
			.await
			.into_diagnostic()?
			.model()
			.await
			.into_diagnostic()?;

		if let Some(other_role) = config.get_support_other_role() {
			// Edits don't notify, so this brings the role into the thread without a ping.
			let content = format!("{} {}", content, other_role.mention());
			http.update_message(thread.id, message.id)
				.content(Some(content.as_str()))
				.await
				.into_diagnostic()?;
		}

		tracing::info!(
			guild = guild_id.get(),
			thread = thread.id.get(),
			user = user.id.get(),
			"Opened a support ticket"
		);
		context
			.edit_reply(&format!("Your ticket has been created: {}", thread.id.mention()))
			.await
	}
}

fn ticket_message_content(user_id: Id<UserMarker>, support_role: Id<RoleMarker>) -> String {
	format!("{} {}", user_id.mention(), support_role.mention())
}

fn ticket_allowed_mentions(user_id: Id<UserMarker>, support_role: Id<RoleMarker>) -> AllowedMentions {
	AllowedMentions {
		roles: vec![support_role],
		users: vec![user_id],
		..Default::default()
	}
}

/// The ticket message a close or reopen button was pressed on
pub struct Ticket<'a> {
	pub thread: Id<ChannelMarker>,
	pub message: Id<MessageMarker>,
	pub embed: Option<&'a Embed>,
	pub state: TicketState,
}

impl<'a> Ticket<'a> {
	/// Gets the ticket a button was pressed in, failing for buttons outside a ticket thread.
	fn from_interaction(context: &'a InteractionContext) -> Result<Self, UserError> {
		let (Some(channel), Some(message)) = (context.interaction.channel.as_ref(), context.interaction.message.as_ref())
		else {
			return Err(UserError::NotTicketThread);
		};
		if !channel.kind.is_thread() {
			return Err(UserError::NotTicketThread);
		}
		let Some(state) = TicketState::from_components(&message.components, &context.routing) else {
			return Err(UserError::NotTicketThread);
		};
		Ok(Self {
			thread: channel.id,
			message: message.id,
			embed: message.embeds.first(),
			state,
		})
	}
}

/// The Discord requests closing and reopening a ticket makes
#[async_trait]
pub trait TicketActions: Send + Sync {
	/// Responds to the button press in the thread.
	async fn send_reply(&self, content: String, allowed_mentions: AllowedMentions) -> miette::Result<()>;

	async fn update_ticket_message(
		&self,
		thread: Id<ChannelMarker>,
		message: Id<MessageMarker>,
		embed: Embed,
		components: Vec<Component>,
	) -> miette::Result<()>;

	async fn archive_thread(&self, thread: Id<ChannelMarker>) -> miette::Result<()>;

	async fn unarchive_thread(&self, thread: Id<ChannelMarker>) -> miette::Result<()>;
}

#[async_trait]
impl TicketActions for InteractionContext {
	async fn send_reply(&self, content: String, allowed_mentions: AllowedMentions) -> miette::Result<()> {
		self.reply_mentioning(content, allowed_mentions).await
	}

	async fn update_ticket_message(
		&self,
		thread: Id<ChannelMarker>,
		message: Id<MessageMarker>,
		embed: Embed,
		components: Vec<Component>,
	) -> miette::Result<()> {
		self.http_client
			.update_message(thread, message)
			.embeds(Some(&[embed]))
			.components(Some(components.as_slice()))
			.await
			.into_diagnostic()?;
		Ok(())
	}

	async fn archive_thread(&self, thread: Id<ChannelMarker>) -> miette::Result<()> {
		self.http_client
			.update_thread(thread)
			.auto_archive_duration(AutoArchiveDuration::Day)
			.archived(true)
			.await
			.into_diagnostic()?;
		Ok(())
	}

	async fn unarchive_thread(&self, thread: Id<ChannelMarker>) -> miette::Result<()> {
		self.http_client
			.update_thread(thread)
			.archived(false)
			.await
			.into_diagnostic()?;
		Ok(())
	}
}

/// Replies, swaps the close button for a reopen button, then archives the thread.
pub async fn close_ticket<A: TicketActions + ?Sized>(actions: &A, ticket: &Ticket<'_>) -> miette::Result<()> {
	let state = ticket.state.close()?;
	actions
		.send_reply(String::from("This ticket has been closed."), AllowedMentions::default())
		.await?;
	actions
		.update_ticket_message(
			ticket.thread,
			ticket.message,
			closed_ticket_embed(ticket.embed),
			state.components(),
		)
		.await?;
	actions.archive_thread(ticket.thread).await
}

/// Unarchives the thread before anything else, since archived threads can't be posted in or edited.
pub async fn reopen_ticket<A: TicketActions + ?Sized>(
	actions: &A,
	ticket: &Ticket<'_>,
	support_role: Option<Id<RoleMarker>>,
) -> miette::Result<()> {
	let state = ticket.state.reopen()?;
	actions.unarchive_thread(ticket.thread).await?;

	let (content, allowed_mentions) = match support_role {
		Some(support_role) => (
			format!("{}, this ticket has been reopened.", support_role.mention()),
			AllowedMentions {
				roles: vec![support_role],
				..Default::default()
			},
		),
		None => (String::from("This ticket has been reopened."), AllowedMentions::default()),
	};
	actions.send_reply(content, allowed_mentions).await?;

	actions
		.update_ticket_message(
			ticket.thread,
			ticket.message,
			reopened_ticket_embed(ticket.embed),
			state.components(),
		)
		.await
}

pub struct CloseTicketButton;

#[async_trait]
impl InteractionHandler<InteractionContext> for CloseTicketButton {
	async fn execute(&self, context: &InteractionContext) -> miette::Result<()> {
		let ticket = Ticket::from_interaction(context)?;
		close_ticket(context, &ticket).await?;
		tracing::info!(thread = ticket.thread.get(), "Closed a support ticket");
		Ok(())
	}
}

pub struct ReopenTicketButton;

#[async_trait]
impl InteractionHandler<InteractionContext> for ReopenTicketButton {
	async fn execute(&self, context: &InteractionContext) -> miette::Result<()> {
		let guild_id = context.guild_id()?;
		let ticket = Ticket::from_interaction(context)?;
		ticket.state.reopen()?;

		let config = require_config(context.store.as_ref(), &context.mentions, guild_id).await?;
		reopen_ticket(context, &ticket, config.get_support_role()).await?;
		tracing::info!(thread = ticket.thread.get(), "Reopened a support ticket");
		Ok(())
	}
}
