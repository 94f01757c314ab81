// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::components::{message_link_row, new_ticket_row, parse_emoji};
use super::embeds::{settings_embed, support_embed};
use super::modals::{EMBED_MODAL, EmbedSubmission, embed_modal_components};
use super::require_config;
use crate::discord::context::InteractionContext;
use crate::discord::errors::UserError;
use crate::discord::registry::{AutocompleteHandler, CommandHandler, InteractionHandler};
use crate::discord::utils::permissions::{channel_permissions, missing_support_permissions};
use crate::model::GuildConfig;
use async_trait::async_trait;
use miette::{IntoDiagnostic, bail};
use twilight_mention::Mention;
use twilight_model::application::command::{Command, CommandOptionChoice, CommandOptionChoiceValue, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{
	CommandData, CommandDataOption, CommandOptionValue,
};
use twilight_model::channel::ChannelType;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker};
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{
	ChannelBuilder, CommandBuilder, RoleBuilder, StringBuilder, SubCommandBuilder, SubCommandGroupBuilder,
};

/// Emoji offered by autocomplete, with the words they can be found by.
const SUGGESTED_EMOJI: &[(&str, &str)] = &[
	("🎫", "ticket"),
	("📩", "envelope with arrow"),
	("📨", "incoming envelope"),
	("❓", "question mark"),
	("🆘", "sos help"),
	("🛠️", "tools"),
	("💬", "speech bubble"),
	("🙋", "raising hand"),
	("🔧", "wrench"),
	("📝", "memo"),
];

/// Discord allows at most this many autocomplete choices.
const MAX_AUTOCOMPLETE_CHOICES: usize = 25;

pub fn command_definition() -> Command {
	let role_subcommand = SubCommandBuilder::new("role", "Sets the role pinged when a ticket is opened").option(
		RoleBuilder::new("role", "The support role")
			.required(true)
			.build(),
	);
	let other_role_subcommand =
		SubCommandBuilder::new("other_role", "Sets a role added to new tickets without a ping").option(
			RoleBuilder::new("role", "The role to add to tickets")
				.required(true)
				.build(),
		);
	let emoji_subcommand = SubCommandBuilder::new("emoji", "Sets the emoji on the Open Ticket button").option(
		StringBuilder::new("emoji", "A unicode emoji or a custom emoji from this server")
			.required(true)
			.autocomplete(true)
			.build(),
	);
	let embed_subcommand = SubCommandBuilder::new("embed", "Edits the text of the support message");
	let send_subcommand = SubCommandBuilder::new("send", "Posts the support message").option(
		ChannelBuilder::new("channel", "The channel to post in; defaults to this one")
			.channel_types([ChannelType::GuildText])
			.build(),
	);
	let show_subcommand = SubCommandBuilder::new("show", "Shows the current support settings");

	let support_group = SubCommandGroupBuilder::new("support", "Support ticket settings")
		.subcommands([
			role_subcommand,
			other_role_subcommand,
			emoji_subcommand,
			embed_subcommand,
			send_subcommand,
			show_subcommand,
		])
		.build();

	CommandBuilder::new("config", "Configure the bot for this server", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::MANAGE_GUILD)
		.option(support_group)
		.build()
}

/// `/config support ...`
pub struct ConfigCommand;

#[async_trait]
impl CommandHandler<InteractionContext> for ConfigCommand {
	async fn execute(&self, context: &InteractionContext) -> miette::Result<()> {
		let command_data = context.command_data()?;
		let (subcommand, options) = support_subcommand(command_data)?;
		match subcommand {
			"role" => set_support_role(context, options).await,
			"other_role" => set_other_role(context, options).await,
			"emoji" => set_emoji(context, options).await,
			"embed" => open_embed_modal(context).await,
			"send" => send_support_message(context, command_data, options).await,
			"show" => show_settings(context).await,
			_ => bail!("Unknown `/config support` subcommand encountered: {}", subcommand),
		}
	}
}

fn support_subcommand(command_data: &CommandData) -> miette::Result<(&str, &[CommandDataOption])> {
	let Some(group) = command_data.options.first() else {
		bail!("Command data is malformed; expected `/config` to have a subcommand group");
	};
	let CommandOptionValue::SubCommandGroup(subcommands) = &group.value else {
		bail!("Command data is malformed; expected `/config {}` to be a subcommand group", group.name);
	};
	if group.name != "support" {
		bail!("Unknown `/config` subcommand group encountered: {}", group.name);
	}
	let Some(subcommand) = subcommands.first() else {
		bail!("Command data is malformed; expected `/config support` to have a subcommand");
	};
	let CommandOptionValue::SubCommand(options) = &subcommand.value else {
		bail!(
			"Command data is malformed; expected `/config support {}` to be a subcommand",
			subcommand.name
		);
	};
	Ok((subcommand.name.as_str(), options))
}

fn role_option(options: &[CommandDataOption]) -> miette::Result<Id<RoleMarker>> {
	for option in options {
		if let ("role", CommandOptionValue::Role(role_id)) = (option.name.as_str(), &option.value) {
			return Ok(*role_id);
		}
	}
	bail!("Command data is malformed; expected a role option: {:?}", options);
}

async fn set_support_role(context: &InteractionContext, options: &[CommandDataOption]) -> miette::Result<()> {
	let guild_id = context.guild_id()?;
	let role_id = role_option(options)?;

	let mut config = context
		.store
		.find_one(guild_id)
		.await?
		.unwrap_or_else(|| GuildConfig::new(guild_id));
	config.set_support_role(role_id);
	context.store.save(&config).await?;

	context
		.reply_ephemeral(format!("{} will now be pinged when tickets are opened.", role_id.mention()))
		.await
}

async fn set_other_role(context: &InteractionContext, options: &[CommandDataOption]) -> miette::Result<()> {
	let guild_id = context.guild_id()?;
	let role_id = role_option(options)?;

	let mut config = require_config(context.store.as_ref(), &context.mentions, guild_id).await?;
	config.set_support_other_role(role_id);
	context.store.save(&config).await?;

	context
		.reply_ephemeral(format!("{} will now be added to new tickets.", role_id.mention()))
		.await
}

async fn set_emoji(context: &InteractionContext, options: &[CommandDataOption]) -> miette::Result<()> {
	let guild_id = context.guild_id()?;
	let Some(CommandOptionValue::String(emoji)) = options
		.iter()
		.find(|option| option.name == "emoji")
		.map(|option| &option.value)
	else {
		bail!("Command data is malformed; expected an emoji option: {:?}", options);
	};
	let emoji = emoji.trim();
	if parse_emoji(emoji).is_none() {
		return Err(UserError::InvalidEmoji {
			emoji: emoji.to_string(),
		}
		.into());
	}

	let mut config = require_config(context.store.as_ref(), &context.mentions, guild_id).await?;
	config.support_emoji = emoji.to_string();
	context.store.save(&config).await?;

	context
		.reply_ephemeral(format!("The Open Ticket button will now show {}.", emoji))
		.await
}

async fn open_embed_modal(context: &InteractionContext) -> miette::Result<()> {
	let guild_id = context.guild_id()?;
	let config = require_config(context.store.as_ref(), &context.mentions, guild_id).await?;
	context
		.open_modal(
			EMBED_MODAL,
			"Support Embed Message",
			embed_modal_components(&config.embed_title, &config.embed_description),
		)
		.await
}

async fn send_support_message(
	context: &InteractionContext,
	command_data: &CommandData,
	options: &[CommandDataOption],
) -> miette::Result<()> {
	let guild_id = context.guild_id()?;
	let config = require_config(context.store.as_ref(), &context.mentions, guild_id).await?;
	if config.get_support_role().is_none() {
		return Err(UserError::SupportRoleNotSet {
			command_mention: context.command_mention("config support role"),
		}
		.into());
	}

	let target = options.iter().find_map(|option| match (option.name.as_str(), &option.value) {
		("channel", CommandOptionValue::Channel(channel_id)) => {
			let kind = command_data
				.resolved
				.as_ref()
				.and_then(|resolved| resolved.channels.get(channel_id))
				.map(|channel| channel.kind);
			Some((*channel_id, kind))
		}
		_ => None,
	});
	let current = context
		.interaction
		.channel
		.as_ref()
		.map(|channel| (channel.id, Some(channel.kind)));
	let channel_id = support_channel(target, current)?;

	let granted = channel_permissions(guild_id, channel_id, &context.http_client).await?;
	if !missing_support_permissions(granted).is_empty() {
		return Err(UserError::MissingPermissions {
			channel_mention: channel_id.mention().to_string(),
		}
		.into());
	}

	let message = context
		.http_client
		.create_message(channel_id)
		.embeds(&[support_embed(&config)])
		.components(&[new_ticket_row(&config.support_emoji)])
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;
	tracing::info!(guild = guild_id.get(), channel = channel_id.get(), "Posted a support message");

	let used_here = current.is_some_and(|(current_id, _)| current_id == channel_id);
	let components = if used_here {
		Vec::new()
	} else {
		vec![message_link_row(guild_id, channel_id, message.id)]
	};
	context
		.reply_ephemeral_with_components("Support message successfully sent.", components)
		.await
}

type ChannelChoice = (Id<ChannelMarker>, Option<ChannelType>);

/// Picks the channel the support message goes to: the chosen channel if there is one, otherwise the channel the
/// command was used in. Either way it has to be a text channel.
fn support_channel(target: Option<ChannelChoice>, current: Option<ChannelChoice>) -> Result<Id<ChannelMarker>, UserError> {
	match target.or(current) {
		Some((channel_id, Some(ChannelType::GuildText))) => Ok(channel_id),
		Some((channel_id, _)) => Err(UserError::NotTextChannel {
			channel_mention: channel_id.mention().to_string(),
		}),
		None => Err(UserError::NotTextChannel {
			channel_mention: String::from("This channel"),
		}),
	}
}

async fn show_settings(context: &InteractionContext) -> miette::Result<()> {
	let guild_id = context.guild_id()?;
	let config = require_config(context.store.as_ref(), &context.mentions, guild_id).await?;
	context.reply_ephemeral_embed("", settings_embed(&config)).await
}

/// Suggests emoji for `/config support emoji`.
pub struct EmojiAutocomplete;

#[async_trait]
impl AutocompleteHandler<InteractionContext> for EmojiAutocomplete {
	async fn autocomplete(&self, context: &InteractionContext) -> miette::Result<()> {
		let command_data = context.command_data()?;
		let (_, options) = support_subcommand(command_data)?;
		let partial = options
			.iter()
			.find_map(|option| match &option.value {
				CommandOptionValue::Focused(value, _) => Some(value.as_str()),
				_ => None,
			})
			.unwrap_or_default();

		let choices = emoji_suggestions(partial)
			.into_iter()
			.map(|(name, value)| CommandOptionChoice {
				name,
				name_localizations: None,
				value: CommandOptionChoiceValue::String(value),
			});
		let response = InteractionResponseDataBuilder::new().choices(choices).build();
		context
			.respond(&InteractionResponse {
				kind: InteractionResponseType::ApplicationCommandAutocompleteResult,
				data: Some(response),
			})
			.await
	}
}

/// Gets `(label, emoji)` choices matching what the user has typed so far. Input that is already a valid emoji is
/// offered first.
fn emoji_suggestions(partial: &str) -> Vec<(String, String)> {
	let partial = partial.trim();
	let search = partial.to_lowercase();
	let mut suggestions = Vec::new();
	if parse_emoji(partial).is_some() {
		suggestions.push((partial.to_string(), partial.to_string()));
	}
	for (emoji, words) in SUGGESTED_EMOJI {
		if *emoji == partial {
			continue;
		}
		if search.is_empty() || words.contains(search.as_str()) {
			suggestions.push((format!("{} {}", emoji, words), emoji.to_string()));
		}
	}
	suggestions.truncate(MAX_AUTOCOMPLETE_CHOICES);
	suggestions
}

/// Saves the support embed text from the embed modal.
pub struct UpdateEmbedModal;

#[async_trait]
impl InteractionHandler<InteractionContext> for UpdateEmbedModal {
	async fn execute(&self, context: &InteractionContext) -> miette::Result<()> {
		let guild_id = context.guild_id()?;
		let submission = EmbedSubmission::from_modal(context.modal_data()?)?;

		let mut config = require_config(context.store.as_ref(), &context.mentions, guild_id).await?;
		config.embed_title = submission.title;
		config.embed_description = submission.description;
		context.store.save(&config).await?;

		let content = format!(
			"Support embed updated. Post it with {}.",
			context.command_mention("config support send")
		);
		context.reply_ephemeral_embed(content, support_embed(&config)).await
	}
}
