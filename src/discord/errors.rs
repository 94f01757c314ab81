// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::Diagnostic;
use std::fmt;

/// Reply sent when a handler fails for reasons the user can't fix
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred handling this interaction.";

/// A problem with how the bot was used, reported back to the user instead of logged.
#[derive(Debug, Diagnostic, Eq, PartialEq)]
pub enum UserError {
	/// The guild has no support settings yet.
	NotConfigured { command_mention: String },
	SupportRoleNotSet { command_mention: String },
	NotTextChannel { channel_mention: String },
	/// The bot lacks permissions it needs in a channel.
	MissingPermissions { channel_mention: String },
	NotTicketThread,
	InvalidEmoji { emoji: String },
	TicketAlreadyClosed,
	TicketAlreadyOpen,
}

impl fmt::Display for UserError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotConfigured { command_mention } => write!(
				f,
				"Support isn't set up on this server yet. Set a support role with {} first.",
				command_mention
			),
			Self::SupportRoleNotSet { command_mention } => {
				write!(f, "Please set a support role using {} first.", command_mention)
			}
			Self::NotTextChannel { channel_mention } => write!(
				f,
				"{} is not a text channel. Please use this command in a text channel or pick one.",
				channel_mention
			),
			Self::MissingPermissions { channel_mention } => write!(
				f,
				"The bot is missing one or more of the following permissions in {}: `Send Messages`, `Send Messages in Threads`, `Manage Threads`, `Create Private Threads`.",
				channel_mention
			),
			Self::NotTicketThread => write!(f, "This button only works in support ticket threads."),
			Self::InvalidEmoji { emoji } => write!(f, "`{}` isn't an emoji that can be used on a button.", emoji),
			Self::TicketAlreadyClosed => write!(f, "This ticket is already closed."),
			Self::TicketAlreadyOpen => write!(f, "This ticket is already open."),
		}
	}
}

impl std::error::Error for UserError {}

/// What to do with an error returned from an interaction handler
#[derive(Debug, Eq, PartialEq)]
pub enum ErrorDisposition {
	/// Tell the user; nothing went wrong on the bot's side.
	Reply(String),
	Internal,
}

pub fn classify(error: &miette::Report) -> ErrorDisposition {
	match error.downcast_ref::<UserError>() {
		Some(user_error) => ErrorDisposition::Reply(user_error.to_string()),
		None => ErrorDisposition::Internal,
	}
}
