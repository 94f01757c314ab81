// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Name-keyed lookup tables from commands and component custom IDs to their handlers.
//!
//! The registries are generic over the event type handed to handlers so that routing can be exercised without a
//! live Discord connection. The bot itself uses [crate::discord::context::InteractionContext].

use miette::Diagnostic;
use std::fmt;
use twilight_model::application::command::CommandType;
use twilight_validate::command::CommandValidationError;

mod catalog;
mod commands;
mod components;

pub use catalog::{CatalogCommand, HandlerCatalog};
pub use commands::{AutocompleteHandler, CommandDefinition, CommandHandler, CommandRegistry, CommandScope};
pub use components::{ComponentRegistry, CustomIdRouting, InteractionDefinition, InteractionHandler};

/// Whether a lookup found something to run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dispatch {
	Handled,
	Unhandled,
}

/// A definition that couldn't be added to a registry
#[derive(Debug, Diagnostic)]
pub enum RegistryError {
	/// The command is of a type the bot doesn't route.
	UnsupportedType { name: String, kind: CommandType },
	/// The command was offered to a category that doesn't hold its type.
	TypeMismatch {
		name: String,
		expected: &'static str,
		found: CommandType,
	},
	/// Discord would refuse the command's builder data.
	Invalid {
		name: String,
		source: CommandValidationError,
	},
	EmptyCustomIdPrefix,
	/// The prefix contains the custom ID separator, so split custom IDs could never match it.
	SeparatorInPrefix { prefix: String, separator: String },
}

impl fmt::Display for RegistryError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::UnsupportedType { name, kind } => {
				write!(f, "command `{}` has unsupported type {}", name, command_type_label(*kind))
			}
			Self::TypeMismatch { name, expected, found } => write!(
				f,
				"command `{}` is a {} command, but only {} commands belong here",
				name,
				command_type_label(*found),
				expected
			),
			Self::Invalid { name, source } => write!(f, "command `{}` failed validation: {}", name, source),
			Self::EmptyCustomIdPrefix => write!(f, "interaction custom ID prefix is empty"),
			Self::SeparatorInPrefix { prefix, separator } => write!(
				f,
				"interaction custom ID prefix `{}` contains the separator `{}`",
				prefix, separator
			),
		}
	}
}

impl std::error::Error for RegistryError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Invalid { source, .. } => Some(source),
			_ => None,
		}
	}
}

pub fn command_type_label(kind: CommandType) -> &'static str {
	match kind {
		CommandType::ChatInput => "chat input",
		CommandType::User => "user context menu",
		CommandType::Message => "message context menu",
		_ => "unknown",
	}
}
