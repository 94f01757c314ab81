// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{Dispatch, RegistryError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

#[async_trait]
pub trait CommandHandler<E>: Send + Sync {
	async fn execute(&self, event: &E) -> miette::Result<()>;
}

#[async_trait]
pub trait AutocompleteHandler<E>: Send + Sync {
	async fn autocomplete(&self, event: &E) -> miette::Result<()>;
}

/// Where a command gets deployed
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandScope {
	Global,
	Guilds(Vec<Id<GuildMarker>>),
}

/// A command's builder data bundled with the code that runs it.
pub struct CommandDefinition<E> {
	command: Command,
	scope: CommandScope,
	handler: Arc<dyn CommandHandler<E>>,
	autocomplete: Option<Arc<dyn AutocompleteHandler<E>>>,
}

impl<E> Clone for CommandDefinition<E> {
	fn clone(&self) -> Self {
		Self {
			command: self.command.clone(),
			scope: self.scope.clone(),
			handler: Arc::clone(&self.handler),
			autocomplete: self.autocomplete.clone(),
		}
	}
}

impl<E> CommandDefinition<E> {
	/// Creates a globally deployed definition.
	pub fn new(command: Command, handler: Arc<dyn CommandHandler<E>>) -> Self {
		Self {
			command,
			scope: CommandScope::Global,
			handler,
			autocomplete: None,
		}
	}

	pub fn with_scope(mut self, scope: CommandScope) -> Self {
		self.scope = scope;
		self
	}

	pub fn with_autocomplete(mut self, autocomplete: Arc<dyn AutocompleteHandler<E>>) -> Self {
		self.autocomplete = Some(autocomplete);
		self
	}

	pub fn name(&self) -> &str {
		&self.command.name
	}

	pub fn kind(&self) -> CommandType {
		self.command.kind
	}

	pub fn command(&self) -> &Command {
		&self.command
	}

	pub fn scope(&self) -> &CommandScope {
		&self.scope
	}

	pub fn is_global(&self) -> bool {
		self.scope == CommandScope::Global
	}

	pub fn has_autocomplete(&self) -> bool {
		self.autocomplete.is_some()
	}
}

/// Chat input, user context menu, and message context menu commands, each keyed by command name.
pub struct CommandRegistry<E> {
	chat_commands: HashMap<String, CommandDefinition<E>>,
	user_context_menus: HashMap<String, CommandDefinition<E>>,
	message_context_menus: HashMap<String, CommandDefinition<E>>,
}

impl<E> Default for CommandRegistry<E> {
	fn default() -> Self {
		Self {
			chat_commands: HashMap::new(),
			user_context_menus: HashMap::new(),
			message_context_menus: HashMap::new(),
		}
	}
}

impl<E> CommandRegistry<E> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a command to the table matching its type. A command with the same name already in that table is
	/// replaced.
	pub fn add(&mut self, definition: CommandDefinition<E>) -> Result<&mut Self, RegistryError> {
		validate_command(&definition)?;
		let table = match definition.kind() {
			CommandType::ChatInput => &mut self.chat_commands,
			CommandType::User => &mut self.user_context_menus,
			CommandType::Message => &mut self.message_context_menus,
			kind => {
				return Err(RegistryError::UnsupportedType {
					name: definition.name().to_string(),
					kind,
				});
			}
		};
		table.insert(definition.name().to_string(), definition);
		Ok(self)
	}

	/// Adds each chat input command, rejecting any that are of another type.
	///
	/// Rejected definitions are logged and returned; they don't stop the rest from being added.
	pub fn add_chat_commands(
		&mut self,
		definitions: impl IntoIterator<Item = CommandDefinition<E>>,
	) -> Vec<RegistryError> {
		self.add_all(definitions, "chat input", |kind| kind == CommandType::ChatInput)
	}

	pub fn add_user_context_menus(
		&mut self,
		definitions: impl IntoIterator<Item = CommandDefinition<E>>,
	) -> Vec<RegistryError> {
		self.add_all(definitions, "user context menu", |kind| kind == CommandType::User)
	}

	pub fn add_message_context_menus(
		&mut self,
		definitions: impl IntoIterator<Item = CommandDefinition<E>>,
	) -> Vec<RegistryError> {
		self.add_all(definitions, "message context menu", |kind| kind == CommandType::Message)
	}

	/// Adds a mix of user and message context menus, each to its own table.
	pub fn add_context_menus(
		&mut self,
		definitions: impl IntoIterator<Item = CommandDefinition<E>>,
	) -> Vec<RegistryError> {
		self.add_all(definitions, "context menu", |kind| {
			kind == CommandType::User || kind == CommandType::Message
		})
	}

	fn add_all(
		&mut self,
		definitions: impl IntoIterator<Item = CommandDefinition<E>>,
		expected: &'static str,
		accepts: impl Fn(CommandType) -> bool,
	) -> Vec<RegistryError> {
		let mut errors = Vec::new();
		for definition in definitions {
			let result = if accepts(definition.kind()) {
				self.add(definition).map(|_| ())
			} else {
				Err(RegistryError::TypeMismatch {
					name: definition.name().to_string(),
					expected,
					found: definition.kind(),
				})
			};
			if let Err(error) = result {
				tracing::error!(source = ?error, "Rejected a command definition");
				errors.push(error);
			}
		}
		errors
	}

	pub fn chat_command(&self, name: &str) -> Option<&CommandDefinition<E>> {
		self.chat_commands.get(name)
	}

	pub fn user_context_menu(&self, name: &str) -> Option<&CommandDefinition<E>> {
		self.user_context_menus.get(name)
	}

	pub fn message_context_menu(&self, name: &str) -> Option<&CommandDefinition<E>> {
		self.message_context_menus.get(name)
	}

	/// Iterates over every registered command regardless of type.
	pub fn commands(&self) -> impl Iterator<Item = &CommandDefinition<E>> {
		self.chat_commands
			.values()
			.chain(self.user_context_menus.values())
			.chain(self.message_context_menus.values())
	}

	pub fn len(&self) -> usize {
		self.chat_commands.len() + self.user_context_menus.len() + self.message_context_menus.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub async fn run_chat_command(&self, name: &str, event: &E) -> miette::Result<Dispatch> {
		run_command(self.chat_commands.get(name), name, event).await
	}

	pub async fn run_user_context_menu(&self, name: &str, event: &E) -> miette::Result<Dispatch> {
		run_command(self.user_context_menus.get(name), name, event).await
	}

	pub async fn run_message_context_menu(&self, name: &str, event: &E) -> miette::Result<Dispatch> {
		run_command(self.message_context_menus.get(name), name, event).await
	}

	/// Runs the autocomplete handler of a chat input command. Commands without one are left unhandled.
	pub async fn run_autocomplete(&self, name: &str, event: &E) -> miette::Result<Dispatch> {
		let autocomplete = self
			.chat_commands
			.get(name)
			.and_then(|definition| definition.autocomplete.as_ref());
		match autocomplete {
			Some(autocomplete) => {
				autocomplete.autocomplete(event).await?;
				Ok(Dispatch::Handled)
			}
			None => {
				tracing::debug!(command = name, "No autocomplete handler for command");
				Ok(Dispatch::Unhandled)
			}
		}
	}
}

async fn run_command<E>(definition: Option<&CommandDefinition<E>>, name: &str, event: &E) -> miette::Result<Dispatch> {
	match definition {
		Some(definition) => {
			definition.handler.execute(event).await?;
			Ok(Dispatch::Handled)
		}
		None => {
			tracing::debug!(command = name, "Received an unknown command");
			Ok(Dispatch::Unhandled)
		}
	}
}

fn validate_command<E>(definition: &CommandDefinition<E>) -> Result<(), RegistryError> {
	twilight_validate::command::command(definition.command()).map_err(|source| RegistryError::Invalid {
		name: definition.name().to_string(),
		source,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use twilight_util::builder::command::CommandBuilder;

	#[derive(Default)]
	struct Counter {
		calls: AtomicUsize,
	}

	#[async_trait]
	impl CommandHandler<()> for Counter {
		async fn execute(&self, _event: &()) -> miette::Result<()> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	#[async_trait]
	impl AutocompleteHandler<()> for Counter {
		async fn autocomplete(&self, _event: &()) -> miette::Result<()> {
			self.calls.fetch_add(10, Ordering::SeqCst);
			Ok(())
		}
	}

	fn chat(name: &str, handler: &Arc<Counter>) -> CommandDefinition<()> {
		let command = CommandBuilder::new(name, "A test command", CommandType::ChatInput).build();
		CommandDefinition::new(command, handler.clone())
	}

	fn user_menu(name: &str, handler: &Arc<Counter>) -> CommandDefinition<()> {
		let command = CommandBuilder::new(name, "", CommandType::User).build();
		CommandDefinition::new(command, handler.clone())
	}

	fn message_menu(name: &str, handler: &Arc<Counter>) -> CommandDefinition<()> {
		let command = CommandBuilder::new(name, "", CommandType::Message).build();
		CommandDefinition::new(command, handler.clone())
	}

	#[test]
	fn add_sorts_by_type() {
		let handler = Arc::new(Counter::default());
		let mut registry = CommandRegistry::new();
		registry
			.add(chat("ping", &handler))
			.unwrap()
			.add(user_menu("Inspect User", &handler))
			.unwrap()
			.add(message_menu("Report Message", &handler))
			.unwrap();

		assert!(registry.chat_command("ping").is_some());
		assert!(registry.user_context_menu("Inspect User").is_some());
		assert!(registry.message_context_menu("Report Message").is_some());
		assert!(registry.chat_command("Inspect User").is_none());
		assert_eq!(registry.len(), 3);
	}

	#[test]
	fn mismatched_type_is_rejected_everywhere() {
		let handler = Arc::new(Counter::default());
		let mut registry = CommandRegistry::new();
		let errors = registry.add_chat_commands([user_menu("Inspect User", &handler), chat("ping", &handler)]);

		assert_eq!(errors.len(), 1);
		assert!(matches!(
			&errors[0],
			RegistryError::TypeMismatch { name, found: CommandType::User, .. } if name == "Inspect User"
		));
		assert!(registry.user_context_menu("Inspect User").is_none());
		assert!(registry.chat_command("Inspect User").is_none());
		assert!(registry.chat_command("ping").is_some());
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn message_menus_are_checked_against_their_own_type() {
		let handler = Arc::new(Counter::default());
		let mut registry = CommandRegistry::new();
		let errors = registry.add_message_context_menus([
			message_menu("Report Message", &handler),
			user_menu("Inspect User", &handler),
		]);
		assert_eq!(errors.len(), 1);
		assert!(registry.message_context_menu("Report Message").is_some());
		assert!(registry.user_context_menu("Inspect User").is_none());
	}

	#[test]
	fn context_menus_split_by_type() {
		let handler = Arc::new(Counter::default());
		let mut registry = CommandRegistry::new();
		let errors = registry.add_context_menus([
			message_menu("Report Message", &handler),
			user_menu("Inspect User", &handler),
			chat("ping", &handler),
		]);
		assert_eq!(errors.len(), 1);
		assert!(registry.message_context_menu("Report Message").is_some());
		assert!(registry.user_context_menu("Inspect User").is_some());
		assert!(registry.chat_command("ping").is_none());
	}

	#[test]
	fn invalid_builder_data_is_rejected() {
		let handler = Arc::new(Counter::default());
		let mut registry = CommandRegistry::new();
		let errors = registry.add_chat_commands([chat("Not Valid", &handler), chat("", &handler)]);
		assert_eq!(errors.len(), 2);
		assert!(errors.iter().all(|error| matches!(error, RegistryError::Invalid { .. })));
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn duplicate_names_keep_the_last() {
		let first = Arc::new(Counter::default());
		let second = Arc::new(Counter::default());
		let mut registry = CommandRegistry::new();
		let errors = registry.add_chat_commands([chat("ping", &first), chat("ping", &second)]);
		assert!(errors.is_empty());
		assert_eq!(registry.len(), 1);

		let dispatch = registry.run_chat_command("ping", &()).await.unwrap();
		assert_eq!(dispatch, Dispatch::Handled);
		assert_eq!(first.calls.load(Ordering::SeqCst), 0);
		assert_eq!(second.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn unknown_names_are_not_dispatched() {
		let handler = Arc::new(Counter::default());
		let mut registry = CommandRegistry::new();
		registry.add(chat("ping", &handler)).unwrap();

		assert_eq!(registry.run_chat_command("pong", &()).await.unwrap(), Dispatch::Unhandled);
		assert_eq!(registry.run_user_context_menu("ping", &()).await.unwrap(), Dispatch::Unhandled);
		assert_eq!(registry.run_message_context_menu("ping", &()).await.unwrap(), Dispatch::Unhandled);
		assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn autocomplete_runs_only_when_present() {
		let handler = Arc::new(Counter::default());
		let mut registry = CommandRegistry::new();
		registry.add(chat("plain", &handler)).unwrap();
		registry
			.add(chat("search", &handler).with_autocomplete(handler.clone()))
			.unwrap();

		assert_eq!(registry.run_autocomplete("plain", &()).await.unwrap(), Dispatch::Unhandled);
		assert_eq!(registry.run_autocomplete("search", &()).await.unwrap(), Dispatch::Handled);
		assert_eq!(handler.calls.load(Ordering::SeqCst), 10);
	}
}
