// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{AutocompleteHandler, CommandDefinition, CommandHandler, CommandScope, InteractionHandler};
use std::collections::HashMap;
use std::sync::Arc;
use twilight_model::application::command::Command;

/// A compiled-in command that definition files can refer to by name
pub struct CatalogCommand<E> {
	pub command: Command,
	pub handler: Arc<dyn CommandHandler<E>>,
	pub autocomplete: Option<Arc<dyn AutocompleteHandler<E>>>,
}

impl<E> CatalogCommand<E> {
	/// Builds a registry definition for this command with the given deployment scope.
	pub fn definition(&self, scope: CommandScope) -> CommandDefinition<E> {
		let definition = CommandDefinition::new(self.command.clone(), Arc::clone(&self.handler)).with_scope(scope);
		match &self.autocomplete {
			Some(autocomplete) => definition.with_autocomplete(Arc::clone(autocomplete)),
			None => definition,
		}
	}
}

/// Every handler compiled into the bot, by the name definition files use to refer to it.
///
/// Commands are named by their command name. Interaction handlers have their own names, since the same handler
/// could be mounted under more than one custom ID prefix.
pub struct HandlerCatalog<E> {
	commands: HashMap<String, CatalogCommand<E>>,
	interactions: HashMap<String, Arc<dyn InteractionHandler<E>>>,
}

impl<E> Default for HandlerCatalog<E> {
	fn default() -> Self {
		Self {
			commands: HashMap::new(),
			interactions: HashMap::new(),
		}
	}
}

impl<E> HandlerCatalog<E> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_command(
		&mut self,
		command: Command,
		handler: Arc<dyn CommandHandler<E>>,
		autocomplete: Option<Arc<dyn AutocompleteHandler<E>>>,
	) -> &mut Self {
		self.commands.insert(
			command.name.clone(),
			CatalogCommand {
				command,
				handler,
				autocomplete,
			},
		);
		self
	}

	pub fn add_interaction(&mut self, name: impl Into<String>, handler: Arc<dyn InteractionHandler<E>>) -> &mut Self {
		self.interactions.insert(name.into(), handler);
		self
	}

	pub fn command(&self, name: &str) -> Option<&CatalogCommand<E>> {
		self.commands.get(name)
	}

	pub fn interaction(&self, name: &str) -> Option<&Arc<dyn InteractionHandler<E>>> {
		self.interactions.get(name)
	}
}
