// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{Dispatch, RegistryError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait InteractionHandler<E>: Send + Sync {
	async fn execute(&self, event: &E) -> miette::Result<()>;
}

/// A button, select menu, or modal handler, keyed by the leading part of the component's custom ID.
pub struct InteractionDefinition<E> {
	custom_id_prefix: String,
	handler: Arc<dyn InteractionHandler<E>>,
}

impl<E> Clone for InteractionDefinition<E> {
	fn clone(&self) -> Self {
		Self {
			custom_id_prefix: self.custom_id_prefix.clone(),
			handler: Arc::clone(&self.handler),
		}
	}
}

impl<E> InteractionDefinition<E> {
	pub fn new(custom_id_prefix: impl Into<String>, handler: Arc<dyn InteractionHandler<E>>) -> Self {
		Self {
			custom_id_prefix: custom_id_prefix.into(),
			handler,
		}
	}

	pub fn custom_id_prefix(&self) -> &str {
		&self.custom_id_prefix
	}
}

/// How incoming custom IDs map to registry keys
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CustomIdRouting {
	/// When set, only the part of the custom ID before the first separator is used for lookup.
	pub split: bool,
	pub separator: String,
}

impl Default for CustomIdRouting {
	fn default() -> Self {
		Self {
			split: true,
			separator: String::from("/"),
		}
	}
}

impl CustomIdRouting {
	/// Gets the registry key for a custom ID.
	pub fn route_key<'a>(&self, custom_id: &'a str) -> &'a str {
		if !self.split {
			return custom_id;
		}
		custom_id
			.split_once(self.separator.as_str())
			.map_or(custom_id, |(prefix, _)| prefix)
	}
}

/// Buttons, select menus, and modals, each keyed by custom ID prefix.
pub struct ComponentRegistry<E> {
	routing: CustomIdRouting,
	buttons: HashMap<String, InteractionDefinition<E>>,
	select_menus: HashMap<String, InteractionDefinition<E>>,
	modals: HashMap<String, InteractionDefinition<E>>,
}

impl<E> Default for ComponentRegistry<E> {
	fn default() -> Self {
		Self::new(CustomIdRouting::default())
	}
}

impl<E> ComponentRegistry<E> {
	pub fn new(routing: CustomIdRouting) -> Self {
		Self {
			routing,
			buttons: HashMap::new(),
			select_menus: HashMap::new(),
			modals: HashMap::new(),
		}
	}

	pub fn routing(&self) -> &CustomIdRouting {
		&self.routing
	}

	pub fn add_button(&mut self, definition: InteractionDefinition<E>) -> Result<&mut Self, RegistryError> {
		self.validate(&definition)?;
		self.buttons.insert(definition.custom_id_prefix.clone(), definition);
		Ok(self)
	}

	pub fn add_select_menu(&mut self, definition: InteractionDefinition<E>) -> Result<&mut Self, RegistryError> {
		self.validate(&definition)?;
		self.select_menus.insert(definition.custom_id_prefix.clone(), definition);
		Ok(self)
	}

	pub fn add_modal(&mut self, definition: InteractionDefinition<E>) -> Result<&mut Self, RegistryError> {
		self.validate(&definition)?;
		self.modals.insert(definition.custom_id_prefix.clone(), definition);
		Ok(self)
	}

	/// Adds each button, logging and returning the ones that fail validation.
	pub fn add_buttons(&mut self, definitions: impl IntoIterator<Item = InteractionDefinition<E>>) -> Vec<RegistryError> {
		definitions
			.into_iter()
			.filter_map(|definition| self.add_button(definition).err())
			.inspect(|error| tracing::error!(source = ?error, "Rejected a button definition"))
			.collect()
	}

	pub fn add_select_menus(
		&mut self,
		definitions: impl IntoIterator<Item = InteractionDefinition<E>>,
	) -> Vec<RegistryError> {
		definitions
			.into_iter()
			.filter_map(|definition| self.add_select_menu(definition).err())
			.inspect(|error| tracing::error!(source = ?error, "Rejected a select menu definition"))
			.collect()
	}

	pub fn add_modals(&mut self, definitions: impl IntoIterator<Item = InteractionDefinition<E>>) -> Vec<RegistryError> {
		definitions
			.into_iter()
			.filter_map(|definition| self.add_modal(definition).err())
			.inspect(|error| tracing::error!(source = ?error, "Rejected a modal definition"))
			.collect()
	}

	fn validate(&self, definition: &InteractionDefinition<E>) -> Result<(), RegistryError> {
		let prefix = definition.custom_id_prefix();
		if prefix.is_empty() {
			return Err(RegistryError::EmptyCustomIdPrefix);
		}
		if self.routing.split && prefix.contains(self.routing.separator.as_str()) {
			return Err(RegistryError::SeparatorInPrefix {
				prefix: prefix.to_string(),
				separator: self.routing.separator.clone(),
			});
		}
		Ok(())
	}

	pub fn button(&self, prefix: &str) -> Option<&InteractionDefinition<E>> {
		self.buttons.get(prefix)
	}

	pub fn select_menu(&self, prefix: &str) -> Option<&InteractionDefinition<E>> {
		self.select_menus.get(prefix)
	}

	pub fn modal(&self, prefix: &str) -> Option<&InteractionDefinition<E>> {
		self.modals.get(prefix)
	}

	pub fn len(&self) -> usize {
		self.buttons.len() + self.select_menus.len() + self.modals.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub async fn run_button(&self, custom_id: &str, event: &E) -> miette::Result<Dispatch> {
		let key = self.routing.route_key(custom_id);
		run_interaction(self.buttons.get(key), custom_id, event).await
	}

	pub async fn run_select_menu(&self, custom_id: &str, event: &E) -> miette::Result<Dispatch> {
		let key = self.routing.route_key(custom_id);
		run_interaction(self.select_menus.get(key), custom_id, event).await
	}

	pub async fn run_modal(&self, custom_id: &str, event: &E) -> miette::Result<Dispatch> {
		let key = self.routing.route_key(custom_id);
		run_interaction(self.modals.get(key), custom_id, event).await
	}
}

async fn run_interaction<E>(
	definition: Option<&InteractionDefinition<E>>,
	custom_id: &str,
	event: &E,
) -> miette::Result<Dispatch> {
	match definition {
		Some(definition) => {
			definition.handler.execute(event).await?;
			Ok(Dispatch::Handled)
		}
		None => {
			tracing::debug!(custom_id, "Received an interaction with no registered handler");
			Ok(Dispatch::Unhandled)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct Counter {
		calls: AtomicUsize,
	}

	#[async_trait]
	impl InteractionHandler<()> for Counter {
		async fn execute(&self, _event: &()) -> miette::Result<()> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	#[test]
	fn route_key_uses_leading_segment() {
		let routing = CustomIdRouting::default();
		assert_eq!(routing.route_key("close"), "close");
		assert_eq!(routing.route_key("close/123/456"), "close");
		assert_eq!(routing.route_key("close/"), "close");

		let whole = CustomIdRouting {
			split: false,
			separator: String::from("/"),
		};
		assert_eq!(whole.route_key("close/123"), "close/123");

		let underscored = CustomIdRouting {
			split: true,
			separator: String::from("_"),
		};
		assert_eq!(underscored.route_key("close_123/456"), "close");
	}

	#[test]
	fn bad_prefixes_are_rejected_without_stopping_the_batch() {
		let handler = Arc::new(Counter::default());
		let mut registry: ComponentRegistry<()> = ComponentRegistry::default();
		let errors = registry.add_buttons([
			InteractionDefinition::new("", handler.clone()),
			InteractionDefinition::new("ticket/open", handler.clone()),
			InteractionDefinition::new("close", handler.clone()),
		]);
		assert_eq!(errors.len(), 2);
		assert!(matches!(errors[0], RegistryError::EmptyCustomIdPrefix));
		assert!(matches!(errors[1], RegistryError::SeparatorInPrefix { .. }));
		assert!(registry.button("close").is_some());
		assert_eq!(registry.len(), 1);
	}

	#[tokio::test]
	async fn categories_are_independent() {
		let button = Arc::new(Counter::default());
		let modal = Arc::new(Counter::default());
		let mut registry: ComponentRegistry<()> = ComponentRegistry::default();
		registry.add_button(InteractionDefinition::new("ticket", button.clone())).unwrap();
		registry.add_modal(InteractionDefinition::new("ticket", modal.clone())).unwrap();

		assert_eq!(registry.run_modal("ticket", &()).await.unwrap(), Dispatch::Handled);
		assert_eq!(registry.run_select_menu("ticket", &()).await.unwrap(), Dispatch::Unhandled);
		assert_eq!(button.calls.load(Ordering::SeqCst), 0);
		assert_eq!(modal.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn unknown_custom_ids_are_not_dispatched() {
		let handler = Arc::new(Counter::default());
		let mut registry: ComponentRegistry<()> = ComponentRegistry::default();
		registry.add_button(InteractionDefinition::new("close", handler.clone())).unwrap();

		assert_eq!(registry.run_button("reopen/1", &()).await.unwrap(), Dispatch::Unhandled);
		assert_eq!(registry.run_button("closed", &()).await.unwrap(), Dispatch::Unhandled);
		assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

		assert_eq!(registry.run_button("close/1", &()).await.unwrap(), Dispatch::Handled);
		assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
	}
}
