// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::context::InteractionContext;
use super::errors::{ErrorDisposition, INTERNAL_ERROR_MESSAGE, classify};
use super::registry::{CommandRegistry, ComponentRegistry, Dispatch};
use crate::config::ClientOptions;
use twilight_model::application::command::CommandType;
use twilight_model::application::interaction::{InteractionData, InteractionType};
use twilight_model::channel::message::component::ComponentType;

/// The registry an interaction belongs to and the key to look it up by
#[derive(Debug, Eq, PartialEq)]
pub enum Route<'a> {
	Command { kind: CommandType, name: &'a str },
	Autocomplete { name: &'a str },
	Button { custom_id: &'a str },
	SelectMenu { custom_id: &'a str },
	Modal { custom_id: &'a str },
}

impl<'a> Route<'a> {
	/// Works out where an interaction goes. Pings and payloads the bot doesn't handle have no route.
	pub fn for_interaction(kind: InteractionType, data: Option<&'a InteractionData>) -> Option<Self> {
		match (kind, data?) {
			(InteractionType::ApplicationCommand, InteractionData::ApplicationCommand(command_data)) => {
				Some(Self::Command {
					kind: command_data.kind,
					name: &command_data.name,
				})
			}
			(InteractionType::ApplicationCommandAutocomplete, InteractionData::ApplicationCommand(command_data)) => {
				Some(Self::Autocomplete {
					name: &command_data.name,
				})
			}
			(InteractionType::MessageComponent, InteractionData::MessageComponent(component_data)) => {
				let custom_id = component_data.custom_id.as_str();
				match component_data.component_type {
					ComponentType::Button => Some(Self::Button { custom_id }),
					ComponentType::TextSelectMenu
					| ComponentType::UserSelectMenu
					| ComponentType::RoleSelectMenu
					| ComponentType::MentionableSelectMenu
					| ComponentType::ChannelSelectMenu => Some(Self::SelectMenu { custom_id }),
					_ => None,
				}
			}
			(InteractionType::ModalSubmit, InteractionData::ModalSubmit(modal_data)) => Some(Self::Modal {
				custom_id: &modal_data.custom_id,
			}),
			_ => None,
		}
	}
}

/// Hands interactions to the handler registered for them.
///
/// The registries are fixed once the router is built.
pub struct InteractionRouter<E> {
	commands: CommandRegistry<E>,
	components: ComponentRegistry<E>,
	options: ClientOptions,
}

impl<E> InteractionRouter<E> {
	pub fn new(commands: CommandRegistry<E>, components: ComponentRegistry<E>, options: ClientOptions) -> Self {
		Self {
			commands,
			components,
			options,
		}
	}

	pub fn commands(&self) -> &CommandRegistry<E> {
		&self.commands
	}

	pub fn components(&self) -> &ComponentRegistry<E> {
		&self.components
	}

	pub fn options(&self) -> &ClientOptions {
		&self.options
	}

	pub async fn dispatch(&self, route: &Route<'_>, event: &E) -> miette::Result<Dispatch> {
		match *route {
			Route::Command {
				kind: CommandType::ChatInput,
				name,
			} => self.commands.run_chat_command(name, event).await,
			Route::Command {
				kind: CommandType::User,
				name,
			} => self.commands.run_user_context_menu(name, event).await,
			Route::Command {
				kind: CommandType::Message,
				name,
			} => self.commands.run_message_context_menu(name, event).await,
			Route::Command { kind, name } => {
				tracing::debug!(command = name, ?kind, "Received a command of an unknown type");
				Ok(Dispatch::Unhandled)
			}
			Route::Autocomplete { name } => {
				if !self.options.receive_autocomplete {
					return Ok(ignored(route));
				}
				self.commands.run_autocomplete(name, event).await
			}
			Route::Button { custom_id } => {
				if !self.options.receive_message_components {
					return Ok(ignored(route));
				}
				self.components.run_button(custom_id, event).await
			}
			Route::SelectMenu { custom_id } => {
				if !self.options.receive_message_components {
					return Ok(ignored(route));
				}
				self.components.run_select_menu(custom_id, event).await
			}
			Route::Modal { custom_id } => {
				if !self.options.receive_modals {
					return Ok(ignored(route));
				}
				self.components.run_modal(custom_id, event).await
			}
		}
	}
}

fn ignored(route: &Route<'_>) -> Dispatch {
	tracing::debug!(?route, "Interaction category is turned off; ignoring");
	Dispatch::Unhandled
}

impl InteractionRouter<InteractionContext> {
	/// Routes one interaction and deals with whatever error its handler returns.
	pub async fn handle(&self, context: InteractionContext) {
		let Some(route) = Route::for_interaction(context.interaction.kind, context.interaction.data.as_ref()) else {
			tracing::debug!(kind = ?context.interaction.kind, "Ignoring interaction with no route");
			return;
		};

		let error = match self.dispatch(&route, &context).await {
			Ok(_) => return,
			Err(error) => error,
		};

		match classify(&error) {
			ErrorDisposition::Reply(message) => {
				if let Err(reply_error) = context.late_reply_ephemeral(&message).await {
					tracing::error!(source = ?reply_error, "Failed to tell a user about a problem with their interaction");
				}
			}
			ErrorDisposition::Internal => {
				tracing::error!(source = ?error, ?route, "An error occurred handling an interaction");
				if self.options.reply_on_error {
					if let Err(reply_error) = context.late_reply_ephemeral(INTERNAL_ERROR_MESSAGE).await {
						tracing::debug!(source = ?reply_error, "Couldn't send the internal error reply");
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::discord::registry::{
		AutocompleteHandler, CommandDefinition, CommandHandler, CustomIdRouting, InteractionDefinition,
		InteractionHandler,
	};
	use async_trait::async_trait;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use twilight_model::application::interaction::application_command::CommandData;
	use twilight_model::application::interaction::message_component::MessageComponentInteractionData;
	use twilight_model::application::interaction::modal::ModalInteractionData;
	use twilight_util::builder::command::CommandBuilder;

	#[derive(Default)]
	struct Counter {
		calls: AtomicUsize,
	}

	impl Counter {
		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
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
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	#[async_trait]
	impl InteractionHandler<()> for Counter {
		async fn execute(&self, _event: &()) -> miette::Result<()> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	struct Handlers {
		command: Arc<Counter>,
		autocomplete: Arc<Counter>,
		button: Arc<Counter>,
		select_menu: Arc<Counter>,
		modal: Arc<Counter>,
	}

	fn router(options: ClientOptions) -> (InteractionRouter<()>, Handlers) {
		let handlers = Handlers {
			command: Arc::new(Counter::default()),
			autocomplete: Arc::new(Counter::default()),
			button: Arc::new(Counter::default()),
			select_menu: Arc::new(Counter::default()),
			modal: Arc::new(Counter::default()),
		};

		let mut commands = CommandRegistry::new();
		let config = CommandBuilder::new("config", "Configure the bot", CommandType::ChatInput).build();
		commands
			.add(CommandDefinition::new(config, handlers.command.clone()).with_autocomplete(handlers.autocomplete.clone()))
			.unwrap();

		let routing = CustomIdRouting {
			split: options.split_custom_id,
			separator: options.custom_id_separator.clone(),
		};
		let mut components = ComponentRegistry::new(routing);
		components
			.add_button(InteractionDefinition::new("close", handlers.button.clone()))
			.unwrap()
			.add_select_menu(InteractionDefinition::new("topic", handlers.select_menu.clone()))
			.unwrap()
			.add_modal(InteractionDefinition::new("ticket", handlers.modal.clone()))
			.unwrap();

		(InteractionRouter::new(commands, components, options), handlers)
	}

	#[tokio::test]
	async fn routes_reach_their_category() {
		let (router, handlers) = router(ClientOptions::default());

		let routes = [
			Route::Command {
				kind: CommandType::ChatInput,
				name: "config",
			},
			Route::Autocomplete { name: "config" },
			Route::Button { custom_id: "close/1" },
			Route::SelectMenu { custom_id: "topic" },
			Route::Modal { custom_id: "ticket" },
		];
		for route in &routes {
			assert_eq!(router.dispatch(route, &()).await.unwrap(), Dispatch::Handled);
		}
		assert_eq!(handlers.command.calls(), 1);
		assert_eq!(handlers.autocomplete.calls(), 1);
		assert_eq!(handlers.button.calls(), 1);
		assert_eq!(handlers.select_menu.calls(), 1);
		assert_eq!(handlers.modal.calls(), 1);
	}

	#[tokio::test]
	async fn commands_route_by_type() {
		let (router, handlers) = router(ClientOptions::default());
		let route = Route::Command {
			kind: CommandType::User,
			name: "config",
		};
		assert_eq!(router.dispatch(&route, &()).await.unwrap(), Dispatch::Unhandled);
		assert_eq!(handlers.command.calls(), 0);
	}

	#[tokio::test]
	async fn disabled_categories_are_ignored() {
		let options = ClientOptions {
			receive_message_components: false,
			receive_modals: false,
			receive_autocomplete: false,
			..Default::default()
		};
		let (router, handlers) = router(options);

		let routes = [
			Route::Autocomplete { name: "config" },
			Route::Button { custom_id: "close" },
			Route::SelectMenu { custom_id: "topic" },
			Route::Modal { custom_id: "ticket" },
		];
		for route in &routes {
			assert_eq!(router.dispatch(route, &()).await.unwrap(), Dispatch::Unhandled);
		}
		let command = Route::Command {
			kind: CommandType::ChatInput,
			name: "config",
		};
		assert_eq!(router.dispatch(&command, &()).await.unwrap(), Dispatch::Handled);

		assert_eq!(handlers.autocomplete.calls(), 0);
		assert_eq!(handlers.button.calls(), 0);
		assert_eq!(handlers.select_menu.calls(), 0);
		assert_eq!(handlers.modal.calls(), 0);
	}

	#[tokio::test]
	async fn unsplit_custom_ids_must_match_whole() {
		let options = ClientOptions {
			split_custom_id: false,
			..Default::default()
		};
		let (router, handlers) = router(options);
		let route = Route::Button { custom_id: "close/1" };
		assert_eq!(router.dispatch(&route, &()).await.unwrap(), Dispatch::Unhandled);
		let route = Route::Button { custom_id: "close" };
		assert_eq!(router.dispatch(&route, &()).await.unwrap(), Dispatch::Handled);
		assert_eq!(handlers.button.calls(), 1);
	}

	#[test]
	fn routes_come_from_interaction_data() {
		let command_data: CommandData =
			serde_json::from_str(r#"{"id":"1","name":"config","type":1,"options":[]}"#).unwrap();
		let command = InteractionData::ApplicationCommand(command_data.into());
		assert_eq!(
			Route::for_interaction(InteractionType::ApplicationCommand, Some(&command)),
			Some(Route::Command {
				kind: CommandType::ChatInput,
				name: "config"
			})
		);
		assert_eq!(
			Route::for_interaction(InteractionType::ApplicationCommandAutocomplete, Some(&command)),
			Some(Route::Autocomplete { name: "config" })
		);

		let button_data: MessageComponentInteractionData =
			serde_json::from_str(r#"{"custom_id":"close/5","component_type":2,"values":[]}"#).unwrap();
		let button = InteractionData::MessageComponent(button_data.into());
		assert_eq!(
			Route::for_interaction(InteractionType::MessageComponent, Some(&button)),
			Some(Route::Button { custom_id: "close/5" })
		);

		let select_data: MessageComponentInteractionData =
			serde_json::from_str(r#"{"custom_id":"topic","component_type":3,"values":["a"]}"#).unwrap();
		let select = InteractionData::MessageComponent(select_data.into());
		assert_eq!(
			Route::for_interaction(InteractionType::MessageComponent, Some(&select)),
			Some(Route::SelectMenu { custom_id: "topic" })
		);

		let modal_data: ModalInteractionData =
			serde_json::from_str(r#"{"custom_id":"ticket","components":[]}"#).unwrap();
		let modal = InteractionData::ModalSubmit(modal_data.into());
		assert_eq!(
			Route::for_interaction(InteractionType::ModalSubmit, Some(&modal)),
			Some(Route::Modal { custom_id: "ticket" })
		);

		assert_eq!(Route::for_interaction(InteractionType::Ping, None), None);
	}
}
