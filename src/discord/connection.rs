// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::context::InteractionContext;
use super::deploy::{self, CommandMentions, HttpDeployer};
use super::loader::{load_commands, load_interactions};
use super::registry::{CommandRegistry, ComponentRegistry, CustomIdRouting, HandlerCatalog};
use super::router::InteractionRouter;
use super::support;
use crate::config::ConfigData;
use crate::store::GuildConfigStore;
use miette::{Diagnostic, bail};
use std::fmt;
use std::sync::Arc;
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt};
use twilight_http::client::Client;
use twilight_http::error::{Error, ErrorType};
use twilight_http::response::DeserializeBodyError;
use twilight_model::gateway::event::Event;
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, GuildMarker};

/// Why the bot couldn't log in
#[derive(Debug, Diagnostic)]
pub enum LoginError {
	/// `login` was called before `init` finished.
	NotInitialized,
	TokenMissing,
	/// Discord rejected the token.
	TokenInvalid,
	Http(Error),
	Deserialize(DeserializeBodyError),
}

impl fmt::Display for LoginError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotInitialized => write!(f, "the bot must be initialized before logging in"),
			Self::TokenMissing => write!(f, "no Discord token was provided"),
			Self::TokenInvalid => write!(f, "Discord rejected the bot token"),
			Self::Http(error) => write!(f, "HTTP error: {}", error),
			Self::Deserialize(error) => write!(f, "deserialization error: {}", error),
		}
	}
}

impl std::error::Error for LoginError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Http(error) => Some(error),
			Self::Deserialize(error) => Some(error),
			_ => None,
		}
	}
}

impl From<Error> for LoginError {
	fn from(error: Error) -> Self {
		if matches!(error.kind(), ErrorType::Unauthorized) {
			Self::TokenInvalid
		} else {
			Self::Http(error)
		}
	}
}

impl From<DeserializeBodyError> for LoginError {
	fn from(error: DeserializeBodyError) -> Self {
		Self::Deserialize(error)
	}
}

/// What a successful login gives us
struct Session {
	token: String,
	http_client: Arc<Client>,
	application_id: Id<ApplicationMarker>,
}

/// The bot from definition loading through to the gateway connection.
///
/// Calls go in order: [Self::init], [Self::login], then any of the deployment calls, then [Self::run].
pub struct SupportBot {
	config: Arc<ConfigData>,
	store: Arc<dyn GuildConfigStore>,
	catalog: HandlerCatalog<InteractionContext>,
	router: Option<Arc<InteractionRouter<InteractionContext>>>,
	session: Option<Session>,
	mentions: Arc<CommandMentions>,
}

impl SupportBot {
	pub fn new(config: Arc<ConfigData>, store: Arc<dyn GuildConfigStore>) -> Self {
		let mut catalog = HandlerCatalog::new();
		support::register_handlers(&mut catalog);
		Self {
			config,
			store,
			catalog,
			router: None,
			session: None,
			mentions: Arc::new(CommandMentions::default()),
		}
	}

	/// Loads every definition category and builds the registries from them.
	pub async fn init(&mut self) -> miette::Result<()> {
		let paths = &self.config.definitions;
		let (commands, context_menus, buttons, select_menus, modals) = tokio::try_join!(
			load_commands(paths.commands.as_deref(), &self.catalog),
			load_commands(paths.context_menus.as_deref(), &self.catalog),
			load_interactions(paths.buttons.as_deref(), &self.catalog),
			load_interactions(paths.select_menus.as_deref(), &self.catalog),
			load_interactions(paths.modals.as_deref(), &self.catalog),
		)?;

		let client_options = self.config.client.clone();
		let routing = CustomIdRouting {
			split: client_options.split_custom_id,
			separator: client_options.custom_id_separator.clone(),
		};

		let mut command_registry = CommandRegistry::new();
		command_registry.add_chat_commands(commands.definitions);
		command_registry.add_context_menus(context_menus.definitions);

		let mut component_registry = ComponentRegistry::new(routing);
		component_registry.add_buttons(buttons.definitions);
		component_registry.add_select_menus(select_menus.definitions);
		component_registry.add_modals(modals.definitions);

		tracing::info!(
			commands = command_registry.len(),
			components = component_registry.len(),
			"Loaded definitions"
		);
		self.router = Some(Arc::new(InteractionRouter::new(
			command_registry,
			component_registry,
			client_options,
		)));
		Ok(())
	}

	/// Checks the token with Discord and looks up the application ID.
	pub async fn login(&mut self) -> Result<(), LoginError> {
		let result = self.try_login().await;
		if let Err(error) = &result {
			tracing::error!(source = ?error, "Failed to log in to Discord");
		}
		result
	}

	async fn try_login(&mut self) -> Result<(), LoginError> {
		if self.router.is_none() {
			return Err(LoginError::NotInitialized);
		}
		let Some(token) = self.config.discord_token.clone() else {
			return Err(LoginError::TokenMissing);
		};

		let http_client = Arc::new(Client::new(token.clone()));
		let application = http_client.current_user_application().await?.model().await?;
		tracing::info!(application = application.id.get(), name = %application.name, "Logged in");

		self.session = Some(Session {
			token,
			http_client,
			application_id: application.id,
		});
		Ok(())
	}

	fn logged_in(&self) -> miette::Result<(&Session, &Arc<InteractionRouter<InteractionContext>>)> {
		match (&self.session, &self.router) {
			(Some(session), Some(router)) => Ok((session, router)),
			_ => bail!("The bot must be logged in first"),
		}
	}

	/// Deploys every command to its scope.
	pub async fn register(&mut self) -> miette::Result<()> {
		let (session, router) = self.logged_in()?;
		let deployer = HttpDeployer::new(Arc::clone(&session.http_client), session.application_id);
		let summary = deploy::register(router.commands(), &deployer).await;
		self.mentions = Arc::new(summary.mentions());
		Ok(())
	}

	/// Deploys global commands normally and everything else to a single guild.
	pub async fn deploy(&mut self, guild_id: Id<GuildMarker>) -> miette::Result<()> {
		let (session, router) = self.logged_in()?;
		let deployer = HttpDeployer::new(Arc::clone(&session.http_client), session.application_id);
		let summary = deploy::deploy(router.commands(), &deployer, guild_id).await;
		self.mentions = Arc::new(summary.mentions());
		Ok(())
	}

	/// Clears the guild commands of one guild, or of every guild the bot is in.
	pub async fn deregister_guild_commands(&self, guild_id: Option<Id<GuildMarker>>) -> miette::Result<()> {
		let (session, _) = self.logged_in()?;
		let deployer = HttpDeployer::new(Arc::clone(&session.http_client), session.application_id);
		deploy::deregister_guild_commands(&deployer, guild_id).await;
		Ok(())
	}

	/// Connects to the gateway and handles interactions until the connection closes.
	pub async fn run(&self) -> miette::Result<()> {
		let (session, router) = self.logged_in()?;
		let router = Arc::clone(router);
		let mut shard = Shard::new(ShardId::ONE, session.token.clone(), Intents::GUILDS);

		let event_types = EventTypeFlags::INTERACTION_CREATE | EventTypeFlags::READY;
		while let Some(event) = shard.next_event(event_types).await {
			let event = match event {
				Ok(event) => event,
				Err(error) => {
					tracing::warn!(source = ?error, "error receiving event");
					continue;
				}
			};

			match event {
				Event::InteractionCreate(interaction_create) => {
					let context = InteractionContext::new(
						interaction_create.0,
						Arc::clone(&session.http_client),
						session.application_id,
						Arc::clone(&self.store),
						Arc::clone(&self.mentions),
						router.components().routing().clone(),
					);
					let router = Arc::clone(&router);
					tokio::spawn(async move { router.handle(context).await });
				}
				Event::Ready(_) => tracing::info!("Discord gateway is ready"),
				_ => (),
			}
		}

		Ok(())
	}
}
