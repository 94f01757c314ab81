// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pushing the registered commands to Discord.
//!
//! Every call replaces the whole command set of its scope, so a deployment is one request for the global commands
//! plus one request per guild that has guild-scoped commands.

use super::registry::{CommandRegistry, CommandScope};
use async_trait::async_trait;
use miette::Diagnostic;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use twilight_http::api_error::ApiError;
use twilight_http::client::Client;
use twilight_http::error::{Error, ErrorType};
use twilight_http::response::DeserializeBodyError;
use twilight_model::application::command::Command;
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, CommandMarker, GuildMarker};

/// Discord's error code for requests the bot isn't allowed to make in a guild
const MISSING_ACCESS: u64 = 50001;

/// The REST calls deployment needs
#[async_trait]
pub trait CommandDeployer: Send + Sync {
	/// Replaces all global commands, returning what Discord now has.
	async fn set_global_commands(&self, commands: &[Command]) -> miette::Result<Vec<Command>>;

	/// Replaces all of one guild's commands, returning what Discord now has.
	async fn set_guild_commands(&self, guild_id: Id<GuildMarker>, commands: &[Command])
	-> miette::Result<Vec<Command>>;

	/// Lists the guilds the bot is in.
	async fn guild_ids(&self) -> miette::Result<Vec<Id<GuildMarker>>>;
}

/// Error data for deployment requests
#[derive(Debug, Diagnostic)]
pub enum DeployError {
	Http(Error),
	Deserialize(DeserializeBodyError),
}

impl DeployError {
	/// Whether Discord refused the request because the bot lacks access to the guild
	pub fn is_missing_access(&self) -> bool {
		let Self::Http(error) = self else {
			return false;
		};
		matches!(
			error.kind(),
			ErrorType::Response {
				error: ApiError::General(general),
				..
			} if general.code == MISSING_ACCESS
		)
	}
}

impl From<Error> for DeployError {
	fn from(error: Error) -> Self {
		Self::Http(error)
	}
}

impl From<DeserializeBodyError> for DeployError {
	fn from(error: DeserializeBodyError) -> Self {
		Self::Deserialize(error)
	}
}

impl std::error::Error for DeployError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Http(error) => Some(error),
			Self::Deserialize(error) => Some(error),
		}
	}
}

impl fmt::Display for DeployError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Http(error) => write!(f, "HTTP error: {}", error),
			Self::Deserialize(error) => write!(f, "deserialization error: {}", error),
		}
	}
}

/// Deploys through Discord's HTTP API
pub struct HttpDeployer {
	http_client: Arc<Client>,
	application_id: Id<ApplicationMarker>,
}

impl HttpDeployer {
	pub fn new(http_client: Arc<Client>, application_id: Id<ApplicationMarker>) -> Self {
		Self {
			http_client,
			application_id,
		}
	}

	async fn set_global(&self, commands: &[Command]) -> Result<Vec<Command>, DeployError> {
		let interaction_client = self.http_client.interaction(self.application_id);
		let response = interaction_client.set_global_commands(commands).await?;
		Ok(response.models().await?)
	}

	async fn set_guild(&self, guild_id: Id<GuildMarker>, commands: &[Command]) -> Result<Vec<Command>, DeployError> {
		let interaction_client = self.http_client.interaction(self.application_id);
		let response = interaction_client.set_guild_commands(guild_id, commands).await?;
		Ok(response.models().await?)
	}

	async fn list_guilds(&self) -> Result<Vec<Id<GuildMarker>>, DeployError> {
		let response = self.http_client.current_user_guilds().await?;
		let guilds = response.models().await?;
		Ok(guilds.into_iter().map(|guild| guild.id).collect())
	}
}

#[async_trait]
impl CommandDeployer for HttpDeployer {
	async fn set_global_commands(&self, commands: &[Command]) -> miette::Result<Vec<Command>> {
		Ok(self.set_global(commands).await?)
	}

	async fn set_guild_commands(
		&self,
		guild_id: Id<GuildMarker>,
		commands: &[Command],
	) -> miette::Result<Vec<Command>> {
		Ok(self.set_guild(guild_id, commands).await?)
	}

	async fn guild_ids(&self) -> miette::Result<Vec<Id<GuildMarker>>> {
		Ok(self.list_guilds().await?)
	}
}

/// What Discord reported back after a deployment
#[derive(Debug, Default)]
pub struct DeploySummary {
	pub global: Vec<Command>,
	pub guilds: BTreeMap<Id<GuildMarker>, Vec<Command>>,
}

impl DeploySummary {
	/// Collects the IDs Discord assigned, for building clickable command mentions.
	pub fn mentions(&self) -> CommandMentions {
		let global = self
			.global
			.iter()
			.filter_map(|command| command.id.map(|id| (command.name.clone(), id)))
			.collect();
		let guild = self
			.guilds
			.iter()
			.flat_map(|(guild_id, commands)| {
				commands
					.iter()
					.filter_map(move |command| command.id.map(|id| ((*guild_id, command.name.clone()), id)))
			})
			.collect();
		CommandMentions { global, guild }
	}
}

/// Deployed command IDs, used to render `</command sub:id>` mentions
#[derive(Debug, Default)]
pub struct CommandMentions {
	global: HashMap<String, Id<CommandMarker>>,
	guild: HashMap<(Id<GuildMarker>, String), Id<CommandMarker>>,
}

impl CommandMentions {
	/// Renders a mention for a command path like `config support role`. Falls back to plain text when the
	/// command's ID isn't known.
	pub fn mention(&self, guild_id: Option<Id<GuildMarker>>, command_path: &str) -> String {
		let name = command_path.split(' ').next().unwrap_or(command_path);
		let guild_command = guild_id.and_then(|guild_id| self.guild.get(&(guild_id, name.to_string())));
		match guild_command.or_else(|| self.global.get(name)) {
			Some(id) => format!("</{}:{}>", command_path, id),
			None => format!("`/{}`", command_path),
		}
	}
}

/// Splits registered commands into the global set and per-guild sets.
pub fn partition_commands<E>(registry: &CommandRegistry<E>) -> (Vec<Command>, BTreeMap<Id<GuildMarker>, Vec<Command>>) {
	let mut global = Vec::new();
	let mut guilds: BTreeMap<Id<GuildMarker>, Vec<Command>> = BTreeMap::new();
	for definition in registry.commands() {
		match definition.scope() {
			CommandScope::Global => global.push(definition.command().clone()),
			CommandScope::Guilds(guild_ids) => {
				for guild_id in guild_ids {
					guilds.entry(*guild_id).or_default().push(definition.command().clone());
				}
			}
		}
	}
	global.sort_by(|a, b| a.name.cmp(&b.name));
	for commands in guilds.values_mut() {
		commands.sort_by(|a, b| a.name.cmp(&b.name));
	}
	(global, guilds)
}

/// Deploys global commands once and each guild's commands to that guild.
///
/// Failed requests are logged and count as nothing deployed for their scope.
pub async fn register<E>(registry: &CommandRegistry<E>, deployer: &dyn CommandDeployer) -> DeploySummary {
	tracing::debug!("Deploying commands...");
	let (global_commands, guild_commands) = partition_commands(registry);

	let global = deploy_global(deployer, &global_commands).await;
	tracing::info!("Deployed {} global command(s)", global.len());

	let mut guilds = BTreeMap::new();
	for (guild_id, commands) in guild_commands {
		let deployed = deploy_guild(deployer, guild_id, &commands).await;
		guilds.insert(guild_id, deployed);
	}
	tracing::info!("Deployed commands to {} guild(s)", guilds.len());

	DeploySummary { global, guilds }
}

/// Deploys global commands as usual and every non-global command into a single guild.
pub async fn deploy<E>(
	registry: &CommandRegistry<E>,
	deployer: &dyn CommandDeployer,
	guild_id: Id<GuildMarker>,
) -> DeploySummary {
	let mut global_commands = Vec::new();
	let mut guild_commands = Vec::new();
	for definition in registry.commands() {
		if definition.is_global() {
			global_commands.push(definition.command().clone());
		} else {
			guild_commands.push(definition.command().clone());
		}
	}
	global_commands.sort_by(|a, b| a.name.cmp(&b.name));
	guild_commands.sort_by(|a, b| a.name.cmp(&b.name));

	let global = deploy_global(deployer, &global_commands).await;
	tracing::info!("Deployed {} global command(s)", global.len());
	let deployed = deploy_guild(deployer, guild_id, &guild_commands).await;
	tracing::info!(guild = guild_id.get(), "Deployed {} guild command(s)", deployed.len());

	let mut guilds = BTreeMap::new();
	guilds.insert(guild_id, deployed);
	DeploySummary { global, guilds }
}

/// Removes every guild command from one guild, or from all guilds the bot is in. Returns the number of guilds
/// cleared.
pub async fn deregister_guild_commands(deployer: &dyn CommandDeployer, guild_id: Option<Id<GuildMarker>>) -> usize {
	let guild_ids = match guild_id {
		Some(guild_id) => vec![guild_id],
		None => match deployer.guild_ids().await {
			Ok(guild_ids) => guild_ids,
			Err(error) => {
				tracing::error!(source = ?error, "Failed to list guilds to remove commands from");
				return 0;
			}
		},
	};

	let mut cleared = 0;
	for guild_id in guild_ids {
		match deployer.set_guild_commands(guild_id, &[]).await {
			Ok(_) => {
				tracing::debug!(guild = guild_id.get(), "Deleted all guild commands");
				cleared += 1;
			}
			Err(error) => log_deploy_error(&error, Some(guild_id)),
		}
	}
	tracing::info!("Deleted guild commands from {} guild(s)", cleared);
	cleared
}

async fn deploy_global(deployer: &dyn CommandDeployer, commands: &[Command]) -> Vec<Command> {
	match deployer.set_global_commands(commands).await {
		Ok(deployed) => deployed,
		Err(error) => {
			log_deploy_error(&error, None);
			Vec::new()
		}
	}
}

async fn deploy_guild(deployer: &dyn CommandDeployer, guild_id: Id<GuildMarker>, commands: &[Command]) -> Vec<Command> {
	match deployer.set_guild_commands(guild_id, commands).await {
		Ok(deployed) => deployed,
		Err(error) => {
			log_deploy_error(&error, Some(guild_id));
			Vec::new()
		}
	}
}

fn log_deploy_error(error: &miette::Report, guild_id: Option<Id<GuildMarker>>) {
	let missing_access = error
		.downcast_ref::<DeployError>()
		.is_some_and(DeployError::is_missing_access);
	match guild_id {
		Some(guild_id) if missing_access => {
			tracing::error!(guild = guild_id.get(), "Bot is missing access to deploy commands to guild");
		}
		Some(guild_id) => tracing::error!(guild = guild_id.get(), source = ?error, "Failed to deploy guild commands"),
		None => tracing::error!(source = ?error, "Failed to deploy global commands"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::discord::registry::{CommandDefinition, CommandHandler};
	use std::sync::Mutex;
	use twilight_model::application::command::CommandType;
	use twilight_util::builder::command::CommandBuilder;

	struct Noop;

	#[async_trait]
	impl CommandHandler<()> for Noop {
		async fn execute(&self, _event: &()) -> miette::Result<()> {
			Ok(())
		}
	}

	#[derive(Debug, PartialEq)]
	enum Call {
		Global(Vec<String>),
		Guild(Id<GuildMarker>, Vec<String>),
	}

	/// Records calls and hands out sequential command IDs. Guilds listed in `failing` reject requests.
	#[derive(Default)]
	struct RecordingDeployer {
		calls: Mutex<Vec<Call>>,
		failing: Vec<Id<GuildMarker>>,
		guilds: Vec<Id<GuildMarker>>,
	}

	fn names(commands: &[Command]) -> Vec<String> {
		commands.iter().map(|command| command.name.clone()).collect()
	}

	fn with_ids(commands: &[Command]) -> Vec<Command> {
		commands
			.iter()
			.enumerate()
			.map(|(index, command)| {
				let mut command = command.clone();
				command.id = Some(Id::new(1000 + index as u64));
				command
			})
			.collect()
	}

	#[async_trait]
	impl CommandDeployer for RecordingDeployer {
		async fn set_global_commands(&self, commands: &[Command]) -> miette::Result<Vec<Command>> {
			self.calls.lock().unwrap().push(Call::Global(names(commands)));
			Ok(with_ids(commands))
		}

		async fn set_guild_commands(
			&self,
			guild_id: Id<GuildMarker>,
			commands: &[Command],
		) -> miette::Result<Vec<Command>> {
			self.calls.lock().unwrap().push(Call::Guild(guild_id, names(commands)));
			if self.failing.contains(&guild_id) {
				miette::bail!("Missing Access");
			}
			Ok(with_ids(commands))
		}

		async fn guild_ids(&self) -> miette::Result<Vec<Id<GuildMarker>>> {
			Ok(self.guilds.clone())
		}
	}

	fn definition(name: &str, scope: CommandScope) -> CommandDefinition<()> {
		let command = CommandBuilder::new(name, "A test command", CommandType::ChatInput).build();
		CommandDefinition::new(command, Arc::new(Noop)).with_scope(scope)
	}

	fn registry() -> CommandRegistry<()> {
		let guild_a = Id::new(10);
		let guild_b = Id::new(20);
		let mut registry = CommandRegistry::new();
		let user_menu = CommandBuilder::new("Inspect User", "", CommandType::User).build();
		registry.add_chat_commands([
			definition("config", CommandScope::Global),
			definition("help", CommandScope::Global),
			definition("debug", CommandScope::Guilds(vec![guild_a])),
			definition("sync", CommandScope::Guilds(vec![guild_a, guild_b])),
			definition("purge", CommandScope::Guilds(vec![guild_b])),
		]);
		registry.add_user_context_menus([
			CommandDefinition::new(user_menu, Arc::new(Noop)).with_scope(CommandScope::Guilds(vec![guild_b]))
		]);
		registry
	}

	#[tokio::test]
	async fn register_makes_one_call_per_scope() {
		let registry = registry();
		let deployer = RecordingDeployer::default();
		let summary = register(&registry, &deployer).await;

		let calls = deployer.calls.lock().unwrap();
		assert_eq!(calls.len(), 1 + 2);
		assert_eq!(calls[0], Call::Global(vec![String::from("config"), String::from("help")]));
		assert_eq!(
			calls[1],
			Call::Guild(Id::new(10), vec![String::from("debug"), String::from("sync")])
		);
		assert_eq!(
			calls[2],
			Call::Guild(
				Id::new(20),
				vec![String::from("Inspect User"), String::from("purge"), String::from("sync")]
			)
		);

		assert_eq!(summary.global.len(), 2);
		assert_eq!(summary.guilds.len(), 2);
		assert_eq!(summary.guilds[&Id::new(20)].len(), 3);
	}

	#[tokio::test]
	async fn register_with_nothing_still_clears_global_commands() {
		let registry: CommandRegistry<()> = CommandRegistry::new();
		let deployer = RecordingDeployer::default();
		let summary = register(&registry, &deployer).await;
		assert_eq!(*deployer.calls.lock().unwrap(), vec![Call::Global(Vec::new())]);
		assert!(summary.global.is_empty());
	}

	#[tokio::test]
	async fn failed_guild_degrades_to_empty() {
		let registry = registry();
		let deployer = RecordingDeployer {
			failing: vec![Id::new(10)],
			..Default::default()
		};
		let summary = register(&registry, &deployer).await;
		assert_eq!(deployer.calls.lock().unwrap().len(), 3);
		assert!(summary.guilds[&Id::new(10)].is_empty());
		assert_eq!(summary.guilds[&Id::new(20)].len(), 3);
	}

	#[tokio::test]
	async fn deploy_puts_all_guild_commands_in_one_guild() {
		let registry = registry();
		let deployer = RecordingDeployer::default();
		let dev_guild = Id::new(99);
		deploy(&registry, &deployer, dev_guild).await;

		let calls = deployer.calls.lock().unwrap();
		assert_eq!(calls.len(), 2);
		assert_eq!(
			calls[1],
			Call::Guild(
				dev_guild,
				vec![
					String::from("Inspect User"),
					String::from("debug"),
					String::from("purge"),
					String::from("sync")
				]
			)
		);
	}

	#[tokio::test]
	async fn deregister_sends_empty_sets() {
		let deployer = RecordingDeployer {
			guilds: vec![Id::new(1), Id::new(2), Id::new(3)],
			failing: vec![Id::new(2)],
			..Default::default()
		};
		assert_eq!(deregister_guild_commands(&deployer, Some(Id::new(5))).await, 1);
		assert_eq!(deregister_guild_commands(&deployer, None).await, 2);

		let calls = deployer.calls.lock().unwrap();
		assert_eq!(calls.len(), 4);
		assert!(
			calls
				.iter()
				.all(|call| matches!(call, Call::Guild(_, commands) if commands.is_empty()))
		);
	}

	#[tokio::test]
	async fn mentions_prefer_guild_commands() {
		let registry = registry();
		let deployer = RecordingDeployer::default();
		let mentions = register(&registry, &deployer).await.mentions();

		assert_eq!(mentions.mention(None, "config support role"), "</config support role:1000>");
		assert_eq!(mentions.mention(Some(Id::new(10)), "sync"), "</sync:1001>");
		assert_eq!(mentions.mention(None, "sync"), "`/sync`");
		assert_eq!(mentions.mention(Some(Id::new(10)), "missing"), "`/missing`");
	}

	#[test]
	fn commands_serialize_to_the_discord_schema() {
		let (global, _) = partition_commands(&registry());
		let body = serde_json::to_value(&global).unwrap();
		assert_eq!(body[0]["name"], "config");
		assert_eq!(body[0]["type"], 1);
		assert_eq!(body[0]["description"], "A test command");
	}
}
