// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use kdl::{KdlDocument, KdlNode, KdlValue};
use miette::{Diagnostic, IntoDiagnostic, Result};
use std::fmt;
use std::path::PathBuf;
use tokio::fs::read_to_string;
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

/// Environment variable that takes precedence over the token in the config file
pub const TOKEN_ENV_VAR: &str = "DISCORD_TOKEN";

pub async fn parse_config(config_path: &str) -> Result<ConfigData> {
	let config_file_contents = read_to_string(config_path).await.into_diagnostic()?;
	let env_token = std::env::var(TOKEN_ENV_VAR).ok();
	parse_config_document(&config_file_contents, env_token)
}

/// Parses the config file contents. A token passed in as `env_token` overrides any token in the document.
pub fn parse_config_document(contents: &str, env_token: Option<String>) -> Result<ConfigData> {
	let document: KdlDocument = contents.parse()?;

	let file_token = match document.get("discord_token") {
		Some(node) => Some(string_argument(node)?.to_string()),
		None => None,
	};
	let discord_token = env_token
		.filter(|token| !token.is_empty())
		.or(file_token.filter(|token| !token.is_empty()));

	let database = match document.get("database") {
		Some(node) => Some(DatabaseConfig::from_node(node)?),
		None => None,
	};

	let definitions = match document.get("definitions") {
		Some(node) => DefinitionPaths::from_node(node)?,
		None => DefinitionPaths::default(),
	};

	let client = match document.get("client") {
		Some(node) => ClientOptions::from_node(node)?,
		None => ClientOptions::default(),
	};

	let dev_guild = match document.get("dev_guild") {
		Some(node) => Some(guild_argument(node)?),
		None => None,
	};

	Ok(ConfigData {
		discord_token,
		database,
		definitions,
		client,
		dev_guild,
	})
}

#[derive(Debug)]
pub struct ConfigData {
	/// The bot token. `None` when neither the config file nor the environment provided one.
	pub discord_token: Option<String>,
	/// Connection settings for the guild configuration database. Without it, settings only live in memory.
	pub database: Option<DatabaseConfig>,
	pub definitions: DefinitionPaths,
	pub client: ClientOptions,
	/// When set, non-global commands are deployed to this guild only, alongside the global commands.
	pub dev_guild: Option<Id<GuildMarker>>,
}

#[derive(Debug)]
pub struct DatabaseConfig {
	pub host: String,
	pub port: Option<u16>,
	pub username: String,
	pub password: String,
	pub database: String,
}

impl DatabaseConfig {
	fn from_node(node: &KdlNode) -> Result<Self> {
		let children = children(node)?;
		let port = match children.get("port") {
			Some(port_node) => {
				let port = integer_argument(port_node)?;
				let port = u16::try_from(port).map_err(|_| ConfigError::OutOfRange {
					node: String::from("port"),
				})?;
				Some(port)
			}
			None => None,
		};
		Ok(Self {
			host: required_string(children, "host")?,
			port,
			username: required_string(children, "username")?,
			password: required_string(children, "password")?,
			database: required_string(children, "database")?,
		})
	}
}

/// Directories from which each kind of definition is loaded. A `None` directory is skipped.
#[derive(Debug)]
pub struct DefinitionPaths {
	pub commands: Option<PathBuf>,
	pub context_menus: Option<PathBuf>,
	pub buttons: Option<PathBuf>,
	pub select_menus: Option<PathBuf>,
	pub modals: Option<PathBuf>,
}

impl Default for DefinitionPaths {
	fn default() -> Self {
		Self {
			commands: Some(PathBuf::from("definitions/commands")),
			context_menus: Some(PathBuf::from("definitions/context_menus")),
			buttons: Some(PathBuf::from("definitions/buttons")),
			select_menus: Some(PathBuf::from("definitions/select_menus")),
			modals: Some(PathBuf::from("definitions/modals")),
		}
	}
}

impl DefinitionPaths {
	fn from_node(node: &KdlNode) -> Result<Self> {
		let children = children(node)?;
		let path = |name: &str| -> Result<Option<PathBuf>> {
			match children.get(name) {
				Some(path_node) => Ok(Some(PathBuf::from(string_argument(path_node)?))),
				None => Ok(None),
			}
		};
		Ok(Self {
			commands: path("commands")?,
			context_menus: path("context_menus")?,
			buttons: path("buttons")?,
			select_menus: path("select_menus")?,
			modals: path("modals")?,
		})
	}
}

/// Behavior toggles for interaction handling.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
	/// Whether buttons and select menus are dispatched
	pub receive_message_components: bool,
	/// Whether modal submissions are dispatched
	pub receive_modals: bool,
	/// Whether autocomplete requests are dispatched
	pub receive_autocomplete: bool,
	/// Whether unexpected handler failures get a generic ephemeral reply
	pub reply_on_error: bool,
	/// Whether component custom IDs are routed by their leading segment instead of the whole ID
	pub split_custom_id: bool,
	pub custom_id_separator: String,
}

impl Default for ClientOptions {
	fn default() -> Self {
		Self {
			receive_message_components: true,
			receive_modals: true,
			receive_autocomplete: true,
			reply_on_error: true,
			split_custom_id: true,
			custom_id_separator: String::from("/"),
		}
	}
}

impl ClientOptions {
	fn from_node(node: &KdlNode) -> Result<Self> {
		let children = children(node)?;
		let defaults = Self::default();
		let flag = |name: &str, default: bool| -> Result<bool> {
			match children.get(name) {
				Some(flag_node) => bool_argument(flag_node),
				None => Ok(default),
			}
		};

		let custom_id_separator = match children.get("custom_id_separator") {
			Some(separator_node) => string_argument(separator_node)?.to_string(),
			None => defaults.custom_id_separator.clone(),
		};
		if custom_id_separator.is_empty() {
			return Err(ConfigError::EmptyValue {
				node: String::from("custom_id_separator"),
			}
			.into());
		}

		Ok(Self {
			receive_message_components: flag("receive_message_components", defaults.receive_message_components)?,
			receive_modals: flag("receive_modals", defaults.receive_modals)?,
			receive_autocomplete: flag("receive_autocomplete", defaults.receive_autocomplete)?,
			reply_on_error: flag("reply_on_error", defaults.reply_on_error)?,
			split_custom_id: flag("split_custom_id", defaults.split_custom_id)?,
			custom_id_separator,
		})
	}
}

/// Structural problems with an otherwise syntactically valid config document
#[derive(Debug, Diagnostic)]
pub enum ConfigError {
	MissingNode { node: String },
	MissingArgument { node: String },
	WrongType { node: String, expected: &'static str },
	OutOfRange { node: String },
	EmptyValue { node: String },
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingNode { node } => write!(f, "config is missing required node `{}`", node),
			Self::MissingArgument { node } => write!(f, "config node `{}` needs a value", node),
			Self::WrongType { node, expected } => write!(f, "config node `{}` must be {}", node, expected),
			Self::OutOfRange { node } => write!(f, "config node `{}` is out of range", node),
			Self::EmptyValue { node } => write!(f, "config node `{}` must not be empty", node),
		}
	}
}

impl std::error::Error for ConfigError {}

fn children(node: &KdlNode) -> Result<&KdlDocument> {
	node.children().ok_or_else(|| {
		ConfigError::MissingNode {
			node: format!("{} {{ ... }}", node.name().value()),
		}
		.into()
	})
}

fn first_argument(node: &KdlNode) -> Result<&KdlValue> {
	node.entries()
		.iter()
		.find(|entry| entry.name().is_none())
		.map(|entry| entry.value())
		.ok_or_else(|| {
			ConfigError::MissingArgument {
				node: node.name().value().to_string(),
			}
			.into()
		})
}

fn string_argument(node: &KdlNode) -> Result<&str> {
	first_argument(node)?.as_string().ok_or_else(|| {
		ConfigError::WrongType {
			node: node.name().value().to_string(),
			expected: "a string",
		}
		.into()
	})
}

fn integer_argument(node: &KdlNode) -> Result<i128> {
	first_argument(node)?.as_integer().ok_or_else(|| {
		ConfigError::WrongType {
			node: node.name().value().to_string(),
			expected: "an integer",
		}
		.into()
	})
}

fn bool_argument(node: &KdlNode) -> Result<bool> {
	first_argument(node)?.as_bool().ok_or_else(|| {
		ConfigError::WrongType {
			node: node.name().value().to_string(),
			expected: "#true or #false",
		}
		.into()
	})
}

fn guild_argument(node: &KdlNode) -> Result<Id<GuildMarker>> {
	let value = integer_argument(node)?;
	u64::try_from(value)
		.ok()
		.and_then(Id::new_checked)
		.ok_or_else(|| {
			ConfigError::OutOfRange {
				node: node.name().value().to_string(),
			}
			.into()
		})
}

fn required_string(document: &KdlDocument, name: &str) -> Result<String> {
	match document.get(name) {
		Some(node) => Ok(string_argument(node)?.to_string()),
		None => Err(ConfigError::MissingNode {
			node: name.to_string(),
		}
		.into()),
	}
}
