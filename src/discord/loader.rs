// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading definition directories.
//!
//! A command file holds nodes like
//!
//! ```kdl
//! command "config" {
//!     guilds 123456789012345678
//! }
//! ```
//!
//! where the argument names a command in the [HandlerCatalog] and `guilds` (optional) restricts deployment to the
//! listed guilds. An interaction file holds nodes like `interaction "close" handler="close_ticket"`, mounting a
//! catalog handler at a custom ID prefix; `handler` defaults to the prefix.

use super::registry::{CommandDefinition, CommandScope, HandlerCatalog, InteractionDefinition};
use kdl::{KdlDocument, KdlError, KdlNode};
use miette::{Diagnostic, IntoDiagnostic};
use std::fmt;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs::{read_dir, read_to_string};
use tokio::task::JoinSet;
use twilight_model::id::Id;

const DEFINITION_EXTENSION: &str = "kdl";

/// The definitions that loaded, plus what was wrong with the ones that didn't.
pub struct Loaded<T> {
	pub definitions: Vec<T>,
	pub errors: Vec<LoaderError>,
}

impl<T> Default for Loaded<T> {
	fn default() -> Self {
		Self {
			definitions: Vec::new(),
			errors: Vec::new(),
		}
	}
}

/// A definition file, or a node in one, that couldn't be used
#[derive(Debug, Diagnostic)]
pub enum LoaderError {
	/// The file couldn't be read as text.
	Read { path: PathBuf, source: io::Error },
	Parse { path: PathBuf, source: KdlError },
	UnexpectedNode { path: PathBuf, node: String },
	MissingName { path: PathBuf, node: String },
	UnknownHandler { path: PathBuf, name: String },
	InvalidGuildId { path: PathBuf, command: String },
}

impl fmt::Display for LoaderError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Read { path, source } => write!(f, "couldn't read {}: {}", path.display(), source),
			Self::Parse { path, source } => write!(f, "couldn't parse {}: {}", path.display(), source),
			Self::UnexpectedNode { path, node } => {
				write!(f, "unexpected node `{}` in {}", node, path.display())
			}
			Self::MissingName { path, node } => {
				write!(f, "node `{}` in {} needs a name argument", node, path.display())
			}
			Self::UnknownHandler { path, name } => {
				write!(f, "{} refers to unknown handler `{}`", path.display(), name)
			}
			Self::InvalidGuildId { path, command } => write!(
				f,
				"command `{}` in {} lists a guild that isn't a valid ID",
				command,
				path.display()
			),
		}
	}
}

impl std::error::Error for LoaderError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Read { source, .. } => Some(source),
			Self::Parse { source, .. } => Some(source),
			_ => None,
		}
	}
}

/// Loads command definitions from a directory.
pub async fn load_commands<E>(
	directory: Option<&Path>,
	catalog: &HandlerCatalog<E>,
) -> miette::Result<Loaded<CommandDefinition<E>>> {
	let documents = read_definition_documents(directory).await?;
	let mut loaded = Loaded::default();
	for (path, document) in documents {
		let document = match document {
			Ok(document) => document,
			Err(error) => {
				loaded.errors.push(error);
				continue;
			}
		};
		for node in document.nodes() {
			match command_from_node(&path, node, catalog) {
				Ok(definition) => loaded.definitions.push(definition),
				Err(error) => loaded.errors.push(error),
			}
		}
	}
	log_errors(&loaded.errors);
	Ok(loaded)
}

/// Loads button, select menu, or modal definitions from a directory.
pub async fn load_interactions<E>(
	directory: Option<&Path>,
	catalog: &HandlerCatalog<E>,
) -> miette::Result<Loaded<InteractionDefinition<E>>> {
	let documents = read_definition_documents(directory).await?;
	let mut loaded = Loaded::default();
	for (path, document) in documents {
		let document = match document {
			Ok(document) => document,
			Err(error) => {
				loaded.errors.push(error);
				continue;
			}
		};
		for node in document.nodes() {
			match interaction_from_node(&path, node, catalog) {
				Ok(definition) => loaded.definitions.push(definition),
				Err(error) => loaded.errors.push(error),
			}
		}
	}
	log_errors(&loaded.errors);
	Ok(loaded)
}

fn log_errors(errors: &[LoaderError]) {
	for error in errors {
		tracing::error!(source = ?error, "Skipping a definition that failed to load");
	}
}

fn command_from_node<E>(
	path: &Path,
	node: &KdlNode,
	catalog: &HandlerCatalog<E>,
) -> Result<CommandDefinition<E>, LoaderError> {
	let node_name = node.name().value();
	if node_name != "command" {
		return Err(LoaderError::UnexpectedNode {
			path: path.to_path_buf(),
			node: node_name.to_string(),
		});
	}
	let name = name_argument(path, node)?;
	let Some(catalog_command) = catalog.command(name) else {
		return Err(LoaderError::UnknownHandler {
			path: path.to_path_buf(),
			name: name.to_string(),
		});
	};

	let mut guild_ids = Vec::new();
	let mut has_guilds = false;
	for child in node.children().map(|children| children.nodes()).unwrap_or_default() {
		if child.name().value() != "guilds" {
			return Err(LoaderError::UnexpectedNode {
				path: path.to_path_buf(),
				node: child.name().value().to_string(),
			});
		}
		has_guilds = true;
		for entry in child.entries().iter().filter(|entry| entry.name().is_none()) {
			let guild_id = entry
				.value()
				.as_integer()
				.and_then(|value| u64::try_from(value).ok())
				.and_then(Id::new_checked)
				.ok_or_else(|| LoaderError::InvalidGuildId {
					path: path.to_path_buf(),
					command: name.to_string(),
				})?;
			guild_ids.push(guild_id);
		}
	}

	let scope = if has_guilds {
		CommandScope::Guilds(guild_ids)
	} else {
		CommandScope::Global
	};
	Ok(catalog_command.definition(scope))
}

fn interaction_from_node<E>(
	path: &Path,
	node: &KdlNode,
	catalog: &HandlerCatalog<E>,
) -> Result<InteractionDefinition<E>, LoaderError> {
	let node_name = node.name().value();
	if node_name != "interaction" {
		return Err(LoaderError::UnexpectedNode {
			path: path.to_path_buf(),
			node: node_name.to_string(),
		});
	}
	let prefix = name_argument(path, node)?;
	let handler_name = node
		.get("handler")
		.and_then(|value| value.as_string())
		.unwrap_or(prefix);
	match catalog.interaction(handler_name) {
		Some(handler) => Ok(InteractionDefinition::new(prefix, handler.clone())),
		None => Err(LoaderError::UnknownHandler {
			path: path.to_path_buf(),
			name: handler_name.to_string(),
		}),
	}
}

fn name_argument<'a>(path: &Path, node: &'a KdlNode) -> Result<&'a str, LoaderError> {
	node.entries()
		.iter()
		.find(|entry| entry.name().is_none())
		.and_then(|entry| entry.value().as_string())
		.ok_or_else(|| LoaderError::MissingName {
			path: path.to_path_buf(),
			node: node.name().value().to_string(),
		})
}

/// Reads and parses every definition file in a directory, in path order.
async fn read_definition_documents(
	directory: Option<&Path>,
) -> miette::Result<Vec<(PathBuf, Result<KdlDocument, LoaderError>)>> {
	let Some(directory) = directory else {
		return Ok(Vec::new());
	};
	let paths = definition_files(directory).await?;

	let mut reads = JoinSet::new();
	for path in paths {
		reads.spawn(async move {
			let contents = read_to_string(&path).await;
			(path, contents)
		});
	}

	let mut documents = Vec::new();
	while let Some(read_result) = reads.join_next().await {
		let (path, contents) = read_result.into_diagnostic()?;
		let document = match contents {
			Ok(contents) => contents.parse::<KdlDocument>().map_err(|source| LoaderError::Parse {
				path: path.clone(),
				source,
			}),
			Err(source) => Err(LoaderError::Read {
				path: path.clone(),
				source,
			}),
		};
		documents.push((path, document));
	}
	documents.sort_by(|(a, _), (b, _)| a.cmp(b));
	Ok(documents)
}

/// Lists definition files in a directory and its immediate sub-directories.
async fn definition_files(directory: &Path) -> miette::Result<Vec<PathBuf>> {
	let mut entries = match read_dir(directory).await {
		Ok(entries) => entries,
		Err(error) if error.kind() == ErrorKind::NotFound => {
			tracing::warn!(directory = %directory.display(), "Definition directory doesn't exist; nothing loaded from it");
			return Ok(Vec::new());
		}
		Err(error) => return Err(error).into_diagnostic(),
	};

	let mut files = Vec::new();
	let mut sub_directories = Vec::new();
	while let Some(entry) = entries.next_entry().await.into_diagnostic()? {
		let file_type = entry.file_type().await.into_diagnostic()?;
		if file_type.is_dir() {
			sub_directories.push(entry.path());
		} else if is_definition_file(&entry.path()) {
			files.push(entry.path());
		}
	}

	for sub_directory in sub_directories {
		let mut entries = read_dir(&sub_directory).await.into_diagnostic()?;
		while let Some(entry) = entries.next_entry().await.into_diagnostic()? {
			let file_type = entry.file_type().await.into_diagnostic()?;
			if file_type.is_file() && is_definition_file(&entry.path()) {
				files.push(entry.path());
			}
		}
	}

	files.sort();
	Ok(files)
}

fn is_definition_file(path: &Path) -> bool {
	path.extension().is_some_and(|extension| extension == DEFINITION_EXTENSION)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::discord::registry::{CommandHandler, InteractionHandler};
	use async_trait::async_trait;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use twilight_model::application::command::CommandType;
	use twilight_util::builder::command::CommandBuilder;

	struct Noop;

	#[async_trait]
	impl CommandHandler<()> for Noop {
		async fn execute(&self, _event: &()) -> miette::Result<()> {
			Ok(())
		}
	}

	#[async_trait]
	impl InteractionHandler<()> for Noop {
		async fn execute(&self, _event: &()) -> miette::Result<()> {
			Ok(())
		}
	}

	static NEXT_DIRECTORY: AtomicUsize = AtomicUsize::new(0);

	/// Creates an empty directory unique to this test run.
	fn fixture_directory(name: &str) -> PathBuf {
		let directory = std::env::temp_dir().join(format!(
			"support-desk-loader-{}-{}-{}",
			std::process::id(),
			NEXT_DIRECTORY.fetch_add(1, Ordering::SeqCst),
			name
		));
		let _ = std::fs::remove_dir_all(&directory);
		std::fs::create_dir_all(&directory).unwrap();
		directory
	}

	fn catalog() -> HandlerCatalog<()> {
		let mut catalog: HandlerCatalog<()> = HandlerCatalog::new();
		catalog
			.add_command(
				CommandBuilder::new("config", "Configure the bot", CommandType::ChatInput).build(),
				Arc::new(Noop),
				None,
			)
			.add_command(
				CommandBuilder::new("ping", "Check the bot is alive", CommandType::ChatInput).build(),
				Arc::new(Noop),
				None,
			)
			.add_interaction("close_ticket", Arc::new(Noop))
			.add_interaction("ticket", Arc::new(Noop));
		catalog
	}

	#[tokio::test]
	async fn loads_commands_with_scopes() {
		let directory = fixture_directory("commands");
		std::fs::write(directory.join("config.kdl"), "command \"config\"\n").unwrap();
		std::fs::create_dir(directory.join("dev")).unwrap();
		std::fs::write(
			directory.join("dev").join("ping.kdl"),
			"command \"ping\" {\n\tguilds 10 20\n}\n",
		)
		.unwrap();
		std::fs::write(directory.join("notes.txt"), "command \"nope\"\n").unwrap();

		let loaded = load_commands(Some(&directory), &catalog()).await.unwrap();
		assert!(loaded.errors.is_empty());
		assert_eq!(loaded.definitions.len(), 2);

		let config = &loaded.definitions[0];
		assert_eq!(config.name(), "config");
		assert!(config.is_global());
		let ping = &loaded.definitions[1];
		assert_eq!(ping.name(), "ping");
		assert_eq!(ping.scope(), &CommandScope::Guilds(vec![Id::new(10), Id::new(20)]));
	}

	#[tokio::test]
	async fn bad_entries_do_not_stop_the_rest() {
		let directory = fixture_directory("bad-commands");
		std::fs::write(directory.join("a_broken.kdl"), "command \"config").unwrap();
		std::fs::write(directory.join("b_unknown.kdl"), "command \"missing\"\n").unwrap();
		std::fs::write(directory.join("c_guild.kdl"), "command \"ping\" {\n\tguilds -4\n}\n").unwrap();
		std::fs::write(
			directory.join("d_good.kdl"),
			"command \"config\"\nbutton \"close\"\ncommand\n",
		)
		.unwrap();

		let loaded = load_commands(Some(&directory), &catalog()).await.unwrap();
		assert_eq!(loaded.definitions.len(), 1);
		assert_eq!(loaded.definitions[0].name(), "config");
		assert_eq!(loaded.errors.len(), 5);
		assert!(matches!(loaded.errors[0], LoaderError::Parse { .. }));
		assert!(matches!(&loaded.errors[1], LoaderError::UnknownHandler { name, .. } if name == "missing"));
		assert!(matches!(loaded.errors[2], LoaderError::InvalidGuildId { .. }));
		assert!(matches!(loaded.errors[3], LoaderError::UnexpectedNode { .. }));
		assert!(matches!(loaded.errors[4], LoaderError::MissingName { .. }));
	}

	#[tokio::test]
	async fn unreadable_files_do_not_stop_the_rest() {
		let directory = fixture_directory("not-utf8");
		std::fs::write(directory.join("a_good.kdl"), "interaction \"close\" handler=\"close_ticket\"\n").unwrap();
		std::fs::write(directory.join("b_binary.kdl"), [0xff, 0xfe, 0x00]).unwrap();

		let loaded = load_interactions(Some(&directory), &catalog()).await.unwrap();
		assert_eq!(loaded.definitions.len(), 1);
		assert_eq!(loaded.definitions[0].custom_id_prefix(), "close");
		assert_eq!(loaded.errors.len(), 1);
		assert!(matches!(&loaded.errors[0], LoaderError::Read { path, .. } if path.ends_with("b_binary.kdl")));
	}

	#[tokio::test]
	async fn interaction_handler_defaults_to_prefix() {
		let directory = fixture_directory("buttons");
		std::fs::write(
			directory.join("buttons.kdl"),
			"interaction \"close\" handler=\"close_ticket\"\ninteraction \"ticket\"\ninteraction \"reopen\"\n",
		)
		.unwrap();

		let loaded = load_interactions(Some(&directory), &catalog()).await.unwrap();
		let prefixes: Vec<&str> = loaded
			.definitions
			.iter()
			.map(|definition| definition.custom_id_prefix())
			.collect();
		assert_eq!(prefixes, vec!["close", "ticket"]);
		assert_eq!(loaded.errors.len(), 1);
		assert!(matches!(&loaded.errors[0], LoaderError::UnknownHandler { name, .. } if name == "reopen"));
	}

	#[tokio::test]
	async fn missing_or_unset_directories_load_nothing() {
		let directory = fixture_directory("empty").join("does-not-exist");
		let loaded = load_interactions(Some(&directory), &catalog()).await.unwrap();
		assert!(loaded.definitions.is_empty());
		assert!(loaded.errors.is_empty());

		let loaded = load_commands(None, &catalog()).await.unwrap();
		assert!(loaded.definitions.is_empty());
	}
}
