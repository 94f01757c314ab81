// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use getopts::Options;
use miette::IntoDiagnostic;
use std::sync::Arc;
use support_desk::config::parse_config;
use support_desk::discord::SupportBot;
use support_desk::store::open_store;
use tracing_subscriber::EnvFilter;
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

const DEFAULT_CONFIG_PATH: &str = "config.kdl";

fn command_line_options() -> Options {
	let mut options = Options::new();
	options.optopt("c", "config", "path to the config file (default: config.kdl)", "PATH");
	options.optflag("", "deploy-only", "deploy commands and exit without connecting to the gateway");
	options.optflagopt(
		"",
		"deregister-guild-commands",
		"delete guild commands from one guild, or from every guild if none is given",
		"GUILD",
	);
	options.optflag("h", "help", "print this help");
	options
}

#[tokio::main]
async fn main() -> miette::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args: Vec<String> = std::env::args().collect();
	let options = command_line_options();
	let matches = options.parse(args.iter().skip(1)).into_diagnostic()?;
	if matches.opt_present("h") {
		let program = args.first().map(String::as_str).unwrap_or("support-desk");
		print!("{}", options.usage(&format!("Usage: {} [options]", program)));
		return Ok(());
	}

	let config_path = matches
		.opt_str("config")
		.unwrap_or_else(|| String::from(DEFAULT_CONFIG_PATH));
	let config = Arc::new(parse_config(&config_path).await?);
	let store = open_store(&config)?;

	let mut bot = SupportBot::new(Arc::clone(&config), store);
	bot.init().await?;
	if bot.login().await.is_err() {
		// Already logged by the bot.
		return Ok(());
	}

	if matches.opt_present("deregister-guild-commands") {
		let guild_id: Option<Id<GuildMarker>> = match matches.opt_str("deregister-guild-commands") {
			Some(guild) => Some(guild.parse().into_diagnostic()?),
			None => None,
		};
		bot.deregister_guild_commands(guild_id).await?;
	} else if let Some(dev_guild) = config.dev_guild {
		bot.deploy(dev_guild).await?;
	} else {
		bot.register().await?;
	}

	if matches.opt_present("deploy-only") || matches.opt_present("deregister-guild-commands") {
		return Ok(());
	}
	bot.run().await
}
