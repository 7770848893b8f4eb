use std::{
	io::{self, Read},
	path::PathBuf,
};

use clap::Parser;
use color_eyre::eyre;

use cellar_service::{CellarService, Stores};

#[derive(Debug, Parser)]
#[command(
	version = cellar_cli::VERSION,
	rename_all = "kebab",
	styles = cellar_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON snapshot to resolve against instead of Postgres.
	#[arg(long, short = 's', value_name = "FILE")]
	pub snapshot: Option<PathBuf>,
	#[arg(long, value_name = "CODE")]
	pub client: Option<String>,
	/// Order text. Read from stdin when omitted.
	#[arg(long, short = 't', value_name = "TEXT")]
	pub text: Option<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = cellar_config::load(&args.config)?;

	cellar_cli::init_tracing(&config.service.log_level);

	let text = match args.text {
		Some(text) => text,
		None => read_stdin()?,
	};

	if text.trim().is_empty() {
		return Err(eyre::eyre!("Order text is empty."));
	}

	let stores = Stores::open(&config, args.snapshot.as_deref()).await?;
	let service = CellarService::new(config, stores);
	let lines = service.resolve_order_text(&text, args.client.as_deref()).await?;

	tracing::info!(
		lines = lines.len(),
		resolved = lines.iter().filter(|line| line.result.resolved()).count(),
		"Resolved order text."
	);

	let json = serde_json::to_string_pretty(&lines)?;

	println!("{json}");

	Ok(())
}

fn read_stdin() -> color_eyre::Result<String> {
	let mut text = String::new();

	io::stdin().read_to_string(&mut text)?;

	Ok(text)
}
