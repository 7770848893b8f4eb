use clap::Parser;

use cellar_eval::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	cellar_eval::run(args).await
}
