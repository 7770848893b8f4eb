use clap::Parser;

use cellar_resolve::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	cellar_resolve::run(args).await
}
