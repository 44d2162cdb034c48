use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = haven_chat::Args::parse();

	haven_chat::run(args).await
}
