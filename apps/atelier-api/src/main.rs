use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = atelier_api::Args::parse();

	atelier_api::run(args).await
}
