use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = orq_api::Args::parse();
	orq_api::run(args).await
}
