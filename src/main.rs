use clap::Parser;
use trawl::cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    trawl::logging::init(args.verbose, args.quiet);
    args.execute().await
}
