use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = inbox::cli::Cli::parse();
    inbox::logging::init(cli.verbose);

    if let Err(err) = inbox::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
