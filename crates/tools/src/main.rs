use clap::Parser;
use tracing_subscriber::EnvFilter;

use tools::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    if let Err(e) = tools::run(cli, &mut stdout.lock()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
