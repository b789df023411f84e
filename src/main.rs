use clap::Parser;
use std::process;

use curlscrub::cli::Cli;
use curlscrub::router;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = router::run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
