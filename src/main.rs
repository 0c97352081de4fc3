#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use planetlang::cli;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    let args = cli::Cli::parse();
    cli::init_logging(args.verbose);
    if let Err(e) = cli::run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
