use colored::Colorize;
use sonde::command_argument_builder;
use sonde::handlers::{handle_crawl, handle_discover, handle_parse};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");
    init_logging(verbose);

    // a spinner would interleave with -v log lines
    let show_progress = !quiet && !verbose;

    let outcome = match chosen_command.subcommand() {
        Some(("discover", args)) => handle_discover(args, show_progress).await,
        Some(("crawl", args)) => handle_crawl(args, show_progress).await,
        Some(("parse", args)) => handle_parse(args, show_progress).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match outcome {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
