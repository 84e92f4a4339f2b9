use std::process;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use conflict_lens::{Cli, ToolError};
use tracing::debug;

fn main() {
    // Logs go to stderr so stdout carries exactly one JSON document.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => e.exit(),
            _ => fail(&ToolError::Usage(e.render().to_string().trim().to_string())),
        },
    };

    match cli.execute() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            for (depth, cause) in e.chain().enumerate() {
                debug!(depth, "{cause}");
            }
            fail(&ToolError::classify(&e));
        }
    }
}

fn fail(error: &ToolError) -> ! {
    let envelope = error.envelope();
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => println!("{json}"),
        Err(_) => println!(
            "{{\"kind\": \"InternalError\", \"message\": {:?}}}",
            envelope.message
        ),
    }
    process::exit(error.exit_code());
}
