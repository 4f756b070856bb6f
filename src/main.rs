use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use credvault::cli::commands::update::Changes;
use credvault::cli::{commands, output, Cli, Commands};

/// Environment variable holding the log filter (e.g. `credvault=debug`).
const LOG_ENV: &str = "CREDVAULT_LOG";

/// Initialize logging to stderr.  Quiet (`warn`) unless `CREDVAULT_LOG` is set.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(filter)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Init { force } => commands::init::execute(&cli, *force),
        Commands::Add {
            title,
            username,
            site,
            secret,
        } => commands::add::execute(&cli, title, username.as_deref(), site.as_deref(), secret),
        Commands::List { term, json } => commands::list::execute(&cli, term.as_deref(), *json),
        Commands::Show { index } => commands::show::execute(&cli, *index),
        Commands::Update {
            index,
            title,
            username,
            site,
            secret,
        } => {
            let changes = Changes {
                title: title.as_deref(),
                username: username.as_deref(),
                site: site.as_deref(),
            };
            commands::update::execute(&cli, *index, &changes, secret)
        }
        Commands::Remove { index, force } => commands::remove::execute(&cli, *index, *force),
        Commands::Repair { force } => commands::repair::execute(&cli, *force),
        Commands::Generate { options } => commands::generate::execute(options),
        Commands::Completions { shell } => commands::completions::execute(*shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
