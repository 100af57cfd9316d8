use clap::Parser;
use credvault::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init => credvault::cli::commands::init::execute(&cli),
        Commands::Register { ref username } => {
            credvault::cli::commands::register::execute(&cli, username)
        }
        Commands::Login { ref username } => credvault::cli::commands::login::execute(&cli, username),
        Commands::Passwd { ref username } => {
            credvault::cli::commands::passwd::execute(&cli, username)
        }
        Commands::Rename {
            ref username,
            ref new_username,
        } => credvault::cli::commands::rename::execute(&cli, username, new_username),
        Commands::DeleteAccount {
            ref username,
            force,
        } => credvault::cli::commands::delete_account::execute(&cli, username, force),
        Commands::Users {
            ref admin,
            ref action,
        } => credvault::cli::commands::users::execute(&cli, admin, action),
        Commands::Reset { force } => credvault::cli::commands::reset::execute(&cli, force),
        Commands::Destroy { force } => credvault::cli::commands::destroy::execute(&cli, force),
        Commands::Hash => credvault::cli::commands::hash::execute(&cli),
        Commands::Completions { shell } => credvault::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        credvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `CREDVAULT_LOG` (default: warnings).
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("CREDVAULT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("credvault=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
