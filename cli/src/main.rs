use clap::{Parser, Subcommand};
use std::process;

mod commands;
mod output;

use commands::{client::ClientCommands, coordinator::CoordinatorArgs, worker::WorkerArgs};

/// Cluster - coordinator and worker-node binary for a distributed job-dispatch cluster
#[derive(Parser)]
#[command(name = "cluster")]
#[command(author = "Cluster Contributors")]
#[command(version)]
#[command(about = "Run a coordinator or worker node, or talk to one as a client", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator process
    #[command(visible_alias = "c")]
    Coordinator(CoordinatorArgs),

    /// Run a worker node
    #[command(visible_alias = "w")]
    Worker(WorkerArgs),

    /// Client commands against a running coordinator
    #[command(subcommand, visible_alias = "cli")]
    Client(ClientCommands),

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Handle color output
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Execute command
    let result = match cli.command {
        Commands::Coordinator(args) => commands::coordinator::execute(args).await,
        Commands::Worker(args) => commands::worker::execute(args).await,
        Commands::Client(cmd) => commands::client::execute(cmd, cli.verbose).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if cli.verbose {
            eprintln!("\nCaused by:");
            for cause in e.chain().skip(1) {
                eprintln!("  {}", cause);
            }
        }
        process::exit(1);
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

