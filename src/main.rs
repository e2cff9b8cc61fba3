use std::fs::File;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lens::cli;
use lens::core::config::{CliOverrides, load_config, resolve};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "lens", about = "Terminal client for the Lens legal assistant")]
struct Args {
    /// Backend base URL (overrides config and LENS_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// User id for session history (overrides config and LENS_USER_ID)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question, or start a prompt loop when none is given
    Chat {
        query: Option<String>,
        /// Continue a saved session
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Manage saved chats
    Sessions {
        #[command(subcommand)]
        action: SessionsCommand,
    },
    /// Check backend and agent status
    Health,
}

#[derive(Subcommand)]
enum SessionsCommand {
    List,
    Show { session_id: String },
    Rename { session_id: String, title: String },
    Delete { session_id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to lens.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("lens.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let config = resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url,
            user_id: args.user,
        },
    );
    log::info!("Lens starting up against {}", config.base_url);

    let result = match args.command {
        Command::Chat { query, session } => cli::chat(&config, query, session).await,
        Command::Sessions { action } => match action {
            SessionsCommand::List => cli::list_sessions(&config).await,
            SessionsCommand::Show { session_id } => cli::show_session(&config, &session_id).await,
            SessionsCommand::Rename { session_id, title } => {
                cli::rename_session(&config, &session_id, &title).await
            }
            SessionsCommand::Delete { session_id } => {
                cli::delete_session(&config, &session_id).await
            }
        },
        Command::Health => cli::health(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
