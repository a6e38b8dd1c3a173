use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod send;
pub mod serve;
pub mod vapid;

#[derive(Subcommand)]
enum Command {
    /// Run the API server and serve the browser client
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Generate a VAPID key pair and print it as env variables
    Vapid {},
    /// Send a notification to a subscription saved as JSON
    Send {
        /// Path to a file holding `PushSubscription.toJSON()` output
        #[arg(long)]
        subscription: String,

        #[arg(long)]
        message: String,

        #[arg(long, default_value = "PWA Demo")]
        title: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Load .env if there is one, real env vars take precedence
    dotenvy::dotenv().ok();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Vapid {}) => {
            vapid::run();
        }
        Some(Command::Send {
            subscription,
            message,
            title,
        }) => {
            send::run(&subscription, &title, &message).await?;
        }
        None => {}
    }

    Ok(())
}
