use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use guardrelay::core::utils::shorten;
use guardrelay::core::{Action, ActionOutcome};
use guardrelay::Config;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "guardrelay")]
#[command(about = "Pair an Altura Guard wallet and relay signing requests to it", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve,

    /// Pair with a guard code and run one action from the terminal
    Demo {
        /// Guard code shown in the Altura Guard app
        #[arg(long)]
        code: String,

        /// Action to run once paired
        #[arg(long, value_enum, default_value_t = DemoAction::Sign)]
        action: DemoAction,

        /// Revoke the session when done
        #[arg(long)]
        revoke: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DemoAction {
    /// Sign the demo message
    Sign,
    /// Send the demo native-token amount
    Send,
    /// Approve the demo token allowance
    Approve,
}

impl From<DemoAction> for Action {
    fn from(action: DemoAction) -> Self {
        match action {
            DemoAction::Sign => Action::SignMessage,
            DemoAction::Send => Action::SendEth,
            DemoAction::Approve => Action::SendContractCall,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.or_else(|| {
        let default_path = Config::default_path();
        default_path.exists().then_some(default_path)
    });

    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => guardrelay::config::load_default()?,
    };

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format)?;

    tracing::info!("guardrelay starting...");
    match &config_path {
        Some(path) => tracing::info!("Config loaded from: {}", path.display()),
        None => tracing::info!("No config file found, using defaults and environment"),
    }

    match cli.command {
        Some(Commands::Serve) | None => {
            guardrelay::run(config).await?;
        }
        Some(Commands::Demo {
            code,
            action,
            revoke,
        }) => {
            run_demo(config, &code, action.into(), revoke).await?;
        }
    }

    Ok(())
}

async fn run_demo(config: Config, code: &str, action: Action, revoke: bool) -> Result<()> {
    let shutdown = CancellationToken::new();
    let service = guardrelay::build_service(&config, shutdown.clone())?;

    let session = match service.connect(Some(code)).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to send request. Error: {}", e);
            return Ok(());
        }
    };
    println!("Connected: {}", shorten(&session.address));
    println!("Approve the request in the Altura Guard app...");

    // Every failure ends up as a notice, never a crash
    let cancel = shutdown.clone();
    let outcome = tokio::select! {
        outcome = service.perform(action, None) => outcome,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            println!("Cancelled");
            return Ok(());
        }
    };
    match outcome {
        Ok(ActionOutcome::Notice(notice)) => println!("{}", notice),
        Ok(ActionOutcome::Connected(session)) => println!("Connected: {}", session.address),
        Err(e) => println!("{}", e),
    }

    if revoke {
        match service.perform(Action::Revoke, None).await {
            Ok(ActionOutcome::Notice(notice)) => println!("{}", notice),
            Ok(_) => {}
            Err(e) => println!("{}", e),
        }
    }

    shutdown.cancel();
    Ok(())
}

fn init_logging(level: &str, format: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            // Default to pretty
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
