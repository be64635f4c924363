use anyhow::Context;
use clap::Parser;
use smolhub::{Config, NoProgress, Progress, SmolHub, TerminalProgress};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "smolhub", version, about = "Download models from SmolHub", long_about = None)]
struct Args {
    /// unique identifier of the model, e.g. owner/name
    model_id: String,
    /// directory to save the model in, will auto create if not exists
    #[arg(short, long, default_value = "./")]
    output_dir: PathBuf,
    /// SmolHub API key, takes precedence over SMOLHUB_API_KEY
    #[arg(long)]
    api_key: Option<String>,
    /// don't draw a progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help and --version land here too
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            e.print().ok();
            return ExitCode::FAILURE;
        }
    };

    init_tracing();

    match run(args).await {
        Ok(path) => {
            println!("Model downloaded successfully to: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<PathBuf> {
    let config = Config::from_env(args.api_key);
    let hub = SmolHub::new(config)?;

    let mut progress: Box<dyn Progress> = if args.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(TerminalProgress::new())
    };

    hub.download(&args.model_id, &args.output_dir, progress.as_mut())
        .await
        .with_context(|| format!("failed to download model {}", args.model_id))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
