/// Ambience - ambient sound player
use ambience::config::AppConfig;
use ambience_core::{EntryId, JsonFileSettings, SettingsStore};
use ambience_resolver::{HelperResolver, Resolver};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ambience")]
#[command(about = "Loop ambient sounds from local files, web streams and video links", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AMBIENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Play {
        /// Entry to start with (default: the last played entry)
        #[arg(short, long)]
        id: Option<u64>,
    },
    /// List configured entries
    List,
    /// Check that the stream helper is installed
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Play { id } => {
            play(&config, id.map(EntryId::new)).await?;
        }
        Commands::List => {
            list(&config).await?;
        }
        Commands::Check => {
            check(&config).await?;
        }
    }

    Ok(())
}

#[cfg(feature = "gstreamer")]
async fn play(config: &AppConfig, id: Option<EntryId>) -> anyhow::Result<()> {
    use ambience::{run_interactive, spawn_renderer, TerminalRenderer};
    use ambience_engine::GstPipeline;
    use ambience_session::{SessionConfig, SessionController};
    use std::sync::Arc;
    use tokio::io::BufReader;

    let settings = Arc::new(JsonFileSettings::open(&config.settings_path));
    let resolver = Arc::new(HelperResolver::new(config.resolver_config()));
    let pipeline = GstPipeline::new()?;

    let handle = SessionController::start(
        pipeline,
        resolver,
        Arc::clone(&settings),
        SessionConfig::default(),
    )
    .await?;
    tracing::info!("Session started with {}", config.settings_path.display());

    let renderer = spawn_renderer(handle.subscribe(), TerminalRenderer::new(std::io::stdout()));

    match id {
        Some(id) => match settings.entry(id)? {
            Some(entry) => handle.activate(entry)?,
            None => println!("no entry with id {id}"),
        },
        None => handle.resume_last()?,
    }
    println!("{}", ambience::commands::HELP);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let result = run_interactive(&handle, settings.as_ref(), stdin, &mut stdout).await;

    handle.shutdown().await?;
    drop(handle);
    if renderer.await.is_err() {
        tracing::warn!("Renderer task panicked");
    }

    result?;
    Ok(())
}

#[cfg(not(feature = "gstreamer"))]
async fn play(_config: &AppConfig, _id: Option<EntryId>) -> anyhow::Result<()> {
    anyhow::bail!("no playback backend available; rebuild with `--features gstreamer`")
}

async fn list(config: &AppConfig) -> anyhow::Result<()> {
    let settings = JsonFileSettings::open(&config.settings_path);
    let entries = settings.entries()?;
    if entries.is_empty() {
        println!("No entries in {}", config.settings_path.display());
        return Ok(());
    }

    let resolver = HelperResolver::new(config.resolver_config());
    let helper_available = resolver.check_available().await;
    let last_played = settings.last_played()?;

    for entry in &entries {
        let marker = if Some(entry.id) == last_played { '*' } else { ' ' };
        let kind = match entry.source_kind {
            ambience_core::SourceKind::LocalFile => "file",
            ambience_core::SourceKind::WebUrl => "url",
            ambience_core::SourceKind::VideoLink => "video",
        };
        let note = if entry.source_kind.needs_resolution() && !helper_available {
            "  (unavailable)"
        } else {
            ""
        };
        println!(
            "{} {:>3}  {:<5}  {}{}",
            marker,
            entry.id.get(),
            kind,
            entry.name,
            note
        );
    }

    Ok(())
}

async fn check(config: &AppConfig) -> anyhow::Result<()> {
    let resolver = HelperResolver::new(config.resolver_config());
    let program = config.resolver.program.display();

    if resolver.check_available().await {
        println!("{program} found; video links are enabled");
    } else {
        println!("{program} not found; video links are disabled");
    }

    let entries = JsonFileSettings::open(&config.settings_path).entries()?;
    println!(
        "{} entries in {}",
        entries.len(),
        config.settings_path.display()
    );

    Ok(())
}
