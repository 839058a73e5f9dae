use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use picache::application::{FetchPictureRequest, FetchPictureUseCase};
use picache::domain::entities::Bound;
use picache::infrastructure::{AppConfig, CacheStore, CliArgs, Command, PictureManager, StorageManager};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level.to_tracing_level()).into())
        .from_env_lossy();

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.overrides.config.as_deref())?;
    config.merge_with_args(&args.overrides);
    Ok(config)
}

async fn run(config: &AppConfig, command: Command) -> Result<()> {
    let root = config.cache.effective_root();

    match command {
        Command::Fetch {
            url,
            max_width,
            max_height,
            output,
            deadline,
        } => {
            let manager = PictureManager::with_http(&root, config.cache.request_timeout())?;
            let use_case = FetchPictureUseCase::new(Arc::new(manager));
            let deadline = deadline
                .map(Duration::from_secs)
                .or_else(|| config.cache.load_deadline());
            let request = FetchPictureRequest::new(url)
                .with_bound(Bound::new(max_width, max_height))
                .with_deadline(deadline);

            let response = use_case.execute(request).await?;
            println!(
                "{}x{} ({})",
                response.picture.width(),
                response.picture.height(),
                response.source
            );

            if let Some(path) = output {
                response
                    .picture
                    .save(&path)
                    .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "Picture written");
            }
        }
        Command::Invalidate { url } => {
            CacheStore::at(&root).invalidate(&url).await?;
        }
        Command::Clear => {
            CacheStore::at(&root).clear().await?;
        }
        Command::Key { url } => {
            let store = CacheStore::at(&root);
            println!("{}", CacheStore::compute_key(&url));
            println!("{}", store.entry_path(&url).display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(version = picache::VERSION, "Starting picache");

    run(&config, args.command).await
}
