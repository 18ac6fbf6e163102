use crate::cli::{CacheCommand, Cli, Command, RunArgs};
use futures::{StreamExt, pin_mut};
use miette::miette;
use nab_cache::IdentifierCache;
use nab_config::Settings;
use nab_extract::Classifier;
use nab_feed::{FeedSource, FileFeed, HttpFeed};
use nab_pipeline::{Context, Markers, Summary};
use nab_queue::QueueHandle;
use nab_queue::backend::{DryRunBackend, TransmissionBackend};
use std::error::Error as StdError;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

/// Render an error tree for the terminal.
trait IntoReport<T> {
    fn into_report(self) -> miette::Result<T>;
}
impl<T, E: StdError + Send + Sync + 'static> IntoReport<T> for Result<T, exn::Exn<E>> {
    fn into_report(self) -> miette::Result<T> {
        self.map_err(|err| miette!("{err:?}"))
    }
}

pub async fn execute(cli: Cli) -> miette::Result<ExitCode> {
    let config = cli.config.as_deref();
    match cli.command {
        None => run(config, cli.run).await,
        Some(Command::Cache(CacheCommand::List)) => cache_list(config),
        Some(Command::Cache(CacheCommand::Forget { hash })) => cache_forget(config, &hash),
        Some(Command::Classify { title, link, markers }) => classify(&title, &link, Markers::new(markers)),
    }
}

fn load_cache(settings: &Settings) -> miette::Result<IdentifierCache> {
    let path = settings.cache_path().into_report()?;
    IdentifierCache::load(&path, settings.cache.size).into_report()
}

fn queue(settings: &Settings, dry_run: bool) -> miette::Result<QueueHandle> {
    let rpc = &settings.rpc;
    let url = TransmissionBackend::endpoint(&rpc.host, rpc.port, &rpc.path, rpc.tls);
    let mut backend = TransmissionBackend::new("transmission", url, rpc.timeout()).into_report()?;
    if let Some(user) = &rpc.user {
        backend = backend.with_credentials(user, rpc.pass.clone().unwrap_or_default());
    }
    let handle: QueueHandle = Arc::new(backend);
    Ok(if dry_run { Arc::new(DryRunBackend::new(handle)) } else { handle })
}

async fn run(config: Option<&Path>, args: RunArgs) -> miette::Result<ExitCode> {
    let settings = Settings::load(config).into_report()?;
    let mut cache = load_cache(&settings)?.with_dry_run(args.dry_run);
    let classifier = Classifier::new().into_report()?;
    let feed: Box<dyn FeedSource> = match args.feed_file {
        Some(path) => Box::new(FileFeed::new(path)),
        None => Box::new(HttpFeed::new(&settings.feed, settings.feed_timeout()).into_report()?),
    };
    let queue = queue(&settings, args.dry_run)?;
    let ctx = Context::new(&settings.download, Markers::new(settings.markers.iter().cloned()));
    tracing::debug!(cache = cache.len(), queue = queue.name(), dry_run = args.dry_run, "Starting run");

    let events = nab_pipeline::run(feed.as_ref(), &classifier, &mut cache, queue.as_ref(), &ctx);
    pin_mut!(events);
    let mut summary = Summary::default();
    while let Some(event) = events.next().await {
        summary.record(&event);
        if let Err(err) = event
            && err.is_fatal()
        {
            return Err(miette!("{err:?}"));
        }
    }

    println!("{summary}");
    Ok(if summary.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn cache_list(config: Option<&Path>) -> miette::Result<ExitCode> {
    let settings = Settings::load(config).into_report()?;
    let cache = load_cache(&settings)?;
    for id in cache.iter() {
        println!("{id}");
    }
    Ok(ExitCode::SUCCESS)
}

fn cache_forget(config: Option<&Path>, hash: &str) -> miette::Result<ExitCode> {
    let settings = Settings::load(config).into_report()?;
    let mut cache = load_cache(&settings)?;
    let hash = hash.to_ascii_lowercase();
    if !cache.remove(&hash) {
        eprintln!("{hash} is not cached");
        return Ok(ExitCode::FAILURE);
    }
    cache.commit().into_report()?;
    tracing::info!(%hash, "Removed identifier from cache");
    Ok(ExitCode::SUCCESS)
}

fn classify(title: &str, link: &str, markers: Markers) -> miette::Result<ExitCode> {
    let release = Classifier::new().and_then(|c| c.classify(title, link)).into_report()?;
    println!("series:      {}", release.series);
    println!("episode:     {}", release.episode);
    println!("info:        {}", release.info);
    println!("hash:        {}", release.hash);
    println!("replacement: {}", markers.find(&release).unwrap_or("no"));
    Ok(ExitCode::SUCCESS)
}
