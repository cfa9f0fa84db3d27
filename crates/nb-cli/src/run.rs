use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nb_core::ccode::CcodeDecoder;

use crate::archive::{feed_upload_object, DirectoryUploader, Uploader};
use crate::feed::fetch_feed;
use crate::notifier::{Notifier, SlackNotifier, StdoutNotifier};
use crate::openbd::OpenBdClient;
use crate::pipeline::Pipeline;
use crate::recorder::{JsonlRecorder, Recorder};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RunOptions {
    pub feed_url: String,
    pub rules: PathBuf,
    pub ccode_table: PathBuf,
    pub openbd_url: String,
    pub slack_webhook_url: Option<String>,
    pub records: PathBuf,
    pub archive_dir: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn run_batch(opts: RunOptions) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    runtime.block_on(run_batch_async(opts))
}

async fn run_batch_async(opts: RunOptions) -> Result<(), String> {
    let start = Instant::now();

    let decoder = CcodeDecoder::load(&opts.ccode_table)
        .map_err(|e| format!("Failed to load C-code table: {}", e))?;
    let filter = nb_compiler::load_filter(&opts.rules)
        .map_err(|e| format!("Failed to load notification rules: {}", e))?;

    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let notifier: Arc<dyn Notifier>;
    let recorder: Option<Arc<dyn Recorder>>;
    if opts.dry_run {
        log::info!("Dry run: printing matches, nothing is recorded or archived");
        notifier = Arc::new(StdoutNotifier);
        recorder = None;
    } else {
        let webhook = opts
            .slack_webhook_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| "SLACK_WEBHOOK_URL is required unless --dry-run is given".to_string())?;
        notifier = Arc::new(SlackNotifier::new(client.clone(), webhook));
        recorder = Some(Arc::new(JsonlRecorder::new(&opts.records)));
    }

    let snapshot = fetch_feed(&client, &opts.feed_url).await?;
    log::info!(
        "Fetched feed '{}' published {}: {} entries",
        snapshot.title,
        snapshot.published,
        snapshot.entries.len()
    );

    let pipeline = Pipeline {
        fetcher: Arc::new(OpenBdClient::new(client.clone(), &opts.openbd_url)),
        decoder: Arc::new(decoder),
        filter: Arc::new(filter),
        notifier,
        recorder,
    };
    let summary = pipeline.process(snapshot.book_list()).await;

    if !opts.dry_run {
        if let Some(dir) = &opts.archive_dir {
            if let Err(e) = archive_feed(&snapshot, dir).await {
                log::error!("Failed to archive feed: {}", e);
            }
        }
    }

    log::info!(
        "Done in {:.1}s: {} in feed, {} new, {} notified",
        start.elapsed().as_secs_f64(),
        summary.feed_books,
        summary.new_books,
        summary.notified,
    );
    Ok(())
}

async fn archive_feed(snapshot: &crate::feed::FeedSnapshot, dir: &Path) -> Result<(), String> {
    let object = feed_upload_object(snapshot)?;
    DirectoryUploader::new(dir).upload(&object).await?;
    log::info!("Archived feed as {}", object.object_name);
    Ok(())
}
