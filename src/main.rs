use anyhow::{bail, Context};
use clap::Parser;
use dotenvy::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use movie_ingest::app;
use movie_ingest::common::data_uri;
use movie_ingest::common::notify::TracingNotifier;
use movie_ingest::config::settings::AppConfig;
use movie_ingest::infrastructure::media::{FfmpegSurface, FfprobeProbe};
use movie_ingest::modules::ingest::{FileSelection, NoopFilePicker};
use movie_ingest::state::AppState;

/// Upload a video in chunks and pick a thumbnail for it.
#[derive(Parser, Debug)]
#[command(name = "movie-ingest", version)]
struct Args {
    /// Video file to upload
    video: PathBuf,

    /// Category the receiver routes the upload by (movie, episode, ...)
    #[arg(short, long)]
    category: String,

    /// Sampled candidate to keep, 1-based
    #[arg(long, default_value_t = 1)]
    pick: usize,

    /// Resample at a random offset before picking
    #[arg(long)]
    regenerate: bool,

    /// Use this image instead of a sampled frame
    #[arg(long)]
    thumbnail: Option<PathBuf>,

    /// Where to write the chosen thumbnail
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = AppConfig::new()?;
    info!("Ingesting {} via {}", args.video.display(), config.api_base_url);

    let state = AppState::new(config.clone(), Arc::new(TracingNotifier));
    let probe = Arc::new(FfprobeProbe::new(config.ffprobe_path.clone()));
    let controller = app::create_controller(&state, Arc::new(NoopFilePicker), probe.clone());

    // 1. Select the file and wait for its duration
    let selection = FileSelection::from_path(&args.video)
        .await
        .with_context(|| format!("Cannot read {}", args.video.display()))?;
    if let Some(probe_task) = controller.handle_video_upload(&selection, None).await {
        probe_task.await.ok();
    }

    // 2. The surface has to be in place before the upload finishes, sampling starts right after
    match FfmpegSurface::open(&probe, config.ffmpeg_path.clone(), &args.video).await {
        Ok(surface) => controller.attach_surface(Box::new(surface)).await,
        Err(e) => warn!("Thumbnail sampling disabled: {}", e),
    }

    // 3. Upload; Ctrl-C goes through the same cancel path as the form's cancel button
    let upload = controller.upload_video(&args.category, None);
    tokio::pin!(upload);
    let result = tokio::select! {
        result = &mut upload => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling upload");
            controller.cancel_upload(None).await;
            upload.await
        }
    };

    let Some(result) = result else {
        bail!("Upload did not complete");
    };
    let ingest = controller.state().await;
    if ingest.uploaded_video_path.is_none() {
        bail!("Upload was cancelled");
    }

    if args.regenerate {
        controller.regenerate_thumbnails().await;
    }

    // 4. Thumbnail: manual image wins over sampled candidates
    let chosen = match &args.thumbnail {
        Some(image) => {
            let selection = FileSelection::from_path(image)
                .await
                .with_context(|| format!("Cannot read {}", image.display()))?;
            controller.create_data_uri(&selection).await
        }
        None => {
            let options = controller.state().await.thumbnail_options;
            match options.get(args.pick.saturating_sub(1)) {
                Some(candidate) => {
                    controller.select_thumbnail(candidate.clone()).await;
                    Some(candidate.clone())
                }
                None => {
                    warn!("No thumbnail candidate #{} ({} available)", args.pick, options.len());
                    None
                }
            }
        }
    };

    if let Some(uri) = chosen {
        let out_dir = args.out.unwrap_or(config.thumbnail_output_dir);
        let name = ingest.generated_video_id.unwrap_or_else(|| "thumbnail".to_string());
        let path = write_thumbnail(&out_dir, &name, &uri).await?;
        println!("thumbnail: {}", path.display());
    }

    println!("file_path: {}", result.file_path);
    if let Some(video_id) = &result.video_id {
        println!("video_id: {}", video_id);
    }

    Ok(())
}

async fn write_thumbnail(dir: &Path, name: &str, uri: &str) -> anyhow::Result<PathBuf> {
    let (mime, bytes) = data_uri::decode(uri)?;
    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(format!("{}.{}", name, data_uri::extension_for(&mime)));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
