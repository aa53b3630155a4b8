use anyhow::{bail, Context};
use clap::Parser;
use cutline_core::{EditorSettings, LibraryItem, MediaRef, TimeUs, TimelineStore};
use cutline_preview::mpv::MpvSurface;
use cutline_preview::ticker::start_playback;
use cutline_preview::{TickerExit, TracingSurface};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Headless timeline player: lays the given media out back to back and plays
/// the result in real time.
#[derive(Debug, Parser)]
#[command(name = "cutline", version)]
struct Args {
    /// Editor settings file (JSON).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Preview through mpv instead of logging frames.
    #[arg(long)]
    mpv: bool,

    /// Start playback from this time (seconds, M:S or H:M:S).
    #[arg(long, value_parser = parse_time)]
    start: Option<TimeUs>,

    /// Media to place on the timeline, as PATH=DURATION.
    #[arg(required = true, value_parser = parse_media)]
    media: Vec<(String, TimeUs)>,
}

fn parse_time(s: &str) -> Result<TimeUs, String> {
    s.parse::<TimeUs>().map_err(|e| e.to_string())
}

fn parse_media(s: &str) -> Result<(String, TimeUs), String> {
    let (path, duration) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected PATH=DURATION, got {s:?}"))?;
    if path.is_empty() {
        return Err(format!("missing media path in {s:?}"));
    }
    Ok((path.to_string(), parse_time(duration)?))
}

fn media_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => EditorSettings::load_from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => EditorSettings::default(),
    };

    let mut store = TimelineStore::new(settings);
    for (path, duration) in &args.media {
        let item = LibraryItem::new(media_name(path), MediaRef::from(path.as_str()), Some(*duration));
        let item_id = store.library_mut().add(item)?;
        store
            .add_from_library(item_id, None)
            .with_context(|| format!("placing {path}"))?;
    }
    if store.clips().is_empty() {
        bail!("nothing to play");
    }
    if let Some(start) = args.start {
        store.seek(start);
    }
    tracing::info!(
        clips = store.clips().len(),
        total = %store.total_duration(),
        "timeline ready"
    );

    let period = store.settings().tick_interval();
    let store = Arc::new(Mutex::new(store));
    let handle = if args.mpv {
        let surface = tokio::task::spawn_blocking(|| {
            let mut surface = MpvSurface::new();
            surface.start().map(|()| surface)
        })
        .await??;
        start_playback(store.clone(), surface, period)?
    } else {
        start_playback(store.clone(), TracingSurface::default(), period)?
    };

    let exit = loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                tracing::info!("interrupted");
                handle.cancel();
                break handle.join().await?;
            }
            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                if handle.is_finished() {
                    break handle.join().await?;
                }
            }
        }
    };

    match exit {
        TickerExit::Finished | TickerExit::Cancelled => {
            let cursor = store.lock().map(|s| s.cursor()).unwrap_or_default();
            tracing::info!(?exit, %cursor, "playback ended");
            Ok(())
        }
        TickerExit::StoreUnavailable => bail!("timeline store became unavailable"),
        TickerExit::SurfaceLost => bail!("render surface stopped responding"),
    }
}
