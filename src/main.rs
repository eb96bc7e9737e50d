use anyhow::Result;
use clap::Parser;

mod client;
mod config;
mod models;
mod pipeline;


use crate::client::CatalogClient;
use crate::config::load_config;
use crate::models::{Catalog, SongReference};
use crate::pipeline::{
    Committer, FanOutCoordinator, PipelineSettings, Resolver, ThreadSleeper,
};

#[derive(Parser)]
#[command(name = "mood-playlist")]
#[command(about = "Save recommended songs to a Spotify or YouTube Music playlist")]
#[command(version)]
struct Args {
    /// Streaming service to save the playlist to
    #[arg(short = 'C', long = "catalog", value_enum)]
    catalog: Catalog,

    /// JSON array of {"name", "artist"} songs; `-` reads stdin
    #[arg(short = 's', long = "songs")]
    songs_file: String,

    /// Existing playlist to add the songs to
    #[arg(short = 'p', long = "playlist-id", conflicts_with = "playlist_name")]
    playlist_id: Option<String>,

    /// Create a new private playlist with this name
    #[arg(short = 'n', long = "playlist-name")]
    playlist_name: Option<String>,

    /// Description for a newly created playlist
    #[arg(long = "description", default_value = "Playlist created from song recommendations")]
    description: String,

    /// JSON file overriding the catalog's pipeline settings
    #[arg(long = "settings")]
    settings_file: Option<String>,

    /// Resolve songs and print the matches without touching any playlist
    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,

    /// Verbose mode - log every search and candidate score
    #[arg(short = 'v', long = "verbose", conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet mode - only log warnings and errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        log::LevelFilter::Debug
    } else if args.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    let mut builder = colog::default_builder();
    builder.filter(None, level);
    builder.init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    if !args.dry_run && args.playlist_id.is_none() && args.playlist_name.is_none() {
        return Err(anyhow::anyhow!(
            "Either --playlist-id or --playlist-name is required unless --dry-run is set"
        ));
    }

    let settings = match &args.settings_file {
        Some(path) => PipelineSettings::load_from_file(path, args.catalog)?,
        None => PipelineSettings::for_catalog(args.catalog),
    };

    let songs = SongReference::load_all_from_file(&args.songs_file)?;
    let total_input = songs.len();
    let songs = SongReference::dedupe(songs);
    if songs.len() < total_input {
        println!("Skipping {} duplicate songs", total_input - songs.len());
    }
    if songs.is_empty() {
        return Err(anyhow::anyhow!("No songs to resolve in '{}'", args.songs_file));
    }

    // Load configuration from .env
    let config = load_config(args.catalog)?;
    let client = client::connect(config);
    let sleeper = ThreadSleeper;

    println!("Searching {} for {} songs...", args.catalog, songs.len());
    let resolver = Resolver::new(client.as_ref(), args.catalog, settings.resolver.clone());
    let coordinator = FanOutCoordinator::new(resolver, settings.fan_out.clone(), &sleeper)?;
    let report = coordinator.resolve_all_detailed(&songs);

    for (song, track) in &report.resolved {
        println!("✓ {song} -> {}", track.catalog_uri);
    }
    for (song, reason) in &report.unresolved {
        println!("✗ {song}: {reason}");
    }
    println!(
        "\nSuccessfully found {} out of {} songs",
        report.resolved.len(),
        report.total()
    );

    if args.dry_run {
        println!("DRY RUN: no playlist was changed");
        return Ok(());
    }

    let tracks = report.tracks();
    if tracks.is_empty() {
        return Err(anyhow::anyhow!("None of the songs could be found on {}", args.catalog));
    }

    let playlist_id = ensure_playlist(client.as_ref(), &args)?;

    let committer = Committer::new(client.as_ref(), settings.commit.clone(), &sleeper);
    match committer.commit(&playlist_id, &tracks) {
        Ok(added) => {
            println!("\n🎉 Added {added} of {} songs to playlist {playlist_id}", songs.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("\n⚠️ Added {} of {} songs before stopping: {e}", e.added(), songs.len());
            Err(e.into())
        }
    }
}

/// Use the given playlist, or create one when only a name was supplied
fn ensure_playlist(client: &dyn CatalogClient, args: &Args) -> Result<String> {
    if let Some(id) = &args.playlist_id {
        return Ok(id.clone());
    }
    let name = args
        .playlist_name
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("No playlist id or name given"))?;

    println!("Creating playlist '{name}' on {}...", args.catalog);
    let id = client
        .create_playlist(name, &args.description)
        .map_err(|e| anyhow::anyhow!("Failed to create playlist '{}': {}", name, e))?;
    println!("✓ Created playlist '{name}' with ID: {id}");
    Ok(id)
}
