use super::FanOutSettings;
use super::pacing::Sleeper;
use super::resolver::{NotFound, Resolver};
use crate::models::{ResolvedTrack, SongReference};
use log::{debug, info};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};

/// Outcome of resolving a batch of song references
#[derive(Debug, Default)]
pub struct FanOutReport {
    pub resolved: Vec<(SongReference, ResolvedTrack)>,
    pub unresolved: Vec<(SongReference, NotFound)>,
}

impl FanOutReport {
    pub fn tracks(&self) -> Vec<ResolvedTrack> {
        self.resolved.iter().map(|(_, track)| track.clone()).collect()
    }

    pub fn total(&self) -> usize {
        self.resolved.len() + self.unresolved.len()
    }
}

/// Resolves many songs at once on a bounded worker pool
pub struct FanOutCoordinator<'a> {
    resolver: Resolver<'a>,
    settings: FanOutSettings,
    sleeper: &'a dyn Sleeper,
    pool: rayon::ThreadPool,
}

impl<'a> FanOutCoordinator<'a> {
    pub fn new(
        resolver: Resolver<'a>,
        settings: FanOutSettings,
        sleeper: &'a dyn Sleeper,
    ) -> anyhow::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.workers.max(1))
            .thread_name(|i| format!("resolver-{i}"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build resolver pool: {}", e))?;

        Ok(FanOutCoordinator {
            resolver,
            settings,
            sleeper,
            pool,
        })
    }

    /// Resolved tracks only; unresolved songs are dropped
    pub fn resolve_all(&self, songs: &[SongReference]) -> Vec<ResolvedTrack> {
        self.resolve_all_detailed(songs).tracks()
    }

    /// Resolve every song, group by group, keeping input order in the report
    pub fn resolve_all_detailed(&self, songs: &[SongReference]) -> FanOutReport {
        let group_size = self.settings.group_size.unwrap_or(songs.len()).max(1);
        let group_count = songs.len().div_ceil(group_size);
        let mut report = FanOutReport::default();

        for (index, group) in songs.chunks(group_size).enumerate() {
            if index > 0 {
                debug!("Pausing {:?} before group {}", self.settings.group_pause(), index + 1);
                self.sleeper.sleep(self.settings.group_pause());
            }
            debug!(
                "Dispatching group {}/{} ({} songs)",
                index + 1,
                group_count,
                group.len()
            );

            for (song, outcome) in group.iter().zip(self.resolve_group(group)) {
                match outcome {
                    Ok(track) => report.resolved.push((song.clone(), track)),
                    Err(reason) => report.unresolved.push((song.clone(), reason)),
                }
            }
        }

        info!(
            "Found {} of {} songs on {}",
            report.resolved.len(),
            songs.len(),
            self.resolver.catalog()
        );
        report
    }

    /// Every song in the group finishes before this returns
    fn resolve_group(&self, group: &[SongReference]) -> Vec<Result<ResolvedTrack, NotFound>> {
        let resolver = &self.resolver;
        self.pool.install(|| {
            group
                .par_iter()
                .map(|song| {
                    panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(song)))
                        .unwrap_or(Err(NotFound::Panicked))
                })
                .collect()
        })
    }
}
