use super::CommitSettings;
use super::pacing::{Sleeper, backoff_delay};
use crate::client::{CatalogClient, CatalogError};
use crate::models::ResolvedTrack;
use log::{debug, info, warn};
use thiserror::Error;

/// A commit that stopped partway; `added` tracks stay in the playlist
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("invalid commit request: {0}")]
    InvalidInput(String),
    #[error("chunk {chunk} rejected after {added} tracks were added: {source}")]
    Fatal {
        chunk: usize,
        added: usize,
        #[source]
        source: CatalogError,
    },
    #[error("chunk {chunk} still failing after {attempts} attempts ({added} tracks added): {source}")]
    RetriesExhausted {
        chunk: usize,
        attempts: u32,
        added: usize,
        #[source]
        source: CatalogError,
    },
}

impl CommitError {
    /// Tracks committed before the failure
    pub fn added(&self) -> usize {
        match self {
            CommitError::InvalidInput(_) => 0,
            CommitError::Fatal { added, .. } | CommitError::RetriesExhausted { added, .. } => *added,
        }
    }
}

/// Writes resolved tracks to a playlist in bounded chunks, one chunk at a time
pub struct Committer<'a> {
    client: &'a dyn CatalogClient,
    settings: CommitSettings,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Committer<'a> {
    pub fn new(client: &'a dyn CatalogClient, settings: CommitSettings, sleeper: &'a dyn Sleeper) -> Self {
        Committer {
            client,
            settings,
            sleeper,
        }
    }

    /// Add every track, returning how many landed in the playlist.
    ///
    /// A chunk that is rejected, or still failing after the last attempt,
    /// aborts the remaining chunks. Earlier chunks are not rolled back.
    pub fn commit(&self, playlist_id: &str, tracks: &[ResolvedTrack]) -> Result<usize, CommitError> {
        if playlist_id.trim().is_empty() {
            return Err(CommitError::InvalidInput("playlist id is empty".to_string()));
        }
        if tracks.is_empty() {
            return Ok(0);
        }

        let chunk_size = self.settings.chunk_size.max(1);
        let chunk_count = tracks.len().div_ceil(chunk_size);
        let mut added = 0;

        for (index, chunk) in tracks.chunks(chunk_size).enumerate() {
            let uris: Vec<String> = chunk.iter().map(|t| t.catalog_uri.clone()).collect();
            debug!(
                "Committing chunk {}/{} ({} tracks) to {playlist_id}",
                index + 1,
                chunk_count,
                uris.len()
            );
            self.add_chunk_with_retry(playlist_id, &uris, index + 1, added)?;
            added += uris.len();
        }

        info!("Added {added} of {} tracks to playlist {playlist_id}", tracks.len());
        Ok(added)
    }

    fn add_chunk_with_retry(
        &self,
        playlist_id: &str,
        uris: &[String],
        chunk: usize,
        added: usize,
    ) -> Result<(), CommitError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match self.client.add_items(playlist_id, uris) {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(CommitError::Fatal {
                    chunk,
                    added,
                    source: err,
                });
            }
            if attempt >= max_attempts {
                return Err(CommitError::RetriesExhausted {
                    chunk,
                    attempts: attempt,
                    added,
                    source: err,
                });
            }

            let base = err.retry_after().unwrap_or(self.settings.default_wait());
            let wait = backoff_delay(base, self.settings.backoff_multiplier, attempt - 1);
            warn!(
                "Chunk {chunk} failed ({err}), retrying in {:?} (attempt {}/{})",
                wait,
                attempt + 1,
                max_attempts
            );
            self.sleeper.sleep(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCatalogClient;
    use crate::pipeline::pacing::MockSleeper;
    use mockall::Sequence;
    use std::time::Duration;

    fn settings() -> CommitSettings {
        CommitSettings {
            chunk_size: 50,
            max_attempts: 3,
            default_wait_secs: 5,
            backoff_multiplier: 2,
        }
    }

    fn tracks(count: usize) -> Vec<ResolvedTrack> {
        (0..count)
            .map(|i| ResolvedTrack::new(format!("spotify:track:{i:0>22}")))
            .collect()
    }

    fn rate_limited(retry_after: Option<u64>) -> CatalogError {
        CatalogError::RateLimited { retry_after }
    }

    #[test]
    fn test_splits_into_bounded_chunks() {
        let mut client = MockCatalogClient::new();
        let mut seq = Sequence::new();
        for expected in [50usize, 50, 20] {
            client
                .expect_add_items()
                .withf(move |id, uris| id == "playlist" && uris.len() == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();

        let committer = Committer::new(&client, settings(), &sleeper);
        assert_eq!(committer.commit("playlist", &tracks(120)).unwrap(), 120);
    }

    #[test]
    fn test_chunks_keep_track_order() {
        let mut client = MockCatalogClient::new();
        client
            .expect_add_items()
            .withf(|_, uris| uris.first().map(String::as_str) == Some("spotify:track:0000000000000000000000"))
            .times(1)
            .returning(|_, _| Ok(()));
        client
            .expect_add_items()
            .withf(|_, uris| uris.first().map(String::as_str) == Some("spotify:track:0000000000000000000050"))
            .times(1)
            .returning(|_, _| Ok(()));
        let sleeper = MockSleeper::new();

        let committer = Committer::new(&client, settings(), &sleeper);
        assert_eq!(committer.commit("playlist", &tracks(60)).unwrap(), 60);
    }

    #[test]
    fn test_rate_limit_twice_then_success() {
        let mut client = MockCatalogClient::new();
        let mut seq = Sequence::new();
        client
            .expect_add_items()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(rate_limited(None)));
        client
            .expect_add_items()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut sleeper = MockSleeper::new();
        let mut sleeps = Sequence::new();
        sleeper
            .expect_sleep()
            .withf(|d| *d == Duration::from_secs(5))
            .times(1)
            .in_sequence(&mut sleeps)
            .return_const(());
        sleeper
            .expect_sleep()
            .withf(|d| *d == Duration::from_secs(10))
            .times(1)
            .in_sequence(&mut sleeps)
            .return_const(());

        let committer = Committer::new(&client, settings(), &sleeper);
        assert_eq!(committer.commit("playlist", &tracks(10)).unwrap(), 10);
    }

    #[test]
    fn test_retry_after_hint_sets_base_wait() {
        let mut client = MockCatalogClient::new();
        let mut seq = Sequence::new();
        client
            .expect_add_items()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(rate_limited(Some(2))));
        client
            .expect_add_items()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_sleep()
            .withf(|d| *d == Duration::from_secs(2))
            .times(1)
            .return_const(());

        let committer = Committer::new(&client, settings(), &sleeper);
        assert_eq!(committer.commit("playlist", &tracks(3)).unwrap(), 3);
    }

    #[test]
    fn test_exhausted_retries_stop_the_commit() {
        let mut client = MockCatalogClient::new();
        let mut seq = Sequence::new();
        client
            .expect_add_items()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        client
            .expect_add_items()
            .times(3)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Err(CatalogError::Server {
                    status: 502,
                    body: "bad gateway".to_string(),
                })
            });

        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().times(2).return_const(());

        let committer = Committer::new(&client, settings(), &sleeper);
        let err = committer.commit("playlist", &tracks(120)).unwrap_err();
        assert!(matches!(
            err,
            CommitError::RetriesExhausted {
                chunk: 2,
                attempts: 3,
                added: 50,
                ..
            }
        ));
        assert_eq!(err.added(), 50);
    }

    #[test]
    fn test_rejection_is_not_retried() {
        let mut client = MockCatalogClient::new();
        client.expect_add_items().times(1).returning(|_, _| {
            Err(CatalogError::Rejected {
                status: 404,
                body: "no such playlist".to_string(),
            })
        });
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();

        let committer = Committer::new(&client, settings(), &sleeper);
        let err = committer.commit("playlist", &tracks(120)).unwrap_err();
        assert!(matches!(err, CommitError::Fatal { chunk: 1, added: 0, .. }));
    }

    #[test]
    fn test_transport_failure_is_not_resent() {
        let mut client = MockCatalogClient::new();
        client
            .expect_add_items()
            .times(1)
            .returning(|_, _| Err(CatalogError::Transport("timed out reading response".to_string())));
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();

        let committer = Committer::new(&client, settings(), &sleeper);
        let err = committer.commit("playlist", &tracks(10)).unwrap_err();
        assert!(matches!(
            err,
            CommitError::Fatal {
                chunk: 1,
                added: 0,
                source: CatalogError::Transport(_)
            }
        ));
    }

    #[test]
    fn test_empty_inputs() {
        let mut client = MockCatalogClient::new();
        client.expect_add_items().never();
        let sleeper = MockSleeper::new();

        let committer = Committer::new(&client, settings(), &sleeper);
        assert_eq!(committer.commit("playlist", &[]).unwrap(), 0);
        assert!(matches!(
            committer.commit("  ", &tracks(1)),
            Err(CommitError::InvalidInput(_))
        ));
    }
}
