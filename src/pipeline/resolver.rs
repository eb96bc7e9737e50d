use super::ResolverSettings;
use super::scoring::MatchScoring;
use crate::client::{CatalogClient, CatalogError};
use crate::models::{CandidateTrack, Catalog, ResolvedTrack, SongReference};
use log::{debug, warn};
use thiserror::Error;

/// Why a song reference could not be mapped to a catalog track
#[derive(Debug, Error)]
pub enum NotFound {
    #[error("song title or artist is missing")]
    MissingFields,
    #[error("search returned no usable tracks")]
    NoCandidates,
    #[error("best candidate scored {best:.2}, needed more than {threshold:.2}")]
    BelowThreshold { best: f64, threshold: f64 },
    #[error("search failed: {0}")]
    SearchFailed(#[from] CatalogError),
    #[error("resolution task panicked")]
    Panicked,
}

/// Everything a strategy may consult while resolving one song
pub struct SearchContext<'a> {
    pub client: &'a dyn CatalogClient,
    pub catalog: Catalog,
    pub settings: &'a ResolverSettings,
}

impl SearchContext<'_> {
    /// Search and keep only hits whose URI the catalog can actually add
    fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<CandidateTrack>, CatalogError> {
        let hits = self.client.search(query, limit)?;
        let total = hits.len();
        let usable: Vec<CandidateTrack> = hits
            .into_iter()
            .filter(|hit| self.catalog.accepts_uri(&hit.uri))
            .collect();
        if usable.len() < total {
            debug!(
                "Dropped {} results with non-track URIs for query {query}",
                total - usable.len()
            );
        }
        Ok(usable)
    }
}

/// One step of the resolution chain.
///
/// `Ok(Some)` resolves the song, `Ok(None)` hands over to the next step and
/// `Err` ends resolution for this song.
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(
        &self,
        ctx: &SearchContext<'_>,
        song: &SongReference,
    ) -> Result<Option<ResolvedTrack>, NotFound>;
}

/// Use a well-formed pre-supplied id without searching
pub struct KnownId;

impl ResolutionStrategy for KnownId {
    fn name(&self) -> &'static str {
        "known id"
    }

    fn attempt(
        &self,
        ctx: &SearchContext<'_>,
        song: &SongReference,
    ) -> Result<Option<ResolvedTrack>, NotFound> {
        let Some(known_id) = song.known_id.as_deref() else {
            return Ok(None);
        };
        match ctx.catalog.known_id_uri(known_id) {
            Some(uri) => Ok(Some(ResolvedTrack::new(uri))),
            None => {
                debug!("Ignoring malformed {} id '{known_id}' for {song}", ctx.catalog);
                Ok(None)
            }
        }
    }
}

/// Stop before any network call when there is nothing to search for
pub struct RequireFields;

impl ResolutionStrategy for RequireFields {
    fn name(&self) -> &'static str {
        "required fields"
    }

    fn attempt(
        &self,
        _ctx: &SearchContext<'_>,
        song: &SongReference,
    ) -> Result<Option<ResolvedTrack>, NotFound> {
        if song.name.trim().is_empty() || song.artist.trim().is_empty() {
            return Err(NotFound::MissingFields);
        }
        Ok(None)
    }
}

/// Field-scoped search; the first usable hit is taken as-is
pub struct ExactMatch;

impl ResolutionStrategy for ExactMatch {
    fn name(&self) -> &'static str {
        "exact match"
    }

    fn attempt(
        &self,
        ctx: &SearchContext<'_>,
        song: &SongReference,
    ) -> Result<Option<ResolvedTrack>, NotFound> {
        let Some(query) = ctx.catalog.exact_query(song.name.trim(), song.artist.trim()) else {
            return Ok(None);
        };
        let hits = ctx.search_tracks(&query, ctx.settings.exact_limit)?;
        Ok(hits.into_iter().next().map(|hit| ResolvedTrack::new(hit.uri)))
    }
}

/// Unscoped search, then the best fuzzy-scored candidate above the threshold
pub struct BestFuzzyMatch;

impl ResolutionStrategy for BestFuzzyMatch {
    fn name(&self) -> &'static str {
        "fuzzy match"
    }

    fn attempt(
        &self,
        ctx: &SearchContext<'_>,
        song: &SongReference,
    ) -> Result<Option<ResolvedTrack>, NotFound> {
        let settings = ctx.settings;
        let query = ctx.catalog.broad_query(song.name.trim(), song.artist.trim());
        let mut candidates = ctx.search_tracks(&query, settings.broad_limit)?;

        if candidates.is_empty() && settings.title_only_fallback {
            debug!("No results for '{query}', retrying with the title only");
            candidates = ctx.search_tracks(song.name.trim(), settings.broad_limit)?;
        }

        let Some((best, score)) = MatchScoring::best_candidate(song, &candidates, settings) else {
            return Ok(None);
        };

        if score.value() > settings.acceptance_threshold {
            Ok(Some(ResolvedTrack::new(best.uri.clone())))
        } else {
            Err(NotFound::BelowThreshold {
                best: score.value(),
                threshold: settings.acceptance_threshold,
            })
        }
    }
}

/// Maps song references to catalog tracks by running an ordered strategy chain
pub struct Resolver<'a> {
    client: &'a dyn CatalogClient,
    catalog: Catalog,
    settings: ResolverSettings,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl<'a> Resolver<'a> {
    pub fn new(client: &'a dyn CatalogClient, catalog: Catalog, settings: ResolverSettings) -> Self {
        Self::with_strategies(client, catalog, settings, Self::default_chain())
    }

    pub fn with_strategies(
        client: &'a dyn CatalogClient,
        catalog: Catalog,
        settings: ResolverSettings,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
    ) -> Self {
        Resolver {
            client,
            catalog,
            settings,
            strategies,
        }
    }

    /// Known id, field check, exact search, fuzzy search
    pub fn default_chain() -> Vec<Box<dyn ResolutionStrategy>> {
        vec![
            Box::new(KnownId),
            Box::new(RequireFields),
            Box::new(ExactMatch),
            Box::new(BestFuzzyMatch),
        ]
    }

    pub fn catalog(&self) -> Catalog {
        self.catalog
    }

    /// Resolve one song; failures are reported, never raised past this call
    pub fn resolve(&self, song: &SongReference) -> Result<ResolvedTrack, NotFound> {
        let ctx = SearchContext {
            client: self.client,
            catalog: self.catalog,
            settings: &self.settings,
        };

        let outcome = self
            .strategies
            .iter()
            .find_map(|strategy| match strategy.attempt(&ctx, song) {
                Ok(Some(track)) => {
                    debug!("Resolved {song} via {}: {}", strategy.name(), track.catalog_uri);
                    Some(Ok(track))
                }
                Ok(None) => None,
                Err(reason) => Some(Err(reason)),
            })
            .unwrap_or(Err(NotFound::NoCandidates));

        match &outcome {
            Err(NotFound::SearchFailed(err)) => {
                warn!("Error finding {} track for {song}: {err}", self.catalog)
            }
            Err(reason) => warn!("No {} track for {song}: {reason}", self.catalog),
            Ok(_) => {}
        }
        outcome
    }
}
