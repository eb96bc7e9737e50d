use super::ResolverSettings;
use crate::models::{CandidateTrack, SongReference};
use log::debug;

/// Combined title/artist similarity of a candidate, in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MatchScore(f64);

impl MatchScore {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Fuzzy matching of search candidates against a song reference
pub struct MatchScoring;

impl MatchScoring {
    /// Lowercase and collapse whitespace so casing and spacing never cost points
    fn normalize(text: &str) -> String {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Normalized Levenshtein similarity of two strings (1.0 = identical)
    pub fn similarity(a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(&Self::normalize(a), &Self::normalize(b))
    }

    /// Best similarity against any credited artist
    pub fn artist_similarity(query_artist: &str, candidate_artists: &[String]) -> f64 {
        candidate_artists
            .iter()
            .map(|artist| Self::similarity(query_artist, artist))
            .fold(0.0, f64::max)
    }

    pub fn score(
        song: &SongReference,
        candidate: &CandidateTrack,
        settings: &ResolverSettings,
    ) -> MatchScore {
        let title_similarity = Self::similarity(&song.name, &candidate.title);
        let artist_similarity = Self::artist_similarity(&song.artist, &candidate.artists);
        let combined =
            title_similarity * settings.title_weight + artist_similarity * settings.artist_weight;
        MatchScore(combined.clamp(0.0, 1.0))
    }

    /// Highest scoring candidate; ties go to the catalog's earlier (more relevant) hit
    pub fn best_candidate<'a>(
        song: &SongReference,
        candidates: &'a [CandidateTrack],
        settings: &ResolverSettings,
    ) -> Option<(&'a CandidateTrack, MatchScore)> {
        let mut best: Option<(&CandidateTrack, MatchScore)> = None;
        for candidate in candidates {
            let score = Self::score(song, candidate, settings);
            debug!(
                "  candidate '{}' by {:?}: {:.3}",
                candidate.title,
                candidate.artists,
                score.value()
            );
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }
        best
    }
}
