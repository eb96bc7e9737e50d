use serde::{Deserialize, Serialize};

const SPOTIFY_TRACK_PREFIX: &str = "spotify:track:";
const SPOTIFY_ID_LEN: usize = 22;
const YOUTUBE_VIDEO_ID_LEN: usize = 11;

/// A song suggested by the recommendation step, not yet tied to any catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongReference {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, alias = "spotify_id", alias = "video_id", skip_serializing_if = "Option::is_none")]
    pub known_id: Option<String>,
}

impl SongReference {
    pub fn new(name: &str, artist: &str) -> Self {
        SongReference {
            name: name.to_string(),
            artist: artist.to_string(),
            known_id: None,
        }
    }

    pub fn with_known_id(mut self, id: &str) -> Self {
        self.known_id = Some(id.to_string());
        self
    }

    /// Load song references from a JSON array file, or from stdin when `path` is `-`
    pub fn load_all_from_file(path: &str) -> anyhow::Result<Vec<SongReference>> {
        let content = if path == "-" {
            std::io::read_to_string(std::io::stdin())?
        } else {
            std::fs::read_to_string(path)?
        };
        let songs: Vec<SongReference> = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse song list '{}': {}", path, e))?;
        Ok(songs)
    }

    /// Drop repeated (name, artist) pairs, keeping the first occurrence
    pub fn dedupe(songs: Vec<SongReference>) -> Vec<SongReference> {
        let mut seen = std::collections::HashSet::new();
        songs
            .into_iter()
            .filter(|song| {
                seen.insert((
                    song.name.trim().to_lowercase(),
                    song.artist.trim().to_lowercase(),
                ))
            })
            .collect()
    }
}

impl std::fmt::Display for SongReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' by '{}'", self.name.trim(), self.artist.trim())
    }
}

/// A catalog-specific track identifier ready to be added to a playlist
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub catalog_uri: String,
}

impl ResolvedTrack {
    pub fn new(catalog_uri: impl Into<String>) -> Self {
        ResolvedTrack {
            catalog_uri: catalog_uri.into(),
        }
    }
}

/// One search hit, only alive while candidates are being scored
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTrack {
    pub title: String,
    pub artists: Vec<String>,
    pub uri: String,
}

/// The streaming services a playlist can be saved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Catalog {
    Spotify,
    #[value(name = "youtube-music", alias = "ytmusic")]
    YouTubeMusic,
}

impl Catalog {
    pub fn display_name(&self) -> &'static str {
        match self {
            Catalog::Spotify => "Spotify",
            Catalog::YouTubeMusic => "YouTube Music",
        }
    }

    /// Turn a pre-supplied identifier into a playable URI, if it is well-formed
    pub fn known_id_uri(&self, known_id: &str) -> Option<String> {
        let id = known_id.trim();
        match self {
            Catalog::Spotify => {
                let id = id.strip_prefix(SPOTIFY_TRACK_PREFIX).unwrap_or(id);
                is_spotify_id(id).then(|| format!("{SPOTIFY_TRACK_PREFIX}{id}"))
            }
            Catalog::YouTubeMusic => is_youtube_video_id(id).then(|| id.to_string()),
        }
    }

    /// Whether a search result URI points at a track this catalog can add
    pub fn accepts_uri(&self, uri: &str) -> bool {
        match self {
            Catalog::Spotify => uri
                .strip_prefix(SPOTIFY_TRACK_PREFIX)
                .is_some_and(is_spotify_id),
            Catalog::YouTubeMusic => is_youtube_video_id(uri),
        }
    }

    /// Field-scoped query, for catalogs whose search syntax supports one
    pub fn exact_query(&self, name: &str, artist: &str) -> Option<String> {
        match self {
            Catalog::Spotify => Some(format!(
                "track:\"{}\" artist:\"{}\"",
                name.replace('"', ""),
                artist.replace('"', "")
            )),
            Catalog::YouTubeMusic => None,
        }
    }

    pub fn broad_query(&self, name: &str, artist: &str) -> String {
        format!("{name} {artist}").trim().to_string()
    }

    /// Largest number of items a single add call accepts
    pub fn max_items_per_add(&self) -> usize {
        match self {
            Catalog::Spotify => 100,
            Catalog::YouTubeMusic => 50,
        }
    }
}

impl std::fmt::Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

fn is_spotify_id(id: &str) -> bool {
    id.len() == SPOTIFY_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_youtube_video_id(id: &str) -> bool {
    id.len() == YOUTUBE_VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Response structure for the Spotify search endpoint
#[derive(Debug, Deserialize)]
pub struct SpotifySearchResponse {
    pub tracks: Option<SpotifyTrackPage>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyTrackPage {
    #[serde(default)]
    pub items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyTrack {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

impl From<SpotifyTrack> for CandidateTrack {
    fn from(track: SpotifyTrack) -> Self {
        CandidateTrack {
            title: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            uri: track.uri,
        }
    }
}

/// Response structure for `GET /me`
#[derive(Debug, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
}

/// Response structure for playlist creation
#[derive(Debug, Deserialize)]
pub struct SpotifyCreatedPlaylist {
    pub id: String,
}
