use super::{CatalogClient, CatalogError, build_agent};
use crate::config::Config;
use crate::models::{
    CandidateTrack, SpotifyCreatedPlaylist, SpotifySearchResponse, SpotifyUser,
};
use log::debug;
use ureq::Agent;
use urlencoding::encode;

/// A Spotify Web API client using a bearer access token
pub struct SpotifyClient {
    agent: Agent,
    base_url: String,
    access_token: String,
}

impl SpotifyClient {
    pub fn new(config: Config) -> Self {
        let agent = build_agent(&config);

        SpotifyClient {
            agent,
            base_url: config.api_base,
            access_token: config.access_token,
        }
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Id of the user owning the access token
    fn current_user_id(&self) -> Result<String, CatalogError> {
        let url = format!("{}/me", self.base_url);

        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.authorization())
            .call()?;
        let response_text = response.into_string()?;

        let user: SpotifyUser = serde_json::from_str(&response_text)?;
        Ok(user.id)
    }
}

impl CatalogClient for SpotifyClient {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateTrack>, CatalogError> {
        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            self.base_url,
            encode(query),
            limit
        );

        debug!("Spotify search: {query} (limit {limit})");

        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.authorization())
            .call()?;
        let response_text = response.into_string()?;

        let parsed_response: SpotifySearchResponse = serde_json::from_str(&response_text)?;

        match parsed_response.tracks {
            Some(page) => Ok(page
                .items
                .into_iter()
                .take(limit)
                .map(CandidateTrack::from)
                .collect()),
            None => Ok(vec![]),
        }
    }

    fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError> {
        let url = format!("{}/playlists/{}/tracks", self.base_url, encode(playlist_id));

        debug!("Adding {} tracks to Spotify playlist {playlist_id}", uris.len());

        self.agent
            .post(&url)
            .set("Authorization", &self.authorization())
            .send_json(serde_json::json!({ "uris": uris }))?;

        Ok(())
    }

    fn create_playlist(&self, name: &str, description: &str) -> Result<String, CatalogError> {
        let user_id = self.current_user_id()?;
        let url = format!("{}/users/{}/playlists", self.base_url, encode(&user_id));

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization())
            .send_json(serde_json::json!({
                "name": name,
                "public": false,
                "description": description,
            }))?;
        let response_text = response.into_string()?;

        let created: SpotifyCreatedPlaylist = serde_json::from_str(&response_text)?;
        Ok(created.id)
    }
}
