use super::{CatalogClient, CatalogError, build_agent};
use crate::config::Config;
use crate::models::CandidateTrack;
use log::debug;
use serde_json::{Value, json};
use ureq::Agent;

/// Search params that restrict InnerTube results to the "Songs" shelf
const SONGS_FILTER_PARAMS: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";

/// A YouTube Music client speaking the InnerTube JSON API
pub struct YouTubeMusicClient {
    agent: Agent,
    base_url: String,
    access_token: String,
    client_version: String,
}

impl YouTubeMusicClient {
    pub fn new(config: Config) -> Self {
        let agent = build_agent(&config);

        YouTubeMusicClient {
            agent,
            base_url: config.api_base,
            access_token: config.access_token,
            client_version: config.client_version,
        }
    }

    fn context(&self) -> Value {
        json!({
            "client": {
                "clientName": "WEB_REMIX",
                "clientVersion": self.client_version,
                "hl": "en",
            }
        })
    }

    /// POST `body` to an InnerTube endpoint and parse the JSON reply
    fn post(&self, endpoint: &str, mut body: Value) -> Result<Value, CatalogError> {
        let url = format!("{}/{}?prettyPrint=false", self.base_url, endpoint);
        body["context"] = self.context();

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .set("X-Origin", "https://music.youtube.com")
            .send_json(body)?;
        let response_text = response.into_string()?;

        Ok(serde_json::from_str(&response_text)?)
    }
}

impl CatalogClient for YouTubeMusicClient {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateTrack>, CatalogError> {
        debug!("YouTube Music search: {query} (limit {limit})");

        let response = self.post(
            "search",
            json!({ "query": query, "params": SONGS_FILTER_PARAMS }),
        )?;

        let mut candidates = parse_search_results(&response);
        candidates.truncate(limit);
        Ok(candidates)
    }

    fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError> {
        let playlist_id = playlist_id.strip_prefix("VL").unwrap_or(playlist_id);
        let actions: Vec<Value> = uris
            .iter()
            .map(|video_id| {
                json!({
                    "action": "ACTION_ADD_VIDEO",
                    "addedVideoId": video_id,
                    "dedupeOption": "DEDUPE_OPTION_SKIP",
                })
            })
            .collect();

        debug!("Adding {} videos to YouTube Music playlist {playlist_id}", uris.len());

        let response = self.post(
            "browse/edit_playlist",
            json!({ "playlistId": playlist_id, "actions": actions }),
        )?;

        check_edit_status(&response)
    }

    fn create_playlist(&self, name: &str, description: &str) -> Result<String, CatalogError> {
        let response = self.post(
            "playlist/create",
            json!({
                "title": name,
                "description": description,
                "privacyStatus": "PRIVATE",
            }),
        )?;

        response
            .get("playlistId")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| CatalogError::Decode("no playlistId in create response".to_string()))
    }
}

/// An `edit_playlist` reply only counts as applied when it says so
fn check_edit_status(response: &Value) -> Result<(), CatalogError> {
    match response.get("status").and_then(|s| s.as_str()) {
        Some("STATUS_SUCCEEDED") => Ok(()),
        Some(status) => Err(CatalogError::Rejected {
            status: 200,
            body: format!("edit_playlist returned {status}"),
        }),
        None => Err(CatalogError::Decode(
            "edit_playlist reply has no status".to_string(),
        )),
    }
}

/// Pull song candidates out of an InnerTube search response
pub fn parse_search_results(response: &Value) -> Vec<CandidateTrack> {
    response
        .pointer("/contents/tabbedSearchResultsRenderer/tabs")
        .and_then(|t| t.as_array())
        .into_iter()
        .flatten()
        .filter_map(|tab| {
            tab.pointer("/tabRenderer/content/sectionListRenderer/contents")
                .and_then(|c| c.as_array())
        })
        .flatten()
        .filter_map(|section| {
            section
                .pointer("/musicShelfRenderer/contents")
                .and_then(|c| c.as_array())
        })
        .flatten()
        .filter_map(|item| item.get("musicResponsiveListItemRenderer"))
        .filter_map(parse_list_item)
        .collect()
}

fn parse_list_item(renderer: &Value) -> Option<CandidateTrack> {
    let video_id = renderer
        .pointer("/playlistItemData/videoId")
        .or_else(|| {
            renderer.pointer(
                "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
            )
        })
        .and_then(|v| v.as_str())?;

    let title = renderer
        .pointer("/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")
        .and_then(|t| t.as_str())?;

    let runs: &[Value] = renderer
        .pointer("/flexColumns/1/musicResponsiveListItemFlexColumnRenderer/text/runs")
        .and_then(|r| r.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    // Artist runs link to a channel; album and duration runs don't
    let mut artists: Vec<String> = runs
        .iter()
        .filter(|run| {
            run.pointer("/navigationEndpoint/browseEndpoint/browseId")
                .and_then(|id| id.as_str())
                .is_some_and(|id| id.starts_with("UC"))
        })
        .filter_map(|run| run.get("text").and_then(|t| t.as_str()))
        .map(str::to_string)
        .collect();

    if artists.is_empty() {
        if let Some(first) = runs.first().and_then(|r| r.get("text")).and_then(|t| t.as_str()) {
            artists.push(first.to_string());
        }
    }

    Some(CandidateTrack {
        title: title.to_string(),
        artists,
        uri: video_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_item(video_id: Option<&str>, title: &str, artist_runs: Value) -> Value {
        let mut renderer = json!({
            "flexColumns": [
                {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": title}]}}},
                {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": artist_runs}}}
            ]
        });
        if let Some(id) = video_id {
            renderer["playlistItemData"] = json!({ "videoId": id });
        }
        json!({ "musicResponsiveListItemRenderer": renderer })
    }

    fn search_response(items: Vec<Value>) -> Value {
        json!({
            "contents": {
                "tabbedSearchResultsRenderer": {
                    "tabs": [{
                        "tabRenderer": {
                            "content": {
                                "sectionListRenderer": {
                                    "contents": [
                                        {"itemSectionRenderer": {}},
                                        {"musicShelfRenderer": {"contents": items}}
                                    ]
                                }
                            }
                        }
                    }]
                }
            }
        })
    }

    fn artist_run(name: &str, channel: &str) -> Value {
        json!({
            "text": name,
            "navigationEndpoint": {"browseEndpoint": {"browseId": channel}}
        })
    }

    #[test]
    fn test_parses_songs_shelf() {
        let response = search_response(vec![
            list_item(
                Some("NrgmdOz227I"),
                "Yesterday",
                json!([
                    artist_run("The Beatles", "UCc4K7bAqpdBP8jh1j9XZAww"),
                    {"text": " • "},
                    {"text": "Help!", "navigationEndpoint": {"browseEndpoint": {"browseId": "MPREb_album"}}},
                    {"text": " • "},
                    {"text": "2:06"}
                ]),
            ),
            list_item(
                Some("a01QQZyl-_I"),
                "Under Pressure",
                json!([
                    artist_run("Queen", "UCiMhD4jzUqG-IgPzUmmytRQ"),
                    {"text": " & "},
                    artist_run("David Bowie", "UC8YgWcDKi1rLbQ1OtrOHeDw")
                ]),
            ),
        ]);

        let candidates = parse_search_results(&response);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].uri, "NrgmdOz227I");
        assert_eq!(candidates[0].title, "Yesterday");
        assert_eq!(candidates[0].artists, vec!["The Beatles"]);
        assert_eq!(candidates[1].artists, vec!["Queen", "David Bowie"]);
    }

    #[test]
    fn test_skips_items_without_video_id() {
        let response = search_response(vec![list_item(
            None,
            "Some Podcast",
            json!([{"text": "Someone"}]),
        )]);
        assert!(parse_search_results(&response).is_empty());
    }

    #[test]
    fn test_unlinked_artist_falls_back_to_first_run() {
        let response = search_response(vec![list_item(
            Some("NrgmdOz227I"),
            "Yesterday",
            json!([{"text": "The Beatles"}, {"text": " • "}, {"text": "2:06"}]),
        )]);
        let candidates = parse_search_results(&response);
        assert_eq!(candidates[0].artists, vec!["The Beatles"]);
    }

    #[test]
    fn test_empty_response() {
        assert!(parse_search_results(&json!({})).is_empty());
    }

    #[test]
    fn test_edit_status_requires_success() {
        assert!(check_edit_status(&json!({"status": "STATUS_SUCCEEDED"})).is_ok());
        assert!(matches!(
            check_edit_status(&json!({"status": "STATUS_FAILED"})),
            Err(CatalogError::Rejected { status: 200, .. })
        ));
        assert!(matches!(
            check_edit_status(&json!({"playlistEditResults": []})),
            Err(CatalogError::Decode(_))
        ));
    }
}
