/// OMDb API provider
///
/// Looks up rating/poster data by title and year via OMDb's `t`/`y` query
/// parameters. OMDb reports misses in-band (`"Response": "False"`) and fills
/// absent fields with the literal `"N/A"`; both map to empty data here.
///
/// The free tier allows 1,000 requests per day, so calls are guarded by a
/// Redis usage counter and refused over quota. Enrichment callers absorb the
/// refusal like any other provider failure.
use chrono::Utc;
use redis::AsyncCommands;
use redis::Client as RedisClient;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{RatingLookup, SourceRating};
use crate::services::providers::RatingProvider;

const DAILY_QUOTA: u32 = 1_000;

// Usage keys are per-day; keep them around briefly for inspection.
const USAGE_KEY_TTL: i64 = 2 * 86_400;

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    redis_client: RedisClient,
    api_key: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    imdb_votes: Option<String>,
    #[serde(rename = "Metascore")]
    metascore: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Ratings", default)]
    ratings: Vec<OmdbRating>,
}

#[derive(Debug, Deserialize)]
struct OmdbRating {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Value")]
    value: String,
}

impl OmdbProvider {
    pub fn new(redis_client: RedisClient, config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            redis_client,
            api_key: config.omdb_api_key.clone(),
            api_url: config.omdb_api_url.clone(),
        })
    }

    /// Maps the raw OMDb payload to a lookup result, dropping "N/A" fields
    fn convert_response(body: OmdbResponse) -> RatingLookup {
        if body.response.as_deref() == Some("False") {
            return RatingLookup::default();
        }

        RatingLookup {
            title: body.title,
            imdb_rating: none_if_na(body.imdb_rating),
            imdb_votes: none_if_na(body.imdb_votes),
            metascore: none_if_na(body.metascore),
            poster: none_if_na(body.poster),
            ratings: body
                .ratings
                .into_iter()
                .map(|rating| SourceRating {
                    source: rating.source,
                    rating: rating.value,
                })
                .collect(),
        }
    }

    /// Checks the daily usage counter before an outbound call
    async fn check_rate_limit(&self) -> AppResult<()> {
        let day_key = usage_key();
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let count: u32 = conn.get(&day_key).await.unwrap_or(0);

        if count >= DAILY_QUOTA {
            tracing::error!(current = count, quota = DAILY_QUOTA, "OMDb daily quota exceeded");
            return Err(AppError::ExternalApi(
                "OMDb quota exceeded for today".to_string(),
            ));
        }

        if count as f32 / DAILY_QUOTA as f32 > 0.8 {
            tracing::warn!(
                current = count,
                quota = DAILY_QUOTA,
                remaining = DAILY_QUOTA - count,
                "OMDb quota at 80%"
            );
        }

        Ok(())
    }

    async fn increment_usage(&self) -> AppResult<()> {
        let day_key = usage_key();
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let _: () = conn.incr(&day_key, 1u32).await?;
        let _: () = conn.expire(&day_key, USAGE_KEY_TTL).await?;

        Ok(())
    }
}

fn usage_key() -> String {
    format!("omdb_usage:{}", Utc::now().format("%Y-%m-%d"))
}

fn none_if_na(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "N/A")
}

#[async_trait::async_trait]
impl RatingProvider for OmdbProvider {
    async fn lookup(&self, name: &str, year: Option<i32>) -> AppResult<RatingLookup> {
        self.check_rate_limit().await?;

        let mut params = vec![
            ("apikey", self.api_key.clone()),
            ("t", name.to_string()),
            ("plot", "full".to_string()),
        ];
        if let Some(year) = year {
            params.push(("y", year.to_string()));
        }

        tracing::debug!(title = %name, year = ?year, "Fetching from OMDb");

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(title = %name, status = %status, body = %body, "OMDb request failed");
            return Err(AppError::ExternalApi(format!(
                "OMDb returned status {}: {}",
                status, body
            )));
        }

        let body: OmdbResponse = response.json().await?;

        self.increment_usage().await?;

        let lookup = Self::convert_response(body);

        tracing::debug!(
            title = %name,
            has_data = lookup.has_data(),
            sources = lookup.ratings.len(),
            provider = "omdb",
            "Rating lookup completed"
        );

        Ok(lookup)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_response_maps_fields() {
        let json = r#"{
            "Title": "Inception",
            "Response": "True",
            "imdbRating": "8.8",
            "imdbVotes": "2,400,000",
            "Metascore": "74",
            "Poster": "https://img.omdbapi.com/inception.jpg",
            "Ratings": [
                {"Source": "Internet Movie Database", "Value": "8.8/10"},
                {"Source": "Rotten Tomatoes", "Value": "87%"}
            ]
        }"#;

        let body: OmdbResponse = serde_json::from_str(json).unwrap();
        let lookup = OmdbProvider::convert_response(body);

        assert_eq!(lookup.title.as_deref(), Some("Inception"));
        assert_eq!(lookup.imdb_rating.as_deref(), Some("8.8"));
        assert_eq!(lookup.metascore.as_deref(), Some("74"));
        assert_eq!(lookup.ratings.len(), 2);
        assert_eq!(lookup.ratings[1].source, "Rotten Tomatoes");
        assert!(lookup.has_data());
    }

    #[test]
    fn test_convert_response_not_found_is_empty() {
        let json = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let body: OmdbResponse = serde_json::from_str(json).unwrap();
        let lookup = OmdbProvider::convert_response(body);

        assert_eq!(lookup, RatingLookup::default());
        assert!(!lookup.has_data());
    }

    #[test]
    fn test_convert_response_drops_na_fields() {
        let json = r#"{
            "Title": "Obscure Short",
            "Response": "True",
            "imdbRating": "N/A",
            "imdbVotes": "N/A",
            "Metascore": "N/A",
            "Poster": "N/A",
            "Ratings": []
        }"#;

        let body: OmdbResponse = serde_json::from_str(json).unwrap();
        let lookup = OmdbProvider::convert_response(body);

        assert_eq!(lookup.imdb_rating, None);
        assert_eq!(lookup.poster, None);
        assert!(!lookup.has_data());
    }

    #[test]
    fn test_none_if_na() {
        assert_eq!(none_if_na(Some("8.8".to_string())), Some("8.8".to_string()));
        assert_eq!(none_if_na(Some("N/A".to_string())), None);
        assert_eq!(none_if_na(Some(String::new())), None);
        assert_eq!(none_if_na(None), None);
    }

    #[test]
    fn test_usage_key_is_daily() {
        let key = usage_key();
        assert!(key.starts_with("omdb_usage:"));
        assert_eq!(key.len(), "omdb_usage:".len() + 10);
    }
}
