//! Best-effort link shortening via a Shlink-style API
//!
//! Shortening is a convenience for links pasted into chat; any failure
//! falls back to the original URL rather than failing the operation.

use crate::config::ShortenerConfig;
use chrono::Utc;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

#[derive(Deserialize)]
struct ShortUrlResponse {
    #[serde(rename = "shortUrl", default)]
    short_url: Option<String>,
}

/// Shorten a URL, tagging the slug with a timestamp and kind
///
/// `kind` labels what the link is for ("invite", "recovery", ...).
/// Returns the original URL when no shortener is configured or the call
/// fails for any reason.
pub fn shorten_url(
    config: Option<&ShortenerConfig>,
    long_url: &str,
    kind: &str,
    label: Option<&str>,
) -> String {
    let Some(config) = config else {
        return long_url.to_string();
    };

    let stamp = Utc::now().format("%d%H%M");
    let slug = match label {
        Some(label) => format!("{}-{}-{}", stamp, kind, label),
        None => format!("{}-{}", stamp, kind),
    };

    let payload = json!({
        "longUrl": long_url,
        "customSlug": slug,
        "findIfExists": true,
    });

    let result = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .and_then(|client| {
            client
                .post(&config.api_url)
                .header("X-Api-Key", &config.api_token)
                .header("Accept", "application/json")
                .json(&payload)
                .send()
        })
        .and_then(|response| response.json::<ShortUrlResponse>());

    match result {
        Ok(ShortUrlResponse {
            short_url: Some(url),
        }) => url.replacen("http://", "https://", 1),
        Ok(_) => long_url.to_string(),
        Err(e) => {
            warn!("URL shortening failed, using long URL: {}", e);
            long_url.to_string()
        }
    }
}
