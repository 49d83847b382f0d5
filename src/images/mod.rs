//! Recipe photo lookup.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

#[async_trait]
pub trait ImageLookup: Send + Sync {
    async fn find_image(&self, recipe_name: &str) -> anyhow::Result<Option<String>>;
}

/// Used when no Spoonacular key is configured.
pub struct NoImages;

#[async_trait]
impl ImageLookup for NoImages {
    async fn find_image(&self, _recipe_name: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    image: Option<String>,
}

pub struct SpoonacularImages {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SpoonacularImages {
    pub fn new(api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build spoonacular http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: "https://api.spoonacular.com".into(),
        })
    }
}

#[async_trait]
impl ImageLookup for SpoonacularImages {
    async fn find_image(&self, recipe_name: &str) -> anyhow::Result<Option<String>> {
        let res = self
            .http
            .get(format!("{}/recipes/complexSearch", self.base_url))
            .query(&[
                ("query", recipe_name),
                ("number", "1"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("spoonacular search")?
            .error_for_status()
            .context("spoonacular status")?;
        let body: SearchResponse = res.json().await.context("decode spoonacular response")?;
        let url = body.results.into_iter().find_map(|r| r.image);
        debug!(recipe = recipe_name, found = url.is_some(), "image lookup");
        Ok(url)
    }
}

/// Image lookup is best effort; failures are logged and yield no image.
pub async fn image_or_none(lookup: &dyn ImageLookup, recipe_name: &str) -> Option<String> {
    match lookup.find_image(recipe_name).await {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, recipe = recipe_name, "image lookup failed");
            None
        }
    }
}
