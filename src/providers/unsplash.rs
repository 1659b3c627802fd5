//! Unsplash photo search.

use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::Deserialize;

use super::{ImageHit, ImageSearchProvider, Orientation};
use crate::config::ProviderSettings;
use crate::error::ProviderError;

const UNSPLASH_API: &str = "https://api.unsplash.com";

pub struct UnsplashClient {
    http: reqwest::Client,
    access_key: String,
    base_url: String,
}

impl UnsplashClient {
    pub fn new(access_key: impl Into<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(Self {
            http,
            access_key: access_key.into(),
            base_url: UNSPLASH_API.to_string(),
        })
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let key = settings
            .unsplash_access_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential("RECIPE_UNSPLASH_ACCESS_KEY"))?;
        Self::new(key)
    }

    async fn search_photos(
        &self,
        query: &str,
        orientation: Orientation,
    ) -> Result<Option<ImageHit>, ProviderError> {
        let resp = self
            .http
            .get(format!("{}/search/photos", self.base_url))
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("orientation", orientation.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let page: SearchPage = resp.json().await?;
        Ok(page.results.into_iter().next().map(|photo| ImageHit {
            base_url: photo.urls.raw,
        }))
    }
}

impl ImageSearchProvider for UnsplashClient {
    fn search<'a>(
        &'a self,
        query: &'a str,
        orientation: Orientation,
    ) -> BoxFuture<'a, Result<Option<ImageHit>, ProviderError>> {
        self.search_photos(query, orientation).boxed()
    }
}

#[derive(Deserialize)]
struct SearchPage {
    results: Vec<Photo>,
}

#[derive(Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Deserialize)]
struct PhotoUrls {
    raw: String,
}
