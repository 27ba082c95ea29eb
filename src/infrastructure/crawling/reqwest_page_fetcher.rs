use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::application::ports::{PageFetcher, PageFetcherError};

const MAX_REDIRECTS: usize = 5;

pub struct ReqwestPageFetcher {
    client: Client,
    page_timeout: Duration,
    image_timeout: Duration,
}

impl ReqwestPageFetcher {
    pub fn new(
        user_agent: &str,
        page_timeout: Duration,
        image_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            page_timeout,
            image_timeout,
        })
    }

    async fn get(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> Result<reqwest::Response, PageFetcherError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageFetcherError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

fn request_error(url: &Url, error: reqwest::Error) -> PageFetcherError {
    if error.is_timeout() {
        PageFetcherError::Timeout(url.to_string())
    } else {
        PageFetcherError::RequestFailed {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

fn body_error(url: &Url, error: reqwest::Error) -> PageFetcherError {
    if error.is_timeout() {
        PageFetcherError::Timeout(url.to_string())
    } else {
        PageFetcherError::Body {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for ReqwestPageFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, PageFetcherError> {
        tracing::debug!(url = %url, "Fetching page");
        self.get(url, self.page_timeout)
            .await?
            .text()
            .await
            .map_err(|e| body_error(url, e))
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, PageFetcherError> {
        let bytes = self
            .get(url, self.image_timeout)
            .await?
            .bytes()
            .await
            .map_err(|e| body_error(url, e))?;
        Ok(bytes.to_vec())
    }
}
