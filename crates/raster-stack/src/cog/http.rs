//! HTTP Range reads with timeout and bounded retry.

use bytes::Bytes;
use reqwest::{header, Client, StatusCode};
use tracing::trace;

use stac_client::{send_with_retry, RetryPolicy};

use crate::error::{RasterError, RasterResult};

/// Fetches byte ranges of remote files.
#[derive(Clone)]
pub struct RangeReader {
    client: Client,
    retry: RetryPolicy,
}

impl RangeReader {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Fetch `[offset, offset + length)`.
    ///
    /// The result may be shorter than `length` when the range runs past the
    /// end of the file.
    pub async fn fetch(&self, url: &str, offset: u64, length: u64) -> RasterResult<Bytes> {
        if length == 0 {
            return Ok(Bytes::new());
        }
        let range = format!("bytes={}-{}", offset, offset + length - 1);
        trace!(url = %redact(url), range = %range, "Range read");

        let resp = send_with_retry(&self.retry, "Range read", || {
            self.client.get(url).header(header::RANGE, range.as_str())
        })
        .await?;

        if resp.status() != StatusCode::PARTIAL_CONTENT {
            return Err(RasterError::RangeNotSupported {
                url: redact(url).to_string(),
            });
        }
        Ok(resp.bytes().await.map_err(|e| stac_client::StacError::transport("Range read", e))?)
    }
}

/// URL without its query string, so signatures never reach logs or errors.
pub fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
