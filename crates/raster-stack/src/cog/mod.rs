//! Cloud-Optimized GeoTIFF pixel source.
//!
//! Reads only the header, the first IFD and the blocks that intersect the
//! requested area, each with its own HTTP Range request.

pub mod decode;
pub mod http;
pub mod tiff;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::{debug, instrument};

use ndvi_common::{BoundingBox, SignedHref};
use projection::Crs;
use stac_client::RetryPolicy;

use crate::error::{RasterError, RasterResult};
use crate::source::{PixelSource, SourceWindow};
use decode::SampleEncoding;
use http::{redact, RangeReader};
use tiff::{ImageInfo, TagValues};

/// Configuration for [`CogPixelSource`].
#[derive(Debug, Clone)]
pub struct CogOptions {
    /// Timeout per Range request
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Bytes fetched up front for header and IFD
    pub header_bytes: u64,
    /// Block reads in flight per window
    pub block_concurrency: usize,
}

impl Default for CogOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            header_bytes: 64 * 1024,
            block_concurrency: 4,
        }
    }
}

/// [`PixelSource`] reading single-band COGs over HTTP.
#[derive(Clone)]
pub struct CogPixelSource {
    reader: RangeReader,
    options: CogOptions,
}

impl CogPixelSource {
    pub fn new(options: CogOptions) -> RasterResult<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RasterError::Http(stac_client::StacError::Client(e.to_string())))?;
        Ok(Self {
            reader: RangeReader::new(client, options.retry.clone()),
            options,
        })
    }

    /// Read the header and first IFD, resolving every out-of-line tag value.
    pub async fn open(&self, url: &str) -> RasterResult<ImageInfo> {
        let head = self.reader.fetch(url, 0, self.options.header_bytes).await?;
        let header = tiff::parse_header(&head)?;
        let order = header.byte_order;

        let ifd_start = header.first_ifd as usize;
        let ifd_bytes = self.slice_or_fetch(url, &head, ifd_start, 2).await?;
        let entry_count = order.u16(&ifd_bytes) as usize;
        let ifd_bytes = self
            .slice_or_fetch(url, &head, ifd_start, tiff::ifd_len(entry_count))
            .await?;
        let entries = tiff::parse_ifd(order, &ifd_bytes)?;

        let mut values = TagValues::new(order);
        for entry in &entries {
            if entry.is_inline() {
                values.insert(entry, entry.inline_bytes().to_vec());
            } else {
                let offset = entry.value_offset(order) as usize;
                let bytes = self
                    .slice_or_fetch(url, &head, offset, entry.value_len())
                    .await?;
                values.insert(entry, bytes);
            }
        }

        ImageInfo::from_tags(&values)
    }

    /// Bytes `[offset, offset + len)`, from the header buffer when it covers
    /// them.
    async fn slice_or_fetch(
        &self,
        url: &str,
        head: &[u8],
        offset: usize,
        len: usize,
    ) -> RasterResult<Vec<u8>> {
        if let Some(slice) = head.get(offset..offset + len) {
            return Ok(slice.to_vec());
        }
        let bytes = self.reader.fetch(url, offset as u64, len as u64).await?;
        if bytes.len() < len {
            return Err(RasterError::invalid_tiff(format!(
                "value at offset {} truncated ({} of {} bytes)",
                offset,
                bytes.len(),
                len
            )));
        }
        Ok(bytes.to_vec())
    }

    /// Read the pixels of `info` covering `bbox` (in the image CRS).
    async fn read_blocks(
        &self,
        url: &str,
        info: &ImageInfo,
        epsg: u32,
        bbox: &BoundingBox,
    ) -> RasterResult<SourceWindow> {
        let Some((col0, row0, col1, row1)) = pixel_window(info, bbox) else {
            return Ok(SourceWindow::empty(epsg));
        };

        let encoding = SampleEncoding {
            byte_order: info.byte_order,
            bits_per_sample: info.bits_per_sample,
            sample_format: info.sample_format,
            compression: info.compression,
            predictor: info.predictor,
        };
        encoding.validate()?;

        let width = col1 - col0;
        let height = row1 - row0;
        let mut data = vec![f32::NAN; width * height];

        let bw = info.block_width;
        let bh = info.block_height;
        let blocks: Vec<(usize, usize)> = (row0 / bh..=(row1 - 1) / bh)
            .flat_map(|by| (col0 / bw..=(col1 - 1) / bw).map(move |bx| (bx, by)))
            .collect();

        let decoded: Vec<(usize, usize, Vec<f32>)> = stream::iter(blocks)
            .map(|(bx, by)| async move {
                let idx = by * info.blocks_across() + bx;
                let offset = info.offsets[idx];
                let count = info.byte_counts[idx];
                let rows = info.rows_in_block(by);
                if count == 0 {
                    // Sparse block: all nodata
                    return Ok((bx, by, vec![f32::NAN; bw * rows]));
                }
                let raw = self.reader.fetch(url, offset, count).await?;
                let values = encoding.decode_block(&raw, bw, rows, info.nodata)?;
                Ok::<_, RasterError>((bx, by, values))
            })
            .buffer_unordered(self.options.block_concurrency.max(1))
            .try_collect()
            .await?;

        for (bx, by, values) in decoded {
            let rows = info.rows_in_block(by);
            let block_col0 = bx * bw;
            let block_row0 = by * bh;
            let c_start = col0.max(block_col0);
            let c_end = col1.min(block_col0 + bw);
            let r_start = row0.max(block_row0);
            let r_end = row1.min(block_row0 + rows);
            for r in r_start..r_end {
                let src = (r - block_row0) * bw + (c_start - block_col0);
                let dst = (r - row0) * width + (c_start - col0);
                let n = c_end - c_start;
                data[dst..dst + n].copy_from_slice(&values[src..src + n]);
            }
        }

        let geo = info.geo;
        Ok(SourceWindow {
            epsg,
            origin_x: geo.origin_x + col0 as f64 * geo.pixel_width,
            origin_y: geo.origin_y - row0 as f64 * geo.pixel_height,
            pixel_width: geo.pixel_width,
            pixel_height: geo.pixel_height,
            width,
            height,
            data,
        })
    }
}

/// Pixel bounds `(col0, row0, col1, row1)` (exclusive ends) covering `bbox`,
/// padded by one pixel and clamped to the image. `None` when disjoint.
pub fn pixel_window(info: &ImageInfo, bbox: &BoundingBox) -> Option<(usize, usize, usize, usize)> {
    let g = info.geo;
    let c0 = ((bbox.min_lon - g.origin_x) / g.pixel_width).floor() - 1.0;
    let c1 = ((bbox.max_lon - g.origin_x) / g.pixel_width).ceil() + 1.0;
    let r0 = ((g.origin_y - bbox.max_lat) / g.pixel_height).floor() - 1.0;
    let r1 = ((g.origin_y - bbox.min_lat) / g.pixel_height).ceil() + 1.0;

    let clamp = |v: f64, max: usize| v.max(0.0).min(max as f64) as usize;
    let (c0, c1) = (clamp(c0, info.width), clamp(c1, info.width));
    let (r0, r1) = (clamp(r0, info.height), clamp(r1, info.height));
    if c0 >= c1 || r0 >= r1 {
        None
    } else {
        Some((c0, r0, c1, r1))
    }
}

#[async_trait]
impl PixelSource for CogPixelSource {
    #[instrument(skip(self, href, bbox), fields(url = %redact(&href.url)))]
    async fn read_window(
        &self,
        href: &SignedHref,
        epsg_hint: Option<u32>,
        bbox: &BoundingBox,
    ) -> RasterResult<SourceWindow> {
        let info = self.open(&href.url).await?;
        let epsg = info.epsg.or(epsg_hint).ok_or_else(|| {
            RasterError::MissingGeoreference(format!("no CRS for {}", redact(&href.url)))
        })?;
        let crs = Crs::from_epsg(epsg)?;
        let projected = crs.project_bbox(bbox);

        let window = self.read_blocks(&href.url, &info, epsg, &projected).await?;
        debug!(
            epsg = epsg,
            width = window.width,
            height = window.height,
            "Read COG window"
        );
        Ok(window)
    }
}
