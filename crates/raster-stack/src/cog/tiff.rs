//! Classic TIFF header and IFD parsing over byte slices.
//!
//! Works on bytes obtained by Range requests, so nothing here needs
//! `Read + Seek`. Only the first IFD (full resolution) is interpreted.

use std::collections::BTreeMap;

use crate::error::{RasterError, RasterResult};

/// Byte order declared in the TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn u16(self, b: &[u8]) -> u16 {
        let a = [b[0], b[1]];
        match self {
            ByteOrder::Little => u16::from_le_bytes(a),
            ByteOrder::Big => u16::from_be_bytes(a),
        }
    }

    pub fn u32(self, b: &[u8]) -> u32 {
        let a = [b[0], b[1], b[2], b[3]];
        match self {
            ByteOrder::Little => u32::from_le_bytes(a),
            ByteOrder::Big => u32::from_be_bytes(a),
        }
    }

    pub fn u64(self, b: &[u8]) -> u64 {
        let a = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
        match self {
            ByteOrder::Little => u64::from_le_bytes(a),
            ByteOrder::Big => u64::from_be_bytes(a),
        }
    }

    pub fn f32(self, b: &[u8]) -> f32 {
        f32::from_bits(self.u32(b))
    }

    pub fn f64(self, b: &[u8]) -> f64 {
        f64::from_bits(self.u64(b))
    }
}

/// Tag IDs read by the COG reader.
pub mod tags {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const PLANAR_CONFIG: u16 = 284;
    pub const PREDICTOR: u16 = 317;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const SAMPLE_FORMAT: u16 = 339;
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const GEO_KEY_DIRECTORY: u16 = 34735;
    pub const GDAL_NODATA: u16 = 42113;
}

/// Field type codes.
pub mod field_type {
    pub const BYTE: u16 = 1;
    pub const ASCII: u16 = 2;
    pub const SHORT: u16 = 3;
    pub const LONG: u16 = 4;
    pub const RATIONAL: u16 = 5;
    pub const SBYTE: u16 = 6;
    pub const UNDEFINED: u16 = 7;
    pub const SSHORT: u16 = 8;
    pub const SLONG: u16 = 9;
    pub const SRATIONAL: u16 = 10;
    pub const FLOAT: u16 = 11;
    pub const DOUBLE: u16 = 12;
}

fn type_size(ft: u16) -> usize {
    use self::field_type::*;
    match ft {
        BYTE | ASCII | SBYTE | UNDEFINED => 1,
        SHORT | SSHORT => 2,
        LONG | SLONG | FLOAT => 4,
        RATIONAL | SRATIONAL | DOUBLE => 8,
        _ => 1,
    }
}

/// Parsed 8-byte header.
#[derive(Debug, Clone, Copy)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    pub first_ifd: u64,
}

pub fn parse_header(data: &[u8]) -> RasterResult<TiffHeader> {
    if data.len() < 8 {
        return Err(RasterError::invalid_tiff("header too short"));
    }
    let byte_order = match (data[0], data[1]) {
        (b'I', b'I') => ByteOrder::Little,
        (b'M', b'M') => ByteOrder::Big,
        _ => return Err(RasterError::invalid_tiff("bad byte order marker")),
    };
    match byte_order.u16(&data[2..4]) {
        42 => {}
        43 => return Err(RasterError::invalid_tiff("BigTIFF is not supported")),
        magic => {
            return Err(RasterError::invalid_tiff(format!(
                "expected magic 42, got {}",
                magic
            )))
        }
    }
    Ok(TiffHeader {
        byte_order,
        first_ifd: byte_order.u32(&data[4..8]) as u64,
    })
}

/// One directory entry. Values of up to four bytes are stored inline.
#[derive(Debug, Clone)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    raw: [u8; 4],
}

impl IfdEntry {
    /// Total byte length of the entry's value.
    pub fn value_len(&self) -> usize {
        type_size(self.field_type) * self.count as usize
    }

    pub fn is_inline(&self) -> bool {
        self.value_len() <= 4
    }

    /// File offset of an out-of-line value.
    pub fn value_offset(&self, order: ByteOrder) -> u64 {
        order.u32(&self.raw) as u64
    }

    pub fn inline_bytes(&self) -> &[u8] {
        &self.raw[..self.value_len().min(4)]
    }
}

/// Size in bytes of an IFD with `entry_count` entries.
pub fn ifd_len(entry_count: usize) -> usize {
    2 + entry_count * 12 + 4
}

/// Parse one IFD; `data` starts at the IFD offset.
pub fn parse_ifd(order: ByteOrder, data: &[u8]) -> RasterResult<Vec<IfdEntry>> {
    if data.len() < 2 {
        return Err(RasterError::invalid_tiff("IFD truncated"));
    }
    let count = order.u16(&data[0..2]) as usize;
    if data.len() < ifd_len(count) {
        return Err(RasterError::invalid_tiff(format!(
            "IFD needs {} bytes, have {}",
            ifd_len(count),
            data.len()
        )));
    }
    Ok((0..count)
        .map(|i| {
            let e = &data[2 + i * 12..2 + (i + 1) * 12];
            IfdEntry {
                tag: order.u16(&e[0..2]),
                field_type: order.u16(&e[2..4]),
                count: order.u32(&e[4..8]),
                raw: [e[8], e[9], e[10], e[11]],
            }
        })
        .collect())
}

/// Fully resolved tag values of one IFD.
#[derive(Debug, Clone)]
pub struct TagValues {
    order: ByteOrder,
    values: BTreeMap<u16, (u16, Vec<u8>)>,
}

impl TagValues {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entry: &IfdEntry, bytes: Vec<u8>) {
        self.values.insert(entry.tag, (entry.field_type, bytes));
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.values.contains_key(&tag)
    }

    /// Integer values of a BYTE/SHORT/LONG tag.
    pub fn uints(&self, tag: u16) -> Option<Vec<u64>> {
        let (ft, bytes) = self.values.get(&tag)?;
        let o = self.order;
        let v = match *ft {
            field_type::BYTE | field_type::UNDEFINED => bytes.iter().map(|&b| b as u64).collect(),
            field_type::SHORT => bytes.chunks_exact(2).map(|c| o.u16(c) as u64).collect(),
            field_type::LONG => bytes.chunks_exact(4).map(|c| o.u32(c) as u64).collect(),
            _ => return None,
        };
        Some(v)
    }

    pub fn uint(&self, tag: u16) -> Option<u64> {
        self.uints(tag).and_then(|v| v.first().copied())
    }

    /// Floating point values of a FLOAT/DOUBLE tag.
    pub fn floats(&self, tag: u16) -> Option<Vec<f64>> {
        let (ft, bytes) = self.values.get(&tag)?;
        let o = self.order;
        match *ft {
            field_type::DOUBLE => Some(bytes.chunks_exact(8).map(|c| o.f64(c)).collect()),
            field_type::FLOAT => Some(bytes.chunks_exact(4).map(|c| o.f32(c) as f64).collect()),
            _ => None,
        }
    }

    /// NUL-terminated ASCII value.
    pub fn ascii(&self, tag: u16) -> Option<String> {
        let (_, bytes) = self.values.get(&tag)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

/// Layout, encoding and georeferencing of the full-resolution image.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub byte_order: ByteOrder,
    pub width: usize,
    pub height: usize,
    /// Tile size, or full width by rows-per-strip for stripped files
    pub block_width: usize,
    pub block_height: usize,
    pub tiled: bool,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
    pub bits_per_sample: u16,
    pub sample_format: u16,
    pub compression: u16,
    pub predictor: u16,
    pub geo: GeoTransform,
    pub nodata: Option<f64>,
    pub epsg: Option<u32>,
}

/// Affine placement of a north-up raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Positive; rows advance southwards
    pub pixel_height: f64,
}

impl ImageInfo {
    pub fn from_tags(values: &TagValues) -> RasterResult<Self> {
        let require = |tag: u16, name: &str| {
            values
                .uint(tag)
                .ok_or_else(|| RasterError::invalid_tiff(format!("missing {}", name)))
        };

        let width = require(tags::IMAGE_WIDTH, "ImageWidth")? as usize;
        let height = require(tags::IMAGE_LENGTH, "ImageLength")? as usize;
        let samples = values.uint(tags::SAMPLES_PER_PIXEL).unwrap_or(1);
        if samples != 1 {
            return Err(RasterError::invalid_tiff(format!(
                "expected one sample per pixel, got {}",
                samples
            )));
        }

        let tiled = values.contains(tags::TILE_OFFSETS);
        let (block_width, block_height, offsets, byte_counts) = if tiled {
            (
                require(tags::TILE_WIDTH, "TileWidth")? as usize,
                require(tags::TILE_LENGTH, "TileLength")? as usize,
                values.uints(tags::TILE_OFFSETS).unwrap_or_default(),
                values.uints(tags::TILE_BYTE_COUNTS).unwrap_or_default(),
            )
        } else {
            let rows = values.uint(tags::ROWS_PER_STRIP).unwrap_or(height as u64) as usize;
            (
                width,
                rows.min(height).max(1),
                values.uints(tags::STRIP_OFFSETS).unwrap_or_default(),
                values.uints(tags::STRIP_BYTE_COUNTS).unwrap_or_default(),
            )
        };
        if block_width == 0 || block_height == 0 {
            return Err(RasterError::invalid_tiff("zero block size"));
        }

        let info = Self {
            byte_order: values.order,
            width,
            height,
            block_width,
            block_height,
            tiled,
            offsets,
            byte_counts,
            bits_per_sample: values.uint(tags::BITS_PER_SAMPLE).unwrap_or(8) as u16,
            sample_format: values.uint(tags::SAMPLE_FORMAT).unwrap_or(1) as u16,
            compression: values.uint(tags::COMPRESSION).unwrap_or(1) as u16,
            predictor: values.uint(tags::PREDICTOR).unwrap_or(1) as u16,
            geo: geo_transform(values)?,
            nodata: values
                .ascii(tags::GDAL_NODATA)
                .and_then(|s| s.trim().parse::<f64>().ok()),
            epsg: epsg_from_geokeys(values),
        };

        let expected = info.blocks_across() * info.blocks_down();
        if info.offsets.len() < expected || info.byte_counts.len() < expected {
            return Err(RasterError::invalid_tiff(format!(
                "expected {} block offsets, found {}",
                expected,
                info.offsets.len().min(info.byte_counts.len())
            )));
        }
        Ok(info)
    }

    pub fn blocks_across(&self) -> usize {
        self.width.div_ceil(self.block_width)
    }

    pub fn blocks_down(&self) -> usize {
        self.height.div_ceil(self.block_height)
    }

    /// Rows encoded in block row `by`. Tiles are always full size; the last
    /// strip may be short.
    pub fn rows_in_block(&self, by: usize) -> usize {
        if self.tiled {
            self.block_height
        } else {
            self.height
                .saturating_sub(by * self.block_height)
                .min(self.block_height)
        }
    }
}

fn geo_transform(values: &TagValues) -> RasterResult<GeoTransform> {
    let scale = values.floats(tags::MODEL_PIXEL_SCALE);
    let tie = values.floats(tags::MODEL_TIEPOINT);
    match (scale, tie) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => Ok(GeoTransform {
            origin_x: t[3] - t[0] * s[0],
            origin_y: t[4] + t[1] * s[1],
            pixel_width: s[0],
            pixel_height: s[1],
        }),
        _ => Err(RasterError::MissingGeoreference(
            "ModelPixelScale and ModelTiepoint are required".into(),
        )),
    }
}

/// EPSG code from ProjectedCSTypeGeoKey (3072) or GeographicTypeGeoKey (2048).
fn epsg_from_geokeys(values: &TagValues) -> Option<u32> {
    const PROJECTED_CS: u64 = 3072;
    const GEOGRAPHIC_CS: u64 = 2048;
    const USER_DEFINED: u64 = 32767;

    let dir = values.uints(tags::GEO_KEY_DIRECTORY)?;
    let n = *dir.get(3)? as usize;
    let keys: Vec<&[u64]> = dir[4..].chunks_exact(4).take(n).collect();
    let lookup = |id: u64| {
        keys.iter()
            .find(|k| k[0] == id && k[1] == 0 && k[3] != 0 && k[3] != USER_DEFINED)
            .map(|k| k[3] as u32)
    };
    lookup(PROJECTED_CS).or_else(|| lookup(GEOGRAPHIC_CS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let h = parse_header(&[b'I', b'I', 42, 0, 8, 0, 0, 0]).unwrap();
        assert_eq!(h.byte_order, ByteOrder::Little);
        assert_eq!(h.first_ifd, 8);

        let h = parse_header(&[b'M', b'M', 0, 42, 0, 0, 0, 16]).unwrap();
        assert_eq!(h.byte_order, ByteOrder::Big);
        assert_eq!(h.first_ifd, 16);

        assert!(parse_header(&[b'I', b'I', 43, 0, 8, 0, 0, 0]).is_err());
        assert!(parse_header(b"GIF89a00").is_err());
        assert!(parse_header(&[b'I', b'I']).is_err());
    }

    #[test]
    fn test_parse_ifd_inline_short() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&tags::IMAGE_WIDTH.to_be_bytes());
        data.extend_from_slice(&field_type::SHORT.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&[0x02, 0x00, 0, 0]);
        data.extend_from_slice(&0u32.to_be_bytes());

        let entries = parse_ifd(ByteOrder::Big, &data).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_inline());

        let mut values = TagValues::new(ByteOrder::Big);
        values.insert(&entries[0], entries[0].inline_bytes().to_vec());
        assert_eq!(values.uint(tags::IMAGE_WIDTH), Some(512));
    }

    #[test]
    fn test_truncated_ifd() {
        let data = [3u8, 0, 0, 0];
        assert!(parse_ifd(ByteOrder::Little, &data).is_err());
    }

    #[test]
    fn test_geokey_epsg() {
        let mut values = TagValues::new(ByteOrder::Little);
        let dir: Vec<u16> = vec![1, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 32618];
        let entry = IfdEntry {
            tag: tags::GEO_KEY_DIRECTORY,
            field_type: field_type::SHORT,
            count: dir.len() as u32,
            raw: [0; 4],
        };
        values.insert(&entry, dir.iter().flat_map(|v| v.to_le_bytes()).collect());
        assert_eq!(epsg_from_geokeys(&values), Some(32618));
    }
}
