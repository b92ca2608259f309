//! In-memory single-band GeoTIFF writer for COG reader tests.
//!
//! Produces classic (32-bit offset) TIFFs with u16 samples, tiled or
//! stripped, optionally DEFLATE-compressed with horizontal differencing.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

const SHORT: u16 = 3;
const LONG: u16 = 4;
const ASCII: u16 = 2;
const DOUBLE: u16 = 12;

/// Builder for a north-up, single-band u16 GeoTIFF.
///
/// ```ignore
/// let bytes = TiffBuilder::new(64, 64, data)
///     .tiled(32, 32)
///     .deflate(true)
///     .georef(500_000.0, 4_500_000.0, 10.0)
///     .epsg(32633)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TiffBuilder {
    width: usize,
    height: usize,
    data: Vec<u16>,
    tile: Option<(usize, usize)>,
    rows_per_strip: usize,
    deflate: bool,
    predictor: bool,
    big_endian: bool,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    epsg: Option<u32>,
    nodata: Option<u16>,
}

struct Entry {
    tag: u16,
    field_type: u16,
    count: u32,
    bytes: Vec<u8>,
}

impl TiffBuilder {
    pub fn new(width: usize, height: usize, data: Vec<u16>) -> Self {
        assert_eq!(data.len(), width * height, "sample count");
        Self {
            width,
            height,
            data,
            tile: None,
            rows_per_strip: height.max(1),
            deflate: false,
            predictor: false,
            big_endian: false,
            origin: (0.0, 0.0),
            pixel_size: (1.0, 1.0),
            epsg: None,
            nodata: None,
        }
    }

    /// Store as `width x height` tiles; edge tiles are padded.
    pub fn tiled(mut self, width: usize, height: usize) -> Self {
        self.tile = Some((width, height));
        self
    }

    /// Store as strips of `rows` rows.
    pub fn strips(mut self, rows: usize) -> Self {
        self.tile = None;
        self.rows_per_strip = rows.max(1);
        self
    }

    pub fn deflate(mut self, on: bool) -> Self {
        self.deflate = on;
        self
    }

    /// Apply horizontal differencing (predictor 2).
    pub fn predictor(mut self, on: bool) -> Self {
        self.predictor = on;
        self
    }

    /// Write in Motorola ("MM") byte order.
    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// Upper-left corner and square cell size, in CRS units.
    pub fn georef(mut self, origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        self.origin = (origin_x, origin_y);
        self.pixel_size = (pixel_size, pixel_size);
        self
    }

    pub fn epsg(mut self, epsg: u32) -> Self {
        self.epsg = Some(epsg);
        self
    }

    pub fn nodata(mut self, value: u16) -> Self {
        self.nodata = Some(value);
        self
    }

    /// Encode the whole file.
    pub fn build(&self) -> Vec<u8> {
        let blocks: Vec<Vec<u8>> = self.blocks().iter().map(|b| self.encode_block(b)).collect();
        let n_blocks = blocks.len() as u32;

        let mut entries = vec![
            self.long(256, &[self.width as u32]),
            self.long(257, &[self.height as u32]),
            self.short(258, &[16]),
            self.short(259, &[if self.deflate { 8 } else { 1 }]),
            self.short(262, &[1]),
        ];
        let offsets_tag;
        let counts: Vec<u32> = blocks.iter().map(|b| b.len() as u32).collect();
        match self.tile {
            None => {
                offsets_tag = 273;
                entries.push(self.long(273, &vec![0; n_blocks as usize]));
                entries.push(self.short(277, &[1]));
                entries.push(self.long(278, &[self.rows_per_strip as u32]));
                entries.push(self.long(279, &counts));
            }
            Some((tw, th)) => {
                offsets_tag = 324;
                entries.push(self.short(277, &[1]));
                entries.push(self.long(322, &[tw as u32]));
                entries.push(self.long(323, &[th as u32]));
                entries.push(self.long(324, &vec![0; n_blocks as usize]));
                entries.push(self.long(325, &counts));
            }
        }
        if self.predictor {
            entries.push(self.short(317, &[2]));
        }
        entries.push(self.short(339, &[1]));
        entries.push(self.double(33550, &[self.pixel_size.0, self.pixel_size.1, 0.0]));
        entries.push(self.double(33922, &[0.0, 0.0, 0.0, self.origin.0, self.origin.1, 0.0]));
        if let Some(epsg) = self.epsg {
            let (model, key) = if epsg == 4326 { (2, 2048) } else { (1, 3072) };
            entries.push(self.short(34735, &[1, 1, 0, 2, 1024, 0, 1, model, key, 0, 1, epsg as u16]));
        }
        if let Some(nd) = self.nodata {
            let mut text = nd.to_string().into_bytes();
            text.push(0);
            entries.push(Entry {
                tag: 42113,
                field_type: ASCII,
                count: text.len() as u32,
                bytes: text,
            });
        }
        entries.sort_by_key(|e| e.tag);

        // Header, IFD, out-of-line values, then block data
        let ifd_offset = 8u32;
        let ifd_size = 2 + 12 * entries.len() as u32 + 4;
        let mut cursor = ifd_offset + ifd_size;
        let mut value_offsets = Vec::with_capacity(entries.len());
        for e in &entries {
            if e.bytes.len() > 4 {
                cursor += cursor % 2;
                value_offsets.push(Some(cursor));
                cursor += e.bytes.len() as u32;
            } else {
                value_offsets.push(None);
            }
        }
        let mut block_offsets = Vec::with_capacity(blocks.len());
        for b in &blocks {
            block_offsets.push(cursor);
            cursor += b.len() as u32;
        }
        if let Some(e) = entries.iter_mut().find(|e| e.tag == offsets_tag) {
            e.bytes = block_offsets.iter().flat_map(|&o| self.u32_bytes(o)).collect();
        }

        let mut out = Vec::with_capacity(cursor as usize);
        out.extend_from_slice(if self.big_endian { b"MM" } else { b"II" });
        out.extend(self.u16_bytes(42));
        out.extend(self.u32_bytes(ifd_offset));

        out.extend(self.u16_bytes(entries.len() as u16));
        for (e, offset) in entries.iter().zip(&value_offsets) {
            out.extend(self.u16_bytes(e.tag));
            out.extend(self.u16_bytes(e.field_type));
            out.extend(self.u32_bytes(e.count));
            match offset {
                Some(o) => out.extend(self.u32_bytes(*o)),
                None => {
                    let mut inline = [0u8; 4];
                    inline[..e.bytes.len()].copy_from_slice(&e.bytes);
                    out.extend_from_slice(&inline);
                }
            }
        }
        out.extend(self.u32_bytes(0));

        for (e, offset) in entries.iter().zip(&value_offsets) {
            if let Some(o) = offset {
                out.resize(*o as usize, 0);
                out.extend_from_slice(&e.bytes);
            }
        }
        for (b, &o) in blocks.iter().zip(&block_offsets) {
            out.resize(o as usize, 0);
            out.extend_from_slice(b);
        }
        out
    }

    /// Samples of every block in file order, edge tiles padded with nodata
    /// (or zero).
    fn blocks(&self) -> Vec<(usize, Vec<u16>)> {
        let fill = self.nodata.unwrap_or(0);
        match self.tile {
            Some((tw, th)) => {
                let mut out = Vec::new();
                for ty in 0..self.height.div_ceil(th) {
                    for tx in 0..self.width.div_ceil(tw) {
                        let mut block = Vec::with_capacity(tw * th);
                        for r in ty * th..(ty + 1) * th {
                            for c in tx * tw..(tx + 1) * tw {
                                block.push(if r < self.height && c < self.width {
                                    self.data[r * self.width + c]
                                } else {
                                    fill
                                });
                            }
                        }
                        out.push((tw, block));
                    }
                }
                out
            }
            None => self
                .data
                .chunks(self.rows_per_strip * self.width)
                .map(|c| (self.width, c.to_vec()))
                .collect(),
        }
    }

    fn encode_block(&self, (width, samples): &(usize, Vec<u16>)) -> Vec<u8> {
        let mut samples = samples.clone();
        if self.predictor {
            for row in samples.chunks_mut(*width) {
                for i in (1..row.len()).rev() {
                    row[i] = row[i].wrapping_sub(row[i - 1]);
                }
            }
        }
        let raw: Vec<u8> = samples.iter().flat_map(|&v| self.u16_bytes(v)).collect();
        if !self.deflate {
            return raw;
        }
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&raw).expect("write to Vec");
        enc.finish().expect("finish zlib stream")
    }

    fn u16_bytes(&self, v: u16) -> [u8; 2] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn u32_bytes(&self, v: u32) -> [u8; 4] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn short(&self, tag: u16, values: &[u16]) -> Entry {
        Entry {
            tag,
            field_type: SHORT,
            count: values.len() as u32,
            bytes: values.iter().flat_map(|&v| self.u16_bytes(v)).collect(),
        }
    }

    fn long(&self, tag: u16, values: &[u32]) -> Entry {
        Entry {
            tag,
            field_type: LONG,
            count: values.len() as u32,
            bytes: values.iter().flat_map(|&v| self.u32_bytes(v)).collect(),
        }
    }

    fn double(&self, tag: u16, values: &[f64]) -> Entry {
        Entry {
            tag,
            field_type: DOUBLE,
            count: values.len() as u32,
            bytes: values
                .iter()
                .flat_map(|&v| if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_entry_count() {
        let bytes = TiffBuilder::new(2, 2, vec![1, 2, 3, 4]).build();
        assert_eq!(&bytes[0..4], &[b'I', b'I', 42, 0]);
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 8);
        // 5 base tags, 4 strip tags, SampleFormat, scale and tiepoint
        assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), 12);
    }

    #[test]
    fn test_big_endian_marker() {
        let bytes = TiffBuilder::new(1, 1, vec![9]).big_endian().build();
        assert_eq!(&bytes[0..4], &[b'M', b'M', 0, 42]);
    }

    #[test]
    fn test_uncompressed_strip_is_at_end() {
        let bytes = TiffBuilder::new(2, 1, vec![0x0102, 0x0304]).build();
        assert_eq!(&bytes[bytes.len() - 4..], &[0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn test_tiles_are_padded() {
        let builder = TiffBuilder::new(3, 1, vec![1, 2, 3]).tiled(2, 2).nodata(0);
        let blocks = builder.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].1, vec![1, 2, 0, 0]);
        assert_eq!(blocks[1].1, vec![3, 0, 0, 0]);
    }
}
