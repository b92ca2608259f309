//! Block decoding: decompression, predictor reversal and sample conversion.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use num_traits::ToPrimitive;

use super::tiff::ByteOrder;
use crate::error::{RasterError, RasterResult};

/// Compression codes.
pub mod compression {
    pub const NONE: u16 = 1;
    pub const DEFLATE: u16 = 8;
    pub const ADOBE_DEFLATE: u16 = 32946;
}

/// Sample format codes.
pub mod sample_format {
    pub const UINT: u16 = 1;
    pub const INT: u16 = 2;
    pub const FLOAT: u16 = 3;
}

pub const PREDICTOR_NONE: u16 = 1;
pub const PREDICTOR_HORIZONTAL: u16 = 2;

/// How samples of one image are encoded.
#[derive(Debug, Clone, Copy)]
pub struct SampleEncoding {
    pub byte_order: ByteOrder,
    pub bits_per_sample: u16,
    pub sample_format: u16,
    pub compression: u16,
    pub predictor: u16,
}

impl SampleEncoding {
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }

    /// Reject encodings the decoder cannot handle, before any block is fetched.
    pub fn validate(&self) -> RasterResult<()> {
        match self.compression {
            compression::NONE | compression::DEFLATE | compression::ADOBE_DEFLATE => {}
            other => return Err(RasterError::UnsupportedCompression(other)),
        }
        match (self.bits_per_sample, self.sample_format) {
            (8 | 16 | 32, sample_format::UINT | sample_format::INT)
            | (32 | 64, sample_format::FLOAT) => {}
            (bits, format) => return Err(RasterError::UnsupportedDataType { bits, format }),
        }
        match self.predictor {
            PREDICTOR_NONE => Ok(()),
            PREDICTOR_HORIZONTAL if self.sample_format != sample_format::FLOAT => Ok(()),
            other => Err(RasterError::UnsupportedPredictor(other)),
        }
    }

    /// Decode one block of `width * rows` samples into f32.
    ///
    /// Samples equal to `nodata` become NaN.
    pub fn decode_block(
        &self,
        raw: &[u8],
        width: usize,
        rows: usize,
        nodata: Option<f64>,
    ) -> RasterResult<Vec<f32>> {
        let expected = width * rows * self.bytes_per_sample();
        let mut bytes = decompress(raw, self.compression, expected)?;
        if bytes.len() < expected {
            return Err(RasterError::Decompress(format!(
                "block decoded to {} bytes, expected {}",
                bytes.len(),
                expected
            )));
        }
        bytes.truncate(expected);

        if self.predictor == PREDICTOR_HORIZONTAL {
            undo_horizontal_predictor(&mut bytes, width, self.bytes_per_sample(), self.byte_order);
        }

        let mut values = to_f32(&bytes, self.bits_per_sample, self.sample_format, self.byte_order)?;
        if let Some(nd) = nodata {
            let nd = nd as f32;
            for v in values.iter_mut() {
                if *v == nd {
                    *v = f32::NAN;
                }
            }
        }
        Ok(values)
    }
}

/// Inflate a block. DEFLATE blocks are normally zlib-wrapped; raw deflate
/// streams are accepted as a fallback.
pub fn decompress(data: &[u8], code: u16, expected: usize) -> RasterResult<Vec<u8>> {
    match code {
        compression::NONE => Ok(data.to_vec()),
        compression::DEFLATE | compression::ADOBE_DEFLATE => {
            let mut out = Vec::with_capacity(expected);
            if ZlibDecoder::new(data).read_to_end(&mut out).is_ok() {
                return Ok(out);
            }
            out.clear();
            DeflateDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| RasterError::Decompress(format!("DEFLATE: {}", e)))?;
            Ok(out)
        }
        other => Err(RasterError::UnsupportedCompression(other)),
    }
}

/// Reverse TIFF predictor 2: each sample was stored as the difference from
/// its left neighbour within the row, with wrapping integer arithmetic.
pub fn undo_horizontal_predictor(buf: &mut [u8], width: usize, bytes_per_sample: usize, order: ByteOrder) {
    let row_len = width * bytes_per_sample;
    if row_len == 0 {
        return;
    }
    for row in buf.chunks_exact_mut(row_len) {
        match bytes_per_sample {
            1 => {
                for i in 1..width {
                    row[i] = row[i].wrapping_add(row[i - 1]);
                }
            }
            2 => {
                let mut prev = order.u16(&row[0..2]);
                for i in 1..width {
                    let at = i * 2;
                    let cur = order.u16(&row[at..at + 2]).wrapping_add(prev);
                    let b = match order {
                        ByteOrder::Little => cur.to_le_bytes(),
                        ByteOrder::Big => cur.to_be_bytes(),
                    };
                    row[at..at + 2].copy_from_slice(&b);
                    prev = cur;
                }
            }
            4 => {
                let mut prev = order.u32(&row[0..4]);
                for i in 1..width {
                    let at = i * 4;
                    let cur = order.u32(&row[at..at + 4]).wrapping_add(prev);
                    let b = match order {
                        ByteOrder::Little => cur.to_le_bytes(),
                        ByteOrder::Big => cur.to_be_bytes(),
                    };
                    row[at..at + 4].copy_from_slice(&b);
                    prev = cur;
                }
            }
            _ => {}
        }
    }
}

fn cast<T: ToPrimitive>(v: T) -> f32 {
    v.to_f32().unwrap_or(f32::NAN)
}

/// Interpret decoded bytes as samples and widen them to f32.
pub fn to_f32(bytes: &[u8], bits: u16, format: u16, order: ByteOrder) -> RasterResult<Vec<f32>> {
    use self::sample_format::*;
    let out = match (bits, format) {
        (8, UINT) => bytes.iter().map(|&b| cast(b)).collect(),
        (8, INT) => bytes.iter().map(|&b| cast(b as i8)).collect(),
        (16, UINT) => bytes.chunks_exact(2).map(|c| cast(order.u16(c))).collect(),
        (16, INT) => bytes.chunks_exact(2).map(|c| cast(order.u16(c) as i16)).collect(),
        (32, UINT) => bytes.chunks_exact(4).map(|c| cast(order.u32(c))).collect(),
        (32, INT) => bytes.chunks_exact(4).map(|c| cast(order.u32(c) as i32)).collect(),
        (32, FLOAT) => bytes.chunks_exact(4).map(|c| order.f32(c)).collect(),
        (64, FLOAT) => bytes.chunks_exact(8).map(|c| cast(order.f64(c))).collect(),
        (bits, format) => return Err(RasterError::UnsupportedDataType { bits, format }),
    };
    Ok(out)
}
