//! Encoded frame images and their text form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A PNG image ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl EncodedImage {
    pub fn new(width: u32, height: u32, png: Vec<u8>) -> Self {
        Self { width, height, png }
    }

    /// Standard base64 of the PNG bytes, without a data URI prefix.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }

    pub fn len(&self) -> usize {
        self.png.len()
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64() {
        let img = EncodedImage::new(1, 1, vec![137, 80, 78, 71]);
        assert_eq!(img.to_base64(), "iVBORw==");
        assert_eq!(STANDARD.decode(img.to_base64()).unwrap(), img.png);
    }
}
