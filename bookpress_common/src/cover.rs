//! Loading and sizing of cover images.
//!
//! A cover is strictly optional: a missing path, an unreadable file or an
//! undecodable image all degrade to "no cover section" with a logged
//! warning. Nothing here is allowed to fail an export.

use crate::style::CoverBox;
use image::GenericImageView;
use log::warn;
use std::path::Path;

/// The image container formats a cover may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG/JFIF
    Jpeg,
}

impl CoverFormat {
    /// The format's conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            CoverFormat::Png => "png",
            CoverFormat::Jpeg => "jpeg",
        }
    }

    /// The format's mimetype
    pub fn mimetype(&self) -> &'static str {
        match self {
            CoverFormat::Png => "image/png",
            CoverFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A cover image resolved to bytes, with its pixel dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct CoverArt {
    /// The encoded image file, as read from disk
    pub data: Vec<u8>,
    /// The container format the bytes are in
    pub format: CoverFormat,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

impl CoverArt {
    /// Proportionally fit the image within `bounds`, returning the display
    /// width and height in points
    pub fn fitted(&self, bounds: &CoverBox) -> (f32, f32) {
        let width = self.width as f32;
        let height = self.height as f32;
        let scale = (bounds.width / width).min(bounds.height / height);
        (width * scale, height * scale)
    }
}

/// Resolve a book's cover image path to bytes and dimensions.
///
/// Returns `None` -- never an error -- when there is no path, the file is
/// missing or unreadable, or the bytes are not a png or jpeg we can size.
pub fn load_cover(path: Option<&Path>) -> Option<CoverArt> {
    let path = path?;
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            warn!("cover image not readable at {}: {}", path.display(), err);
            return None;
        }
    };
    let format = match image::guess_format(&data) {
        Ok(image::ImageFormat::Png) => CoverFormat::Png,
        Ok(image::ImageFormat::Jpeg) => CoverFormat::Jpeg,
        Ok(other) => {
            warn!(
                "cover image at {} is an unsupported format ({:?})",
                path.display(),
                other
            );
            return None;
        }
        Err(err) => {
            warn!(
                "cover image at {} is not a recognisable image: {}",
                path.display(),
                err
            );
            return None;
        }
    };
    let (width, height) = match image::load_from_memory(&data) {
        Ok(decoded) => decoded.dimensions(),
        Err(err) => {
            warn!("cover image at {} failed to decode: {}", path.display(), err);
            return None;
        }
    };
    Some(CoverArt {
        data,
        format,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cover(width: u32, height: u32) -> CoverArt {
        CoverArt {
            data: Vec::new(),
            format: CoverFormat::Png,
            width,
            height,
        }
    }

    #[test]
    fn tall_image_fits_by_height() {
        let bounds = CoverBox {
            width: 400.0,
            height: 550.0,
        };
        let (w, h) = cover(1000, 2000).fitted(&bounds);
        assert!((h - 550.0).abs() < 0.01);
        assert!((w - 275.0).abs() < 0.01);
    }

    #[test]
    fn wide_image_fits_by_width() {
        let bounds = CoverBox {
            width: 400.0,
            height: 550.0,
        };
        let (w, h) = cover(2000, 1000).fitted(&bounds);
        assert!((w - 400.0).abs() < 0.01);
        assert!((h - 200.0).abs() < 0.01);
    }

    #[test]
    fn missing_path_is_no_cover() {
        assert!(load_cover(None).is_none());
        assert!(load_cover(Some(Path::new("/definitely/not/here.png"))).is_none());
    }
}
