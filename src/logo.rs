use std::time::Duration;

use crate::error::Error;
use crate::model::{EmbeddedImage, ImageFormat, JpegColor, LogoSource};

/// Read the pixel size and format from a JPEG or PNG header.
pub(crate) fn image_dimensions(data: &[u8]) -> Option<(u32, u32, ImageFormat)> {
    // JPEG: starts with FF D8
    if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        let mut adobe = false;
        let mut i = 2;
        while i + 4 < data.len() {
            if data[i] != 0xFF {
                return None;
            }
            let marker = data[i + 1];
            if marker == 0xD9 {
                break;
            }
            let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            if marker == 0xEE && data.get(i + 4..i + 9) == Some(b"Adobe".as_slice()) {
                adobe = true;
            }
            if (marker == 0xC0 || marker == 0xC1 || marker == 0xC2) && i + 9 < data.len() {
                let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
                let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
                let color = match data[i + 9] {
                    1 => JpegColor::Gray,
                    3 => JpegColor::Rgb,
                    4 => JpegColor::Cmyk { inverted: adobe },
                    n => {
                        log::warn!("JPEG with {n} color components is not supported");
                        return None;
                    }
                };
                return Some((width, height, ImageFormat::Jpeg(color)));
            }
            i += 2 + len;
        }
        return None;
    }

    // PNG: starts with 89 50 4E 47, dimensions in IHDR chunk at bytes 16-23
    if data.len() >= 24 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
    {
        let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
        return Some((width, height, ImageFormat::Png));
    }

    None
}

fn fetch(url: &str, timeout: Duration) -> Result<Vec<u8>, Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}

fn read_source(source: &LogoSource, timeout: Duration) -> Result<Vec<u8>, Error> {
    match source {
        LogoSource::Path(path) => Ok(std::fs::read(path)?),
        LogoSource::Url(url) => fetch(url, timeout),
        LogoSource::Bytes(bytes) => Ok(bytes.clone()),
    }
}

/// Load the company logo. A missing or broken logo is cosmetic: the failure is
/// logged and the header is drawn without it.
pub fn load_logo(source: &LogoSource, timeout: Duration) -> Option<EmbeddedImage> {
    let data = match read_source(source, timeout) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Logo skipped: {e}");
            return None;
        }
    };
    let Some((pixel_width, pixel_height, format)) = image_dimensions(&data) else {
        log::warn!("Logo skipped: unsupported image format ({} bytes)", data.len());
        return None;
    };
    if pixel_width == 0 || pixel_height == 0 {
        log::warn!("Logo skipped: empty image");
        return None;
    }
    Some(EmbeddedImage {
        data,
        format,
        pixel_width,
        pixel_height,
    })
}
