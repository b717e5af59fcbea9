//! Upload validation.

use std::io::{Cursor, SeekFrom};

use image::{
    error::{DecodingError, ImageFormatHint},
    ImageError, ImageFormat, ImageReader,
};

use crate::error::{Error, Result, Role};

use super::ImageSource;

const SOS: [u8; 2] = [0xFF, 0xDA];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Check that `source` fully decodes as an image.
///
/// The whole image is decoded, not just sniffed, so truncated or corrupt
/// files are rejected here. JPEG data must also end its last scan with an
/// end-of-image marker, since the decoder pads a cut-off scan silently.
/// The stream position is restored before returning, whether or not the
/// image is valid.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] naming `role` if the bytes are not a
/// decodable image, or [`Error::Io`] if the source cannot be read or rewound.
pub fn validate_image<S: ImageSource + ?Sized>(source: &mut S, role: Role) -> Result<()> {
    let start = source.stream_position()?;
    let bytes = source.read_remaining();
    source.seek(SeekFrom::Start(start))?;
    let bytes = bytes?;

    match decode_complete(&bytes) {
        Ok(img) => {
            tracing::debug!(%role, width = img.width(), height = img.height(), "image validated");
            Ok(())
        }
        Err(source) => Err(Error::InvalidImage { role, source }),
    }
}

fn decode_complete(bytes: &[u8]) -> std::result::Result<image::DynamicImage, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format() == Some(ImageFormat::Jpeg) && !jpeg_is_complete(bytes) {
        return Err(truncated_jpeg());
    }
    reader.decode()
}

/// Whether a JPEG stream has an end-of-image marker after its last scan.
///
/// Entropy-coded data never contains `FF D9` (a literal `FF` is stuffed as
/// `FF 00`), so a marker found after the last start-of-scan is the real one.
pub(crate) fn jpeg_is_complete(bytes: &[u8]) -> bool {
    let Some(scan) = bytes.windows(2).rposition(|w| w == SOS) else {
        return false;
    };
    bytes[scan..].windows(2).any(|w| w == EOI)
}

pub(crate) fn truncated_jpeg() -> ImageError {
    ImageError::Decoding(DecodingError::new(
        ImageFormatHint::Exact(ImageFormat::Jpeg),
        "missing end of image marker",
    ))
}
