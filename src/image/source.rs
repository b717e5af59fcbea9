//! Uploaded byte sources.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use bytes::Bytes;

/// A readable, rewindable upload that knows its declared filename.
pub trait ImageSource: Read + Seek {
    /// Filename declared by the client. May be empty.
    fn filename(&self) -> &str;

    /// Read everything from the current position to the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    fn read_remaining(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// An in-memory upload, as received from a multipart part.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    filename: String,
    data: Cursor<Bytes>,
}

impl UploadedImage {
    /// Wrap raw upload bytes.
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: Cursor::new(data.into()),
        }
    }

    /// Size of the upload in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.get_ref().len()
    }

    /// Whether the upload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.get_ref().is_empty()
    }
}

impl Read for UploadedImage {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Seek for UploadedImage {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.data.seek(pos)
    }
}

impl ImageSource for UploadedImage {
    fn filename(&self) -> &str {
        &self.filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_remaining_from_position() {
        let mut upload = UploadedImage::new("a.bin", vec![1u8, 2, 3, 4]);
        upload.seek(SeekFrom::Start(1)).unwrap();
        assert_eq!(upload.read_remaining().unwrap(), vec![2, 3, 4]);
        assert_eq!(upload.filename(), "a.bin");
        assert_eq!(upload.len(), 4);
    }
}
