use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::application::ports::{ImageConverter, ImageConverterError};

/// Decodes with the `image` crate on the blocking pool and writes an 8-bit
/// luma copy. Each conversion is bounded by `io_timeout`.
pub struct GrayscaleConverter {
    io_timeout: Duration,
}

impl GrayscaleConverter {
    pub fn new(io_timeout: Duration) -> Self {
        Self { io_timeout }
    }

    async fn run_blocking<F>(&self, work: F) -> Result<(), ImageConverterError>
    where
        F: FnOnce() -> Result<(), ImageConverterError> + Send + 'static,
    {
        tokio::time::timeout(self.io_timeout, tokio::task::spawn_blocking(work))
            .await
            .map_err(|_| ImageConverterError::Timeout(self.io_timeout))?
            .map_err(|e| ImageConverterError::Write(format!("task join error: {e}")))?
    }
}

fn decode_file(source: &Path) -> Result<DynamicImage, ImageConverterError> {
    ImageReader::open(source)
        .map_err(|e| ImageConverterError::Read(format!("{}: {e}", source.display())))?
        .with_guessed_format()
        .map_err(|e| ImageConverterError::Read(format!("{}: {e}", source.display())))?
        .decode()
        .map_err(|e| ImageConverterError::Decode(e.to_string()))
}

fn save_luma(
    image: DynamicImage,
    target: &Path,
    format: ImageFormat,
) -> Result<(), ImageConverterError> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ImageConverterError::Write(format!("{}: {e}", parent.display())))?;
    }

    let luma = DynamicImage::ImageLuma8(image.to_luma8());
    // The GIF encoder only takes RGB(A); gray pixels survive the expansion.
    let encodable = match format {
        ImageFormat::Gif => DynamicImage::ImageRgba8(luma.to_rgba8()),
        _ => luma,
    };

    encodable
        .save_with_format(target, format)
        .map_err(|e| ImageConverterError::Write(format!("{}: {e}", target.display())))
}

/// Encodes in the format the target's extension names, PNG when the
/// extension is missing or not writable.
fn luma_output_format(target: &Path) -> ImageFormat {
    match ImageFormat::from_path(target) {
        Ok(
            format @ (ImageFormat::Png
            | ImageFormat::Jpeg
            | ImageFormat::Gif
            | ImageFormat::WebP
            | ImageFormat::Bmp
            | ImageFormat::Tiff),
        ) => format,
        _ => ImageFormat::Png,
    }
}

#[async_trait]
impl ImageConverter for GrayscaleConverter {
    async fn convert_file(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<(), ImageConverterError> {
        let source: PathBuf = source.to_path_buf();
        let target: PathBuf = target.to_path_buf();

        self.run_blocking(move || {
            let image = decode_file(&source)?;
            let format = luma_output_format(&target);
            save_luma(image, &target, format)
        })
        .await
    }

    async fn convert_bytes(
        &self,
        data: Vec<u8>,
        target: &Path,
    ) -> Result<(), ImageConverterError> {
        let target: PathBuf = target.to_path_buf();

        self.run_blocking(move || {
            let image = ImageReader::new(Cursor::new(data))
                .with_guessed_format()
                .map_err(|e| ImageConverterError::Read(e.to_string()))?
                .decode()
                .map_err(|e| ImageConverterError::Decode(e.to_string()))?;
            save_luma(image, &target, ImageFormat::Png)
        })
        .await
    }
}
