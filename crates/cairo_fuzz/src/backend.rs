//! Drawing targets.
//!
//! The first input byte picks one of four backends. Vector backends write
//! into [`std::io::sink`], so sessions never touch the filesystem.

use std::io;

use cairo::{
    Content, Context, Format, ImageSurface, PdfSurface, RecordingSurface, Rectangle, Surface,
    SvgSurface,
};

use crate::{HarnessError, Result, CANVAS_EXTENT};

/// Kind of drawing target a session renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// In-memory ARGB32 raster image
    Image,
    /// PDF stream
    Pdf,
    /// SVG stream
    Svg,
    /// Recording surface that stores operations for later replay
    Recording,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::Image,
        Backend::Pdf,
        Backend::Svg,
        Backend::Recording,
    ];

    /// Maps a selector byte onto a backend.
    pub fn from_byte(byte: u8) -> Self {
        Self::ALL[byte as usize % Self::ALL.len()]
    }

    /// Vector streams need an explicit show-page/flush/finish before release.
    pub fn is_vector(self) -> bool {
        matches!(self, Backend::Pdf | Backend::Svg)
    }

    /// Byte that selects this backend.
    pub fn selector(self) -> u8 {
        self as u8
    }
}

/// Straight-alpha RGBA8 copy of a canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    /// 4 bytes per pixel, row-major, no padding
    pub rgba: Vec<u8>,
}

/// A created drawing target.
#[derive(Debug)]
pub enum Target {
    Image(ImageSurface),
    Pdf(PdfSurface),
    Svg(SvgSurface),
    Recording(RecordingSurface),
}

impl Target {
    /// Creates the target for `backend` and checks its status.
    ///
    /// A target that was created but reports an error is dropped here and
    /// never returned.
    pub fn create(backend: Backend) -> Result<Self> {
        let extent = f64::from(CANVAS_EXTENT);
        let created = match backend {
            Backend::Image => {
                ImageSurface::create(Format::ARgb32, CANVAS_EXTENT, CANVAS_EXTENT).map(Target::Image)
            }
            Backend::Pdf => PdfSurface::for_stream(extent, extent, io::sink()).map(Target::Pdf),
            Backend::Svg => SvgSurface::for_stream(extent, extent, io::sink()).map(Target::Svg),
            Backend::Recording => RecordingSurface::create(
                Content::ColorAlpha,
                Some(Rectangle::new(0.0, 0.0, extent, extent)),
            )
            .map(Target::Recording),
        };
        let target = created.map_err(|source| HarnessError::TargetCreation { backend, source })?;
        target
            .surface()
            .status()
            .map_err(|source| HarnessError::TargetCreation { backend, source })?;
        Ok(target)
    }

    pub fn backend(&self) -> Backend {
        match self {
            Target::Image(_) => Backend::Image,
            Target::Pdf(_) => Backend::Pdf,
            Target::Svg(_) => Backend::Svg,
            Target::Recording(_) => Backend::Recording,
        }
    }

    pub fn surface(&self) -> &Surface {
        match self {
            Target::Image(s) => s,
            Target::Pdf(s) => s,
            Target::Svg(s) => s,
            Target::Recording(s) => s,
        }
    }

    /// Emits the last page of a vector stream and closes it.
    ///
    /// Must run while `cr` is still alive. A no-op for other backends.
    pub fn finalize(&self, cr: &Context) {
        if !self.backend().is_vector() {
            return;
        }
        let _ = cr.show_page();
        let surface = self.surface();
        surface.flush();
        surface.finish();
    }

    /// Reads the canvas back, replaying recordings onto a raster image first.
    ///
    /// Returns `Ok(None)` for vector streams.
    pub fn snapshot(&self) -> Result<Option<Snapshot>> {
        match self {
            Target::Image(image) => snapshot_image(image).map(Some),
            Target::Recording(recording) => {
                let image = ImageSurface::create(Format::ARgb32, CANVAS_EXTENT, CANVAS_EXTENT)?;
                {
                    let cr = Context::new(&image)?;
                    cr.set_source_surface(recording, 0.0, 0.0)?;
                    cr.paint()?;
                }
                snapshot_image(&image).map(Some)
            }
            Target::Pdf(_) | Target::Svg(_) => Ok(None),
        }
    }
}

fn snapshot_image(image: &ImageSurface) -> Result<Snapshot> {
    let width = image.width().max(0) as usize;
    let height = image.height().max(0) as usize;
    let stride = image.stride().max(0) as usize;
    if image.format() != Format::ARgb32 || stride < width * 4 {
        return Err(HarnessError::Snapshot(format!(
            "unsupported layout: {:?}, stride {stride} for width {width}",
            image.format()
        )));
    }

    let mut rgba = Vec::with_capacity(width * height * 4);
    image
        .with_data(|data| {
            for row in data.chunks(stride).take(height) {
                for px in row[..width * 4].chunks_exact(4) {
                    let argb = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
                    rgba.extend_from_slice(&unpremultiply(argb));
                }
            }
        })
        .map_err(|e| HarnessError::Snapshot(e.to_string()))?;

    Ok(Snapshot {
        width: width as u32,
        height: height as u32,
        rgba,
    })
}

/// Converts a premultiplied `0xAARRGGBB` pixel to straight RGBA.
fn unpremultiply(argb: u32) -> [u8; 4] {
    let a = (argb >> 24) & 0xff;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let channel = |shift: u32| {
        let c = (argb >> shift) & 0xff;
        ((c * 255 + a / 2) / a).min(255) as u8
    };
    [channel(16), channel(8), channel(0), a as u8]
}
