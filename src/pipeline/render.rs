//! PDF rasterisation: turn one document into a lazy sequence of page images.
//!
//! ## Why a channel?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is blocking and keeps
//! thread-local state, so it runs under `tokio::task::spawn_blocking`. A
//! `PdfDocument` borrows its `Pdfium` instance and cannot leave that thread,
//! so instead of returning a `Vec` of every page the blocking task renders
//! one page at a time into a bounded channel. The orchestrator pulls pages as
//! it needs them; at most one rendered page waits in the channel while the
//! previous one is at the model.
//!
//! ## Resolution
//!
//! Pages are scaled by `dpi / 72` (PDF user space is 72 units per inch), then
//! capped at `max_rendered_pixels` on either edge so an oversized sheet can
//! not exhaust memory.

use crate::error::{ConversionError, PipelineError};
use crate::pipeline::discover::Document;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info};

/// Environment variable naming a directory (or file) holding libpdfium.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// One rendered page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Identifier of the owning document.
    pub document: String,
    /// 1-based page index.
    pub index: usize,
    pub image: DynamicImage,
    pub dpi: u32,
}

/// Pages in document order. A `PageRender` error affects only its own page.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageImage, ConversionError>> + Send>>;

/// A document that opened successfully.
pub struct RasterizedDocument {
    pub document: String,
    pub page_count: usize,
    pub pages: PageStream,
}

/// Turns documents into page images.
///
/// `rasterize` resolves once the document is open: an `Err` means the whole
/// document is unusable, an `Ok` yields its pages lazily.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(
        &self,
        document: Document,
        dpi: u32,
    ) -> Result<RasterizedDocument, ConversionError>;
}

/// [`Rasterizer`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
    max_rendered_pixels: u32,
}

impl PdfiumRasterizer {
    /// Bind pdfium once to fail fast if the library is missing.
    ///
    /// With `library_path` the library is loaded from there, otherwise from
    /// the system library search path.
    pub fn new(
        library_path: Option<PathBuf>,
        max_rendered_pixels: u32,
    ) -> Result<Self, PipelineError> {
        bind_pdfium(library_path.as_deref()).map_err(PipelineError::PdfiumBindingFailed)?;
        info!(
            "pdfium bound from {}",
            library_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "system library path".into())
        );
        Ok(Self {
            library_path,
            max_rendered_pixels,
        })
    }

    /// Like [`PdfiumRasterizer::new`], reading the location from `PDFIUM_LIB_PATH`.
    pub fn from_env(max_rendered_pixels: u32) -> Result<Self, PipelineError> {
        let library_path = std::env::var_os(PDFIUM_LIB_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(library_path, max_rendered_pixels)
    }
}

#[async_trait]
impl Rasterizer for PdfiumRasterizer {
    async fn rasterize(
        &self,
        document: Document,
        dpi: u32,
    ) -> Result<RasterizedDocument, ConversionError> {
        let id = document.id.clone();
        let library_path = self.library_path.clone();
        let max_pixels = self.max_rendered_pixels;
        let (open_tx, open_rx) = oneshot::channel();
        let (page_tx, page_rx) = mpsc::channel(1);

        tokio::task::spawn_blocking(move || {
            render_blocking(
                library_path.as_deref(),
                document,
                dpi,
                max_pixels,
                open_tx,
                page_tx,
            )
        });

        let page_count = open_rx
            .await
            .map_err(|_| ConversionError::Interrupted {
                document: id.clone(),
                detail: "render task ended before opening the document".into(),
            })??;
        info!("'{}' opened: {} pages", id, page_count);

        Ok(RasterizedDocument {
            document: id,
            page_count,
            pages: Box::pin(ReceiverStream::new(page_rx)),
        })
    }
}

#[cfg(target_os = "macos")]
const PDFIUM_LIB_NAME: &str = "libpdfium.dylib";
#[cfg(target_os = "windows")]
const PDFIUM_LIB_NAME: &str = "pdfium.dll";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PDFIUM_LIB_NAME: &str = "libpdfium.so";

/// `PDFIUM_LIB_PATH` may name the library itself or the directory holding it.
fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, String> {
    let bindings = match library_path {
        Some(path) if path.is_dir() => Pdfium::bind_to_library(path.join(PDFIUM_LIB_NAME)),
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| format!("{e:?}"))?;
    Ok(Pdfium::new(bindings))
}

/// Blocking half: open the document, report the page count, then render
/// pages one by one until done or the receiver goes away.
fn render_blocking(
    library_path: Option<&Path>,
    document: Document,
    dpi: u32,
    max_pixels: u32,
    open_tx: oneshot::Sender<Result<usize, ConversionError>>,
    page_tx: mpsc::Sender<Result<PageImage, ConversionError>>,
) {
    let id = document.id;

    let pdfium = match bind_pdfium(library_path) {
        Ok(p) => p,
        Err(detail) => {
            let _ = open_tx.send(Err(ConversionError::Interrupted {
                document: id,
                detail: format!("pdfium unavailable: {detail}"),
            }));
            return;
        }
    };

    let pdf = match pdfium.load_pdf_from_byte_vec(document.bytes, None) {
        Ok(pdf) => pdf,
        Err(e) => {
            let _ = open_tx.send(Err(ConversionError::CorruptPdf {
                document: id,
                detail: format!("{e:?}"),
            }));
            return;
        }
    };

    let pages = pdf.pages();
    if open_tx.send(Ok(pages.len() as usize)).is_err() {
        return;
    }

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    for (i, page) in pages.iter().enumerate() {
        let index = i + 1;
        let item = page
            .render_with_config(&render_config)
            .map(|bitmap| {
                let image = bitmap.as_image();
                debug!(
                    "Rendered '{}' page {} → {}x{} px",
                    id,
                    index,
                    image.width(),
                    image.height()
                );
                PageImage {
                    document: id.clone(),
                    index,
                    image,
                    dpi,
                }
            })
            .map_err(|e| ConversionError::PageRender {
                document: id.clone(),
                page: index,
                detail: format!("{e:?}"),
            });

        if page_tx.blocking_send(item).is_err() {
            debug!("'{}': page receiver dropped after page {}", id, index);
            return;
        }
    }
}
