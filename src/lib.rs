mod config;
mod error;
mod fonts;
mod logo;
mod model;
mod pdf;
mod upload;

pub use config::{FontOptions, Labels, PageGeometry, RenderOptions};
pub use error::Error;
pub use logo::load_logo;
pub use model::{
    Company, DocumentHeader, EmbeddedImage, ImageFormat, JpegColor, LineItem, LogoSource,
    PurchaseOrder, Signer, Supplier, Totals,
};
pub use pdf::{HeaderMode, PageReport, RenderReport};
pub use upload::{Session, upload_pdf};

use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

/// A rendered order: the PDF bytes and what was placed on each page.
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

/// Outcome of [`generate_pdf`]. On failure `bytes` is always `None`.
#[derive(Debug, Serialize)]
pub struct GenerationResult {
    pub success: bool,
    #[serde(skip)]
    pub bytes: Option<Vec<u8>>,
    pub error: Option<String>,
}

pub fn render(order: &PurchaseOrder, opts: &RenderOptions) -> Result<RenderedPdf, Error> {
    let t0 = Instant::now();

    let logo = order
        .header
        .company
        .logo
        .as_ref()
        .and_then(|src| load_logo(src, Duration::from_secs(opts.logo_timeout_secs)));
    let t_logo = t0.elapsed();

    let (bytes, report) = pdf::render(order, opts, logo)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: logo={:.1}ms, render={:.1}ms, total={:.1}ms (output {} bytes, {} pages)",
        t_logo.as_secs_f64() * 1000.0,
        (t_total - t_logo).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
        report.page_count(),
    );

    Ok(RenderedPdf { bytes, report })
}

/// Parse an order from its JSON form and render it.
pub fn render_json(json: &str, opts: &RenderOptions) -> Result<RenderedPdf, Error> {
    let order: PurchaseOrder = serde_json::from_str(json)?;
    render(&order, opts)
}

/// Render and report success or failure as a value. Errors are logged; no
/// partial document is ever returned.
pub fn generate_pdf(order: &PurchaseOrder, opts: &RenderOptions) -> GenerationResult {
    match render(order, opts) {
        Ok(rendered) => GenerationResult {
            success: true,
            bytes: Some(rendered.bytes),
            error: None,
        },
        Err(e) => {
            log::error!("PDF generation failed for order {}: {e}", order.header.number);
            GenerationResult {
                success: false,
                bytes: None,
                error: Some(e.to_string()),
            }
        }
    }
}

pub fn render_to_file(order: &PurchaseOrder, opts: &RenderOptions, output: &Path) -> Result<RenderReport, Error> {
    let t0 = Instant::now();
    let rendered = render(order, opts)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &rendered.bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Wrote {}: render={:.1}ms, write={:.1}ms",
        output.display(),
        t_render.as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
    );

    Ok(rendered.report)
}
