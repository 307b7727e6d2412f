mod footer;
mod header;
mod layout;
mod table;
mod totals;

use std::collections::HashSet;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};
use serde::Serialize;

use crate::config::RenderOptions;
use crate::error::Error;
use crate::fonts::{FontStyle, Fonts, register_font};
use crate::model::{EmbeddedImage, ImageFormat, JpegColor, PurchaseOrder, Totals};

pub(crate) use layout::{format_amount, format_quantity};

/// Height reserved at the bottom of every page for the footer line.
const FOOTER_BAND: f32 = 16.0;
/// Gap kept between content and the footer band.
const FLOOR_GAP: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HeaderMode {
    /// Logo, company block, title, number and the three field columns.
    Full,
    /// Everything except the field columns.
    Compact,
}

/// What ended up on one page.
#[derive(Clone, Debug, Serialize)]
pub struct PageReport {
    pub number: usize,
    pub header: HeaderMode,
    /// Indices into the order's item list, in drawing order.
    pub rows: Vec<usize>,
    pub has_totals: bool,
    pub signatures: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderReport {
    pub pages: Vec<PageReport>,
    pub totals: Totals,
}

impl RenderReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Item indices across all pages, in drawing order.
    pub fn rows(&self) -> Vec<usize> {
        self.pages.iter().flat_map(|p| p.rows.iter().copied()).collect()
    }
}

pub(crate) struct PlacedLogo {
    pdf_name: String,
    image: EmbeddedImage,
}

/// Read-only inputs shared by every drawing step of one render.
pub(crate) struct RenderContext<'a> {
    pub(crate) order: &'a PurchaseOrder,
    pub(crate) opts: &'a RenderOptions,
    pub(crate) fonts: &'a Fonts,
    pub(crate) logo: Option<&'a PlacedLogo>,
}

impl RenderContext<'_> {
    /// Lowest y any body content may reach.
    pub(crate) fn content_floor(&self) -> f32 {
        self.opts.page.margin_bottom + FOOTER_BAND + FLOOR_GAP
    }

    /// Cursor of a freshly opened continuation page, right below its header.
    pub(crate) fn continuation_top(&self) -> f32 {
        header::render_header(&mut Content::new(), self, self.continuation_mode())
    }

    fn continuation_mode(&self) -> HeaderMode {
        if self.opts.repeat_full_header {
            HeaderMode::Full
        } else {
            HeaderMode::Compact
        }
    }
}

/// Mutable state of one render: the open page, the cursor, the running
/// subtotal and every finished page.
pub(crate) struct RenderState {
    content: Content,
    pub(crate) y: f32,
    pub(crate) subtotal: f64,
    current: PageReport,
    pages: Vec<Content>,
    reports: Vec<PageReport>,
}

impl RenderState {
    /// Open the first page and draw its full header.
    pub(crate) fn new(ctx: &RenderContext) -> Self {
        let mut content = Content::new();
        let y = header::render_header(&mut content, ctx, HeaderMode::Full);
        RenderState {
            content,
            y,
            subtotal: 0.0,
            current: PageReport {
                number: 1,
                header: HeaderMode::Full,
                rows: Vec::new(),
                has_totals: false,
                signatures: 0,
            },
            pages: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub(crate) fn content(&mut self) -> &mut Content {
        &mut self.content
    }

    pub(crate) fn report(&mut self) -> &mut PageReport {
        &mut self.current
    }

    pub(crate) fn page_has_rows(&self) -> bool {
        !self.current.rows.is_empty()
    }

    /// Close the open page and start a new one with the continuation header.
    pub(crate) fn new_page(&mut self, ctx: &RenderContext) {
        let mode = ctx.continuation_mode();
        let number = self.current.number + 1;
        log::debug!("page break: opening page {number} ({mode:?} header)");
        self.pages.push(std::mem::replace(&mut self.content, Content::new()));
        let finished = std::mem::replace(
            &mut self.current,
            PageReport {
                number,
                header: mode,
                rows: Vec::new(),
                has_totals: false,
                signatures: 0,
            },
        );
        self.reports.push(finished);
        self.y = header::render_header(&mut self.content, ctx, mode);
    }

    fn finish(mut self) -> (Vec<Content>, Vec<PageReport>) {
        self.pages.push(self.content);
        self.reports.push(self.current);
        (self.pages, self.reports)
    }
}

fn validate(order: &PurchaseOrder, opts: &RenderOptions) -> Result<(), Error> {
    let page = &opts.page;
    if page.content_width() < 200.0 || page.height - page.margin_top - page.margin_bottom < 300.0 {
        return Err(Error::Render(format!(
            "page {}x{} with the configured margins is too small for an order",
            page.width, page.height
        )));
    }
    let h = &order.header;
    if !h.tax_rate.is_finite() || h.tax_rate < 0.0 {
        return Err(Error::Render(format!("invalid tax rate {}", h.tax_rate)));
    }
    for path in [&opts.fonts.regular, &opts.fonts.bold].into_iter().flatten() {
        if !path.is_file() {
            return Err(Error::Font(format!("font file not found: {}", path.display())));
        }
    }
    for (i, item) in order.items.iter().enumerate() {
        if !item.quantity.is_finite() || !item.unit_price.is_finite() {
            return Err(Error::Render(format!(
                "item {} ({}) has a non-numeric quantity or price",
                i + 1,
                item.description
            )));
        }
    }
    Ok(())
}

/// Every character that may be drawn, so embedded fonts keep the glyphs they need.
fn used_chars(order: &PurchaseOrder, opts: &RenderOptions) -> HashSet<char> {
    let mut chars: HashSet<char> = (' '..='~').collect();
    chars.insert('°');
    chars.insert('€');
    let mut add = |text: &str| chars.extend(text.chars());

    let h = &order.header;
    for text in [
        &h.company.name,
        &h.company.address,
        &h.company.tax_id,
        &h.number,
        &h.issue_date,
        &h.supplier.name,
        &h.supplier.tax_id,
        &h.currency,
    ] {
        add(text);
    }
    for text in [
        &h.delivery_date,
        &h.payment_terms,
        &h.delivery_address,
        &h.warehouse,
        &h.notes,
        &h.supplier.address,
        &h.supplier.contact,
    ]
    .into_iter()
    .flatten()
    {
        add(text);
    }
    for signer in [&h.requester, &h.approver].into_iter().flatten() {
        add(&signer.full_name);
        add(&signer.id_number);
        if let Some(role) = &signer.role {
            add(role);
        }
    }
    for item in &order.items {
        add(&item.description);
        add(&item.unit);
        if let Some(obs) = &item.observations {
            add(obs);
        }
    }
    for label in opts.labels.all() {
        add(label);
    }
    add(&opts.generation_timestamp());
    chars
}

fn embed_image(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref, img: &EmbeddedImage) -> Option<Ref> {
    let xobj_ref = alloc();
    match img.format {
        ImageFormat::Jpeg(color) => {
            let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(img.pixel_width as i32);
            xobj.height(img.pixel_height as i32);
            match color {
                JpegColor::Gray => {
                    xobj.color_space().device_gray();
                }
                JpegColor::Rgb => {
                    xobj.color_space().device_rgb();
                }
                JpegColor::Cmyk { inverted } => {
                    xobj.color_space().device_cmyk();
                    if inverted {
                        xobj.decode([1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
                    }
                }
            }
            xobj.bits_per_component(8);
        }
        ImageFormat::Png => {
            let cursor = std::io::Cursor::new(&img.data);
            let reader = image::ImageReader::with_format(
                std::io::BufReader::new(cursor),
                image::ImageFormat::Png,
            );
            let decoded = match reader.decode() {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Logo skipped: PNG decode failed: {e}");
                    return None;
                }
            };
            let rgba: image::RgbaImage = decoded.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb_data: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    Some(xobj_ref)
}

/// Lay out the order and serialize it. `logo` is the already loaded company
/// logo, if any.
pub(crate) fn render(
    order: &PurchaseOrder,
    opts: &RenderOptions,
    logo: Option<EmbeddedImage>,
) -> Result<(Vec<u8>, RenderReport), Error> {
    let t0 = std::time::Instant::now();
    validate(order, opts)?;

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: fonts and logo
    let used = used_chars(order, opts);
    let fonts = Fonts {
        regular: register_font(
            &mut pdf,
            FontStyle::Regular,
            opts.fonts.regular.as_deref(),
            "F1".to_string(),
            &mut alloc,
            &used,
        ),
        bold: register_font(
            &mut pdf,
            FontStyle::Bold,
            opts.fonts.bold.as_deref(),
            "F2".to_string(),
            &mut alloc,
            &used,
        ),
    };

    let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
    let placed_logo = logo.and_then(|img| {
        let xobj_ref = embed_image(&mut pdf, &mut alloc, &img)?;
        let pdf_name = "Im1".to_string();
        image_xobjects.push((pdf_name.clone(), xobj_ref));
        Some(PlacedLogo {
            pdf_name,
            image: img,
        })
    });

    let t_resources = t0.elapsed();

    // Phase 2: content (header, rows, totals), collecting every page
    let ctx = RenderContext {
        order,
        opts,
        fonts: &fonts,
        logo: placed_logo.as_ref(),
    };
    let mut state = RenderState::new(&ctx);
    table::render_table(&mut state, &ctx)?;
    let totals = Totals::compute(state.subtotal, order.header.tax_rate, order.header.tax_exempt);
    totals::render_totals(&mut state, &ctx, &totals);
    let (mut all_contents, reports) = state.finish();

    let t_layout = t0.elapsed();

    // Phase 2b: page stamps now that the page count is known
    footer::stamp_pages(&mut all_contents, &ctx);

    // Phase 3: page objects
    let n = all_contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in all_contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let title = format!(
        "{} {} {}",
        opts.labels.title, opts.labels.number_prefix, order.header.number
    );
    pdf.document_info(info_id)
        .title(TextStr(&title))
        .author(TextStr(&order.header.company.name))
        .producer(TextStr(concat!("orden-pdf ", env!("CARGO_PKG_VERSION"))));

    let font_pairs: Vec<(String, Ref)> = fonts
        .entries()
        .iter()
        .map(|e| (e.pdf_name.clone(), e.font_ref))
        .collect();

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, opts.page.width, opts.page.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: resources={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} pages, {} items)",
        t_resources.as_secs_f64() * 1000.0,
        (t_layout - t_resources).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        n,
        order.items.len(),
    );

    Ok((pdf.finish(), RenderReport { pages: reports, totals }))
}
