use pdf_writer::Content;

use crate::fonts::FontStyle;

use super::RenderContext;
use super::layout::{Align, ColumnSpec, draw_aligned, hline, truncate_to_width};

const STAMP_SIZE: f32 = 8.0;
const FOOTER_SIZE: f32 = 7.0;
const FOOTER_RULE_OFFSET: f32 = 12.0;
const FOOTER_TEXT_OFFSET: f32 = 4.0;

/// Second pass over the finished pages: "page X of N" at the top-right and
/// the footer line with generation time and company name.
pub(super) fn stamp_pages(pages: &mut [Content], ctx: &RenderContext) {
    let page = &ctx.opts.page;
    let labels = &ctx.opts.labels;
    let regular = ctx.fonts.get(FontStyle::Regular);
    let total = pages.len();

    let generated = format!("{} {}", labels.generated_at, ctx.opts.generation_timestamp());
    let half = page.content_width() / 2.0;
    let left = ColumnSpec {
        padding: 0.0,
        ..ColumnSpec::new(page.margin_left, half, Align::Left)
    };
    let right = ColumnSpec {
        padding: 0.0,
        ..ColumnSpec::new(page.margin_left + half, half, Align::Right)
    };
    let generated = truncate_to_width(&generated, regular, FOOTER_SIZE, left.text_width());
    let company = truncate_to_width(&ctx.order.header.company.name, regular, FOOTER_SIZE, right.text_width());

    let stamp_y = page.top() - STAMP_SIZE;
    let rule_y = page.margin_bottom + FOOTER_RULE_OFFSET;
    let text_y = page.margin_bottom + FOOTER_TEXT_OFFSET;

    for (i, content) in pages.iter_mut().enumerate() {
        let stamp = labels.page_stamp(i + 1, total);
        draw_aligned(content, &right, regular, STAMP_SIZE, stamp_y, &stamp);

        content.save_state();
        content.set_stroke_gray(0.5);
        hline(content, page.margin_left, page.right(), rule_y, 0.5);
        content.restore_state();
        draw_aligned(content, &left, regular, FOOTER_SIZE, text_y, &generated);
        draw_aligned(content, &right, regular, FOOTER_SIZE, text_y, &company);
    }
    log::debug!("stamped {total} pages");
}
