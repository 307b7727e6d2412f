use pdf_writer::{Content, Name};

use crate::config::Labels;
use crate::fonts::FontStyle;
use crate::model::DocumentHeader;

use super::layout::{
    Align, ColumnSpec, Overflow, clamp_lines, draw_aligned, draw_cell, draw_text, hline, wrap_text,
};
use super::{HeaderMode, RenderContext};

const LOGO_MAX_W: f32 = 90.0;
const LOGO_MAX_H: f32 = 50.0;
const LOGO_GAP: f32 = 10.0;
const COMPANY_NAME_SIZE: f32 = 11.0;
const COMPANY_TEXT_SIZE: f32 = 8.0;
const COMPANY_LINE_H: f32 = 10.0;
const COMPANY_ADDRESS_LINES: usize = 3;
const TITLE_SIZE: f32 = 14.0;
const NUMBER_SIZE: f32 = 11.0;
const FIELD_SIZE: f32 = 7.5;
const FIELD_LINE_H: f32 = 10.0;
const COLUMN_GUTTER: f32 = 6.0;
const MAX_FIELD_LINES: usize = 4;
const PLACEHOLDER: &str = "-";

/// A label/value pair in one of the header columns.
pub(super) struct Field {
    label: String,
    value: String,
    overflow: Overflow,
}

impl Field {
    fn new(label: &str, value: Option<&str>) -> Self {
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(PLACEHOLDER);
        Field {
            label: format!("{label}:"),
            value: value.to_string(),
            overflow: Overflow::Truncate,
        }
    }

    fn wrapped(mut self) -> Self {
        self.overflow = Overflow::Wrap;
        self
    }
}

/// The three header columns: supplier, commercial terms, delivery.
pub(super) fn header_columns(h: &DocumentHeader, l: &Labels) -> [Vec<Field>; 3] {
    let exchange_rate = h.exchange_rate.map(|r| format!("{r:.3}"));
    let requester = h.requester.as_ref().map(|s| s.full_name.as_str());
    [
        vec![
            Field::new(&l.supplier, Some(h.supplier.name.as_str())),
            Field::new(&l.supplier_tax_id, Some(h.supplier.tax_id.as_str())),
            Field::new(&l.supplier_address, h.supplier.address.as_deref()),
            Field::new(&l.contact, h.supplier.contact.as_deref()),
        ],
        vec![
            Field::new(&l.issue_date, Some(h.issue_date.as_str())),
            Field::new(&l.delivery_date, h.delivery_date.as_deref()),
            Field::new(&l.payment_terms, h.payment_terms.as_deref()),
            Field::new(&l.currency, Some(h.currency.as_str())),
            Field::new(&l.exchange_rate, exchange_rate.as_deref()),
        ],
        vec![
            Field::new(&l.warehouse, h.warehouse.as_deref()),
            Field::new(&l.delivery_address, h.delivery_address.as_deref()).wrapped(),
            Field::new(&l.requester, requester),
        ],
    ]
}

/// Draw one column of fields from baseline `y`; returns the baseline after the
/// last line drawn.
fn render_field_column(
    content: &mut Content,
    ctx: &RenderContext,
    x: f32,
    width: f32,
    y: f32,
    fields: &[Field],
) -> f32 {
    let bold = ctx.fonts.get(FontStyle::Bold);
    let regular = ctx.fonts.get(FontStyle::Regular);
    let mut y = y;
    for field in fields {
        draw_text(content, bold, FIELD_SIZE, x, y, &field.label);
        let label_w = bold.text_width(&field.label, FIELD_SIZE);
        let spec = ColumnSpec {
            x: x + label_w,
            width: (width - label_w).max(0.0),
            align: Align::Left,
            overflow: field.overflow,
            padding: 2.0,
        };
        let mut lines = spec.lines(&field.value, regular, FIELD_SIZE);
        clamp_lines(&mut lines, MAX_FIELD_LINES, regular, FIELD_SIZE, spec.text_width());
        for (i, line) in lines.iter().enumerate() {
            draw_aligned(content, &spec, regular, FIELD_SIZE, y - i as f32 * FIELD_LINE_H, line);
        }
        y -= lines.len().max(1) as f32 * FIELD_LINE_H;
    }
    y
}

/// Draw the logo (top-left) and the company block next to it. Returns the
/// lowest y used.
fn render_company_block(content: &mut Content, ctx: &RenderContext) -> f32 {
    let page = &ctx.opts.page;
    let top = page.top();
    let company = &ctx.order.header.company;
    let bold = ctx.fonts.get(FontStyle::Bold);
    let regular = ctx.fonts.get(FontStyle::Regular);

    let mut x = page.margin_left;
    let mut bottom = top;
    if let Some(logo) = ctx.logo {
        let (w, h) = logo.image.fit_within(LOGO_MAX_W, LOGO_MAX_H);
        content.save_state();
        content.transform([w, 0.0, 0.0, h, x, top - h]);
        content.x_object(Name(logo.pdf_name.as_bytes()));
        content.restore_state();
        x += w + LOGO_GAP;
        bottom = top - h;
    }

    // Leave the right part of the band free for the page stamp.
    let block_w = (page.content_width() * 0.55 - (x - page.margin_left)).max(80.0);
    let name_spec = ColumnSpec {
        x,
        width: block_w,
        align: Align::Left,
        overflow: Overflow::Truncate,
        padding: 0.0,
    };
    let mut y = top - bold.ascent(COMPANY_NAME_SIZE);
    draw_cell(content, &name_spec, bold, COMPANY_NAME_SIZE, y, COMPANY_LINE_H, &company.name);
    y -= COMPANY_LINE_H + 2.0;

    let tax_line = format!("{}: {}", ctx.opts.labels.tax_id, company.tax_id);
    draw_cell(content, &name_spec, regular, COMPANY_TEXT_SIZE, y, COMPANY_LINE_H, &tax_line);
    y -= COMPANY_LINE_H;

    let mut address = wrap_text(&company.address, regular, COMPANY_TEXT_SIZE, block_w);
    clamp_lines(&mut address, COMPANY_ADDRESS_LINES, regular, COMPANY_TEXT_SIZE, block_w);
    for line in &address {
        draw_text(content, regular, COMPANY_TEXT_SIZE, x, y, line);
        y -= COMPANY_LINE_H;
    }

    bottom.min(y + COMPANY_LINE_H - 3.0)
}

/// Draw the document header at the top of the page and return the y where
/// body content may start.
pub(super) fn render_header(content: &mut Content, ctx: &RenderContext, mode: HeaderMode) -> f32 {
    let page = &ctx.opts.page;
    let labels = &ctx.opts.labels;
    let bold = ctx.fonts.get(FontStyle::Bold);

    let block_bottom = render_company_block(content, ctx);

    let center = ColumnSpec {
        x: page.margin_left,
        width: page.content_width(),
        align: Align::Center,
        overflow: Overflow::Truncate,
        padding: 0.0,
    };
    let title_y = block_bottom - 18.0;
    draw_cell(content, &center, bold, TITLE_SIZE, title_y, TITLE_SIZE, &labels.title);
    let number_y = title_y - 15.0;
    let number = format!("{} {}", labels.number_prefix, ctx.order.header.number);
    draw_cell(content, &center, bold, NUMBER_SIZE, number_y, NUMBER_SIZE, &number);

    let sep_y = number_y - 8.0;
    hline(content, page.margin_left, page.right(), sep_y, 0.75);

    if mode == HeaderMode::Compact {
        return sep_y - 6.0;
    }

    let col_w = page.content_width() / 3.0;
    let first_baseline = sep_y - 12.0;
    let lowest = header_columns(&ctx.order.header, labels)
        .iter()
        .enumerate()
        .map(|(i, fields)| {
            let x = page.margin_left + i as f32 * col_w;
            render_field_column(content, ctx, x, col_w - COLUMN_GUTTER, first_baseline, fields)
        })
        .fold(first_baseline, f32::min);

    // `lowest` is the baseline of the line after the last one drawn
    lowest + FIELD_LINE_H - 6.0
}
