use pdf_writer::Content;

use crate::fonts::{FontEntry, FontStyle};
use crate::model::{Signer, Totals};

use super::layout::{
    Align, ColumnSpec, clamp_lines, draw_aligned, draw_text, fill_rect, hline, truncate_to_width,
    wrap_text,
};
use super::{RenderContext, RenderState, format_amount};

const BOX_W: f32 = 200.0;
const GAP_ABOVE: f32 = 12.0;
const LINE_H: f32 = 14.0;
const TOTAL_H: f32 = 18.0;
const AMOUNT_SIZE: f32 = 9.0;
const TOTAL_SIZE: f32 = 10.0;
const TOTAL_SHADE: f32 = 0.85;

const NOTES_GAP: f32 = 16.0;
const NOTES_SIZE: f32 = 7.5;
const MAX_NOTE_LINES: usize = 12;

const SIGN_W: f32 = 170.0;
const SIGN_SIZE: f32 = 8.0;
const SIGN_LINE_H: f32 = 9.5;
/// Room above the rule for the handwritten signature.
const SIGN_ROOM: f32 = 30.0;

/// Printed in front of amounts. Unknown codes print as themselves.
pub(super) fn currency_symbol(code: &str) -> String {
    match code.trim().to_ascii_uppercase().as_str() {
        "PEN" => "S/".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        _ => code.trim().to_string(),
    }
}

/// Tax line caption. The rate prints exactly as it enters the computation
/// (`18` for 18.0), never rounded.
fn tax_label(caption: &str, rate: f64) -> String {
    format!("{caption} ({rate}%)")
}

fn money(symbol: &str, value: f64) -> String {
    if symbol.is_empty() {
        format_amount(value)
    } else {
        format!("{symbol} {}", format_amount(value))
    }
}

/// Height of the totals box alone, including the gap above it.
pub(super) fn totals_block_height(totals: &Totals) -> f32 {
    let lines = if totals.tax_exempt { 0.0 } else { 2.0 };
    GAP_ABOVE + lines * LINE_H + TOTAL_H
}

/// Height of the whole signature area: rule, three text lines below it and
/// the signing room above it. Zero without signers.
pub(super) fn signature_area_height(signers: usize) -> f32 {
    if signers == 0 {
        0.0
    } else {
        SIGN_ROOM + 3.0 * SIGN_LINE_H + 4.0
    }
}

fn notes_lines(ctx: &RenderContext, font: &FontEntry, width: f32) -> Vec<String> {
    let Some(notes) = ctx.order.header.notes.as_deref() else {
        return Vec::new();
    };
    let mut lines = wrap_text(notes, font, NOTES_SIZE, width);
    if clamp_lines(&mut lines, MAX_NOTE_LINES, font, NOTES_SIZE, width) {
        log::warn!("Order notes cut to {MAX_NOTE_LINES} lines");
    }
    lines
}

/// Caption plus `lines` wrapped lines, `line_h` apart.
fn notes_height(lines: usize, line_h: f32) -> f32 {
    if lines == 0 {
        0.0
    } else {
        GAP_ABOVE + (lines + 1) as f32 * line_h
    }
}

/// Present signers with their slot (0 left, 1 right) and default caption.
fn signers<'a>(ctx: &RenderContext<'a>) -> Vec<(usize, &'a Signer, &'a str)> {
    let h = &ctx.order.header;
    let labels = &ctx.opts.labels;
    [
        (h.requester.as_ref(), labels.requested_by.as_str()),
        (h.approver.as_ref(), labels.approved_by.as_str()),
    ]
    .into_iter()
    .enumerate()
    .filter_map(|(slot, (signer, caption))| signer.map(|s| (slot, s, caption)))
    .collect()
}

fn render_signature(
    content: &mut Content,
    ctx: &RenderContext,
    center: f32,
    rule_y: f32,
    signer: &Signer,
    default_caption: &str,
) {
    let bold = ctx.fonts.get(FontStyle::Bold);
    let regular = ctx.fonts.get(FontStyle::Regular);
    let spec = ColumnSpec::new(center - SIGN_W / 2.0, SIGN_W, Align::Center);

    hline(content, spec.x, spec.right(), rule_y, 0.75);
    let caption = signer
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(default_caption);
    let id_line = format!("{}: {}", ctx.opts.labels.id_number, signer.id_number);

    let mut y = rule_y - SIGN_LINE_H;
    for (font, text) in [(bold, signer.full_name.as_str()), (regular, id_line.as_str()), (regular, caption)] {
        let line = truncate_to_width(text, font, SIGN_SIZE, spec.text_width());
        draw_aligned(content, &spec, font, SIGN_SIZE, y, &line);
        y -= SIGN_LINE_H;
    }
}

/// Draw the totals box (with order notes to its left) below the table and the
/// signature blocks near the page bottom, opening a new page when the box
/// would run into the signature area.
pub(super) fn render_totals(state: &mut RenderState, ctx: &RenderContext, totals: &Totals) {
    let page = &ctx.opts.page;
    let labels = &ctx.opts.labels;
    let bold = ctx.fonts.get(FontStyle::Bold);
    let regular = ctx.fonts.get(FontStyle::Regular);

    let signers = signers(ctx);
    let floor = ctx.content_floor();
    let sign_top = floor + signature_area_height(signers.len());

    let notes_w = page.content_width() - BOX_W - NOTES_GAP;
    let notes = notes_lines(ctx, regular, notes_w);
    let notes_lh = regular.line_height(NOTES_SIZE);
    let needed = totals_block_height(totals).max(notes_height(notes.len(), notes_lh));

    if state.y - needed < sign_top {
        state.new_page(ctx);
        if state.y - needed < sign_top {
            log::warn!("Totals block does not fit above the signatures on a fresh page");
        }
    }
    log::debug!(
        "TOTALS y={:.2} block_h={:.2} sign_top={:.2} signers={}",
        state.y,
        needed,
        sign_top,
        signers.len()
    );

    let top = state.y - GAP_ABOVE;
    let box_left = page.right() - BOX_W;
    let label_spec = ColumnSpec::new(box_left, BOX_W * 0.5, Align::Left);
    let amount_spec = ColumnSpec::new(box_left + BOX_W * 0.5, BOX_W * 0.5, Align::Right);
    let symbol = currency_symbol(&ctx.order.header.currency);

    let content = state.content();
    let mut y = top;
    if !totals.tax_exempt {
        let tax_caption = tax_label(&labels.tax, totals.tax_rate);
        for (label, value) in [(labels.subtotal.as_str(), totals.subtotal), (tax_caption.as_str(), totals.tax)] {
            let baseline = y - LINE_H + 4.0;
            draw_aligned(content, &label_spec, regular, AMOUNT_SIZE, baseline, label);
            draw_aligned(content, &amount_spec, regular, AMOUNT_SIZE, baseline, &money(&symbol, value));
            y -= LINE_H;
        }
    }

    fill_rect(content, box_left, y - TOTAL_H, BOX_W, TOTAL_H, TOTAL_SHADE);
    hline(content, box_left, page.right(), y, 0.5);
    hline(content, box_left, page.right(), y - TOTAL_H, 0.5);
    let baseline = y - TOTAL_H / 2.0 - TOTAL_SIZE * 0.35;
    draw_aligned(content, &label_spec, bold, TOTAL_SIZE, baseline, &labels.total);
    draw_aligned(content, &amount_spec, bold, TOTAL_SIZE, baseline, &money(&symbol, totals.total));
    let mut bottom = y - TOTAL_H;

    if !notes.is_empty() {
        let mut ny = top - NOTES_SIZE;
        draw_text(content, bold, NOTES_SIZE, page.margin_left, ny, &format!("{}:", labels.notes));
        for line in &notes {
            ny -= notes_lh;
            draw_text(content, regular, NOTES_SIZE, page.margin_left, ny, line);
        }
        bottom = bottom.min(ny - notes_lh + NOTES_SIZE);
    }

    // Signatures sit at a fixed height above the footer.
    let rule_y = floor + 3.0 * SIGN_LINE_H + 4.0;
    let half = page.content_width() / 2.0;
    for &(slot, signer, caption) in &signers {
        let center = page.margin_left + half * slot as f32 + half / 2.0;
        render_signature(content, ctx, center, rule_y, signer, caption);
    }

    state.y = bottom;
    let report = state.report();
    report.has_totals = true;
    report.signatures = signers.len();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_currencies_get_symbols() {
        assert_eq!(currency_symbol("PEN"), "S/");
        assert_eq!(currency_symbol(" usd "), "$");
        assert_eq!(currency_symbol("EUR"), "€");
        assert_eq!(currency_symbol("CLP"), "CLP");
        assert_eq!(currency_symbol(""), "");
    }

    #[test]
    fn money_prefixes_symbol() {
        assert_eq!(money("S/", 206.5), "S/ 206.50");
        assert_eq!(money("", 1234.0), "1,234.00");
    }

    #[test]
    fn tax_label_keeps_every_decimal() {
        assert_eq!(tax_label("IGV", 18.0), "IGV (18%)");
        assert_eq!(tax_label("IGV", 12.3456), "IGV (12.3456%)");
        assert_eq!(tax_label("IVA", 10.5), "IVA (10.5%)");
    }

    #[test]
    fn exempt_block_is_shorter() {
        let taxed = Totals::compute(100.0, 18.0, false);
        let exempt = Totals::compute(100.0, 18.0, true);
        assert_eq!(totals_block_height(&taxed) - totals_block_height(&exempt), 2.0 * LINE_H);
    }

    #[test]
    fn notes_height_counts_the_caption() {
        assert_eq!(notes_height(0, 9.0), 0.0);
        assert_eq!(notes_height(2, 9.0), GAP_ABOVE + 27.0);
    }

    #[test]
    fn signature_area_only_with_signers() {
        assert_eq!(signature_area_height(0), 0.0);
        assert!(signature_area_height(1) > SIGN_ROOM);
        assert_eq!(signature_area_height(1), signature_area_height(2));
    }
}
