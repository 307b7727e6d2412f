use pdf_writer::Content;

use crate::config::Labels;
use crate::error::Error;
use crate::fonts::{FontEntry, FontStyle};
use crate::model::LineItem;

use super::layout::{
    Align, ColumnSpec, clamp_lines, draw_aligned, draw_cell, draw_text, fill_rect, hline, vline,
    wrap_text,
};
use super::{RenderContext, RenderState, format_amount, format_quantity};

const SECTION_TITLE_SIZE: f32 = 10.0;
const SECTION_TITLE_GAP: f32 = 14.0;
/// From the section title baseline down to the column header.
const TITLE_RULE_GAP: f32 = 6.0;
const HEADER_ROW_H: f32 = 16.0;
const CELL_SIZE: f32 = 8.0;
const ROW_H: f32 = 16.0;
const OBS_SIZE: f32 = 7.0;
const OBS_LINE_H: f32 = 9.0;
const OBS_PAD: f32 = 3.0;
const RULE_W: f32 = 0.5;
const HEADER_SHADE: f32 = 0.85;

/// Share of the table width taken by each column: index, description,
/// quantity, unit, unit price, subtotal.
const COLUMN_SHARES: [f32; 6] = [0.06, 0.44, 0.10, 0.10, 0.14, 0.16];
const COLUMN_ALIGN: [Align; 6] = [
    Align::Center,
    Align::Left,
    Align::Right,
    Align::Left,
    Align::Right,
    Align::Right,
];

pub(super) fn table_columns(left: f32, width: f32) -> Vec<ColumnSpec> {
    let mut x = left;
    COLUMN_SHARES
        .iter()
        .zip(COLUMN_ALIGN)
        .map(|(share, align)| {
            let w = width * share;
            let spec = ColumnSpec::new(x, w, align);
            x += w;
            spec
        })
        .collect()
}

fn column_titles(labels: &Labels) -> [&str; 6] {
    [
        labels.col_index.as_str(),
        labels.col_description.as_str(),
        labels.col_quantity.as_str(),
        labels.col_unit.as_str(),
        labels.col_unit_price.as_str(),
        labels.col_subtotal.as_str(),
    ]
}

/// Height of a row carrying `obs_lines` lines of observations.
pub(super) fn row_height(obs_lines: usize) -> f32 {
    if obs_lines == 0 {
        ROW_H
    } else {
        ROW_H + obs_lines as f32 * OBS_LINE_H + OBS_PAD
    }
}

/// Observation lines for an item, first line prefixed with the caption.
fn observation_lines(item: &LineItem, labels: &Labels, font: &FontEntry, max_width: f32) -> Vec<String> {
    let Some(obs) = item.observations.as_deref() else {
        return Vec::new();
    };
    if obs.trim().is_empty() {
        return Vec::new();
    }
    wrap_text(&format!("{}: {}", labels.observations, obs), font, OBS_SIZE, max_width)
}

/// Keep only the observation lines that fit in `available` height.
fn cap_observations(lines: &mut Vec<String>, available: f32, font: &FontEntry, max_width: f32) {
    let fit = ((available - ROW_H - OBS_PAD) / OBS_LINE_H).floor().max(0.0) as usize;
    let before = lines.len();
    if clamp_lines(lines, fit, font, OBS_SIZE, max_width) {
        log::warn!("Observations cut from {before} to {fit} lines to fit one page");
    }
}

fn render_column_header(content: &mut Content, columns: &[ColumnSpec], labels: &Labels, bold: &FontEntry, top: f32) {
    let left = columns[0].x;
    let right = columns[columns.len() - 1].right();
    let bottom = top - HEADER_ROW_H;
    fill_rect(content, left, bottom, right - left, HEADER_ROW_H, HEADER_SHADE);
    content.set_fill_gray(0.0);

    let baseline = top - HEADER_ROW_H / 2.0 - CELL_SIZE * 0.35;
    for (spec, title) in columns.iter().zip(column_titles(labels)) {
        let centered = ColumnSpec {
            align: Align::Center,
            ..*spec
        };
        draw_cell(content, &centered, bold, CELL_SIZE, baseline, CELL_SIZE, title);
    }

    hline(content, left, right, top, RULE_W);
    hline(content, left, right, bottom, RULE_W);
    vline(content, left, top, bottom, RULE_W);
    for spec in columns {
        vline(content, spec.right(), top, bottom, RULE_W);
    }
}

fn render_row(
    content: &mut Content,
    columns: &[ColumnSpec],
    ctx: &RenderContext,
    index: usize,
    item: &LineItem,
    obs_lines: &[String],
    top: f32,
) -> f32 {
    let regular = ctx.fonts.get(FontStyle::Regular);
    let height = row_height(obs_lines.len());
    let bottom = top - height;
    let base_bottom = top - ROW_H;
    let baseline = top - ROW_H / 2.0 - CELL_SIZE * 0.35;

    let cells = [
        (index + 1).to_string(),
        item.description.clone(),
        format_quantity(item.quantity),
        item.unit.clone(),
        format_amount(item.unit_price),
        format_amount(item.subtotal()),
    ];
    for (spec, text) in columns.iter().zip(cells.iter()) {
        draw_cell(content, spec, regular, CELL_SIZE, baseline, CELL_SIZE, text);
    }

    if !obs_lines.is_empty() {
        let obs_spec = obs_column(columns);
        content.save_state();
        content.set_fill_gray(0.3);
        let mut y = base_bottom - OBS_PAD - OBS_SIZE * 0.75;
        for line in obs_lines {
            draw_aligned(content, &obs_spec, regular, OBS_SIZE, y, line);
            y -= OBS_LINE_H;
        }
        content.restore_state();
    }

    // Outer rules span the whole row; inner rules only the data line.
    let left = columns[0].x;
    let right = columns[columns.len() - 1].right();
    vline(content, left, top, bottom, RULE_W);
    vline(content, right, top, bottom, RULE_W);
    for spec in &columns[..columns.len() - 1] {
        vline(content, spec.right(), top, base_bottom, RULE_W);
    }
    hline(content, left, right, bottom, RULE_W);
    bottom
}

/// Observations run under the description column to the right edge.
fn obs_column(columns: &[ColumnSpec]) -> ColumnSpec {
    let start = columns[1].x;
    let end = columns[columns.len() - 1].right();
    ColumnSpec::new(start, end - start, Align::Left)
}

/// Draw the section title, the column header row and one row per item,
/// opening new pages as the cursor reaches the content floor.
pub(super) fn render_table(state: &mut RenderState, ctx: &RenderContext) -> Result<(), Error> {
    let page = &ctx.opts.page;
    let labels = &ctx.opts.labels;
    let bold = ctx.fonts.get(FontStyle::Bold);
    let regular = ctx.fonts.get(FontStyle::Regular);
    let floor = ctx.content_floor();
    let columns = table_columns(page.margin_left, page.content_width());
    let obs_width = obs_column(&columns).text_width();

    // Title, column header and the first row stay together. A first row
    // taller than a fresh page allows only needs the room it will be capped to.
    let title_block = SECTION_TITLE_GAP + TITLE_RULE_GAP + HEADER_ROW_H;
    let fresh_room = ctx.continuation_top() - title_block - floor;
    let first_row = ctx.order.items.first().map_or(ROW_H, |item| {
        row_height(observation_lines(item, labels, regular, obs_width).len())
    });
    if state.y - title_block - first_row.min(fresh_room) < floor {
        state.new_page(ctx);
    }
    let title_y = state.y - SECTION_TITLE_GAP;
    draw_text(state.content(), bold, SECTION_TITLE_SIZE, page.margin_left, title_y, &labels.items_title);
    state.y = title_y - TITLE_RULE_GAP;

    let top = state.y;
    render_column_header(state.content(), &columns, labels, bold, top);
    state.y -= HEADER_ROW_H;
    if state.y - ROW_H < floor {
        return Err(Error::Render(
            "page geometry leaves no room for table rows below the header".into(),
        ));
    }

    for (index, item) in ctx.order.items.iter().enumerate() {
        let mut obs = observation_lines(item, labels, regular, obs_width);
        let mut height = row_height(obs.len());

        if state.y - height < floor && state.page_has_rows() {
            state.new_page(ctx);
            let top = state.y;
            render_column_header(state.content(), &columns, labels, bold, top);
            state.y -= HEADER_ROW_H;
        }
        if state.y - height < floor {
            cap_observations(&mut obs, state.y - floor, regular, obs_width);
            height = row_height(obs.len());
        }

        log::debug!(
            "TABLE row={} row_h={:.2} obs_lines={} y={:.2}",
            index,
            height,
            obs.len(),
            state.y
        );
        let top = state.y;
        state.y = render_row(state.content(), &columns, ctx, index, item, &obs, top);
        state.subtotal += item.subtotal();
        state.report().rows.push(index);
    }
    Ok(())
}
