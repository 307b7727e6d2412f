use pdf_writer::{Content, Name, Str};

use crate::fonts::FontEntry;

pub(super) const ELLIPSIS: &str = "...";

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Overflow {
    /// Cut the tail and end with an ellipsis.
    Truncate,
    /// Greedy word wrap over as many lines as needed.
    Wrap,
}

/// One column of a row: where text may go and what happens when it doesn't fit.
#[derive(Clone, Copy, Debug)]
pub(super) struct ColumnSpec {
    pub(super) x: f32,
    pub(super) width: f32,
    pub(super) align: Align,
    pub(super) overflow: Overflow,
    pub(super) padding: f32,
}

impl ColumnSpec {
    pub(super) fn new(x: f32, width: f32, align: Align) -> Self {
        ColumnSpec {
            x,
            width,
            align,
            overflow: Overflow::Truncate,
            padding: 3.0,
        }
    }

    pub(super) fn text_width(&self) -> f32 {
        (self.width - 2.0 * self.padding).max(0.0)
    }

    pub(super) fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Lines this column would print for `text`.
    pub(super) fn lines(&self, text: &str, font: &FontEntry, size: f32) -> Vec<String> {
        match self.overflow {
            Overflow::Truncate => vec![truncate_to_width(text, font, size, self.text_width())],
            Overflow::Wrap => {
                let lines = wrap_text(text, font, size, self.text_width());
                if lines.is_empty() { vec![String::new()] } else { lines }
            }
        }
    }
}

/// Longest prefix of `text` that fits in `max_width` together with the
/// trailing ellipsis.
pub(super) fn ellipsize(text: &str, font: &FontEntry, size: f32, max_width: f32) -> String {
    let ellipsis_w = font.text_width(ELLIPSIS, size);
    let budget = max_width - ellipsis_w;
    if budget <= 0.0 {
        return ELLIPSIS.to_string();
    }
    let mut width = 0.0f32;
    let mut end = 0usize;
    for (i, ch) in text.char_indices() {
        width += font.char_width_1000(ch) * size / 1000.0;
        if width > budget {
            break;
        }
        end = i + ch.len_utf8();
    }
    format!("{}{}", text[..end].trim_end(), ELLIPSIS)
}

/// `text` unchanged if it fits, otherwise cut with an ellipsis.
pub(super) fn truncate_to_width(text: &str, font: &FontEntry, size: f32, max_width: f32) -> String {
    if font.text_width(text, size) <= max_width {
        text.to_string()
    } else {
        ellipsize(text, font, size, max_width)
    }
}

/// Greedy word wrap. Breaks only at whitespace; explicit newlines start a new
/// line; a word wider than the whole line is truncated on a line of its own.
pub(super) fn wrap_text(text: &str, font: &FontEntry, size: f32, max_width: f32) -> Vec<String> {
    let space_w = font.space_width(size);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_w = 0.0f32;
        for word in paragraph.split_whitespace() {
            let ww = font.text_width(word, size);
            if current.is_empty() {
                if ww > max_width {
                    lines.push(ellipsize(word, font, size, max_width));
                    continue;
                }
                current.push_str(word);
                current_w = ww;
            } else if current_w + space_w + ww <= max_width {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + ww;
            } else {
                lines.push(std::mem::take(&mut current));
                if ww > max_width {
                    lines.push(ellipsize(word, font, size, max_width));
                    current_w = 0.0;
                } else {
                    current.push_str(word);
                    current_w = ww;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Drop lines beyond `max`, marking the last kept line with an ellipsis.
/// Returns whether anything was cut.
pub(super) fn clamp_lines(
    lines: &mut Vec<String>,
    max: usize,
    font: &FontEntry,
    size: f32,
    max_width: f32,
) -> bool {
    if lines.len() <= max {
        return false;
    }
    lines.truncate(max);
    if let Some(last) = lines.last_mut() {
        if !last.ends_with(ELLIPSIS) {
            let marked = format!("{last}{ELLIPSIS}");
            *last = if font.text_width(&marked, size) <= max_width {
                marked
            } else {
                ellipsize(last, font, size, max_width)
            };
        }
    }
    true
}

pub(super) fn draw_text(content: &mut Content, font: &FontEntry, size: f32, x: f32, y: f32, text: &str) {
    if text.is_empty() {
        return;
    }
    content.begin_text();
    content.set_font(Name(font.pdf_name.as_bytes()), size);
    content.next_line(x, y);
    content.show(Str(&font.encode(text)));
    content.end_text();
}

/// Draw one already-fitted line inside a column at baseline `y`.
pub(super) fn draw_aligned(
    content: &mut Content,
    spec: &ColumnSpec,
    font: &FontEntry,
    size: f32,
    y: f32,
    text: &str,
) {
    let w = font.text_width(text, size);
    let x = match spec.align {
        Align::Left => spec.x + spec.padding,
        Align::Right => spec.right() - spec.padding - w,
        Align::Center => spec.x + (spec.width - w) / 2.0,
    };
    draw_text(content, font, size, x, y, text);
}

/// Fit `text` to the column and draw it starting at baseline `y`. Returns the
/// number of lines drawn.
pub(super) fn draw_cell(
    content: &mut Content,
    spec: &ColumnSpec,
    font: &FontEntry,
    size: f32,
    y: f32,
    line_h: f32,
    text: &str,
) -> usize {
    let lines = spec.lines(text, font, size);
    for (i, line) in lines.iter().enumerate() {
        draw_aligned(content, spec, font, size, y - i as f32 * line_h, line);
    }
    lines.len()
}

pub(super) fn hline(content: &mut Content, x1: f32, x2: f32, y: f32, width: f32) {
    content.save_state();
    content.set_line_width(width);
    content.move_to(x1, y);
    content.line_to(x2, y);
    content.stroke();
    content.restore_state();
}

pub(super) fn vline(content: &mut Content, x: f32, y_top: f32, y_bottom: f32, width: f32) {
    content.save_state();
    content.set_line_width(width);
    content.move_to(x, y_top);
    content.line_to(x, y_bottom);
    content.stroke();
    content.restore_state();
}

pub(super) fn fill_rect(content: &mut Content, x: f32, y: f32, w: f32, h: f32, gray: f32) {
    content.save_state();
    content.set_fill_gray(gray);
    content.rect(x, y, w, h);
    content.fill_nonzero();
    content.restore_state();
}

/// `1234.5` → `1,234.50`. Rounds half away from zero to cents.
pub(crate) fn format_amount(value: f64) -> String {
    let cents = (value * 100.0).round();
    let negative = cents < 0.0;
    let cents = cents.abs() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{:02}", if negative { "-" } else { "" }, grouped, cents % 100)
}

/// Quantities print without trailing zeros: `10`, `2.5`, `0.125`.
pub(crate) fn format_quantity(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{FontStyle, builtin_font};

    #[test]
    fn short_text_is_untouched() {
        let f = builtin_font(FontStyle::Regular);
        assert_eq!(truncate_to_width("Clavos", &f, 8.0, 100.0), "Clavos");
    }

    #[test]
    fn long_text_gets_ellipsis_and_fits() {
        let f = builtin_font(FontStyle::Regular);
        let text = "Cemento Portland tipo I bolsa de 42.5 kg marca Sol";
        let out = truncate_to_width(text, &f, 8.0, 80.0);
        assert!(out.ends_with(ELLIPSIS));
        assert!(f.text_width(&out, 8.0) <= 80.0);
        assert!(text.starts_with(out.trim_end_matches(ELLIPSIS)));
    }

    #[test]
    fn too_narrow_for_anything_but_ellipsis() {
        let f = builtin_font(FontStyle::Regular);
        assert_eq!(truncate_to_width("Largo", &f, 8.0, 2.0), ELLIPSIS);
    }

    #[test]
    fn wrap_breaks_at_words_only() {
        let f = builtin_font(FontStyle::Regular);
        let text = "entregar en obra antes de las diez de la mañana sin excepción";
        let lines = wrap_text(text, &f, 7.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(f.text_width(line, 7.0) <= 60.0, "{line:?} too wide");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_keeps_explicit_newlines_and_skips_blank() {
        let f = builtin_font(FontStyle::Regular);
        assert!(wrap_text("   ", &f, 7.0, 60.0).is_empty());
        assert_eq!(wrap_text("uno\ndos", &f, 7.0, 200.0), vec!["uno", "dos"]);
    }

    #[test]
    fn wrap_truncates_single_huge_word() {
        let f = builtin_font(FontStyle::Regular);
        let lines = wrap_text("a SUPERCALIFRAGILISTICOESPIALIDOSO b", &f, 8.0, 40.0);
        assert_eq!(lines.first().map(String::as_str), Some("a"));
        assert!(lines[1].ends_with(ELLIPSIS));
        assert_eq!(lines.last().map(String::as_str), Some("b"));
    }

    #[test]
    fn clamp_marks_last_kept_line() {
        let f = builtin_font(FontStyle::Regular);
        let mut lines = vec!["uno".to_string(), "dos".to_string(), "tres".to_string()];
        assert!(!clamp_lines(&mut lines, 3, &f, 8.0, 100.0));
        assert!(clamp_lines(&mut lines, 2, &f, 8.0, 100.0));
        assert_eq!(lines, vec!["uno", "dos..."]);
        let mut lines = vec!["a".to_string()];
        assert!(clamp_lines(&mut lines, 0, &f, 8.0, 100.0));
        assert!(lines.is_empty());
    }

    #[test]
    fn amounts() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(31.5), "31.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1000.0), "-1,000.00");
        assert_eq!(format_amount(0.125), "0.13");
    }

    #[test]
    fn quantities() {
        assert_eq!(format_quantity(10.0), "10");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(0.125), "0.125");
        assert_eq!(format_quantity(0.0), "0");
    }
}
