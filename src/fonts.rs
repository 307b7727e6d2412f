use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use memmap2::Mmap;
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::Face;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum FontStyle {
    Regular,
    Bold,
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) widths_1000: Vec<f32>,
    pub(crate) line_h_ratio: Option<f32>,
    pub(crate) ascender_ratio: Option<f32>,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
    pub(crate) char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontEntry {
    /// Width of a single character in 1000-units. Uses the per-char cache of an
    /// embedded font, falls back to the WinAnsi table.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000 {
            if let Some(&w) = map.get(&ch) {
                return w;
            }
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }

    pub(crate) fn ascent(&self, font_size: f32) -> f32 {
        font_size * self.ascender_ratio.unwrap_or(0.718)
    }

    pub(crate) fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_h_ratio.unwrap_or(1.2)
    }

    /// Bytes for a `Tj` string operand in this font's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub(crate) struct Fonts {
    pub(crate) regular: FontEntry,
    pub(crate) bold: FontEntry,
}

impl Fonts {
    pub(crate) fn get(&self, style: FontStyle) -> &FontEntry {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }

    pub(crate) fn entries(&self) -> [&FontEntry; 2] {
        [&self.regular, &self.bold]
    }
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}', // bullet
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters outside the code page are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match char_to_winansi(c) {
            0 => None,
            b => Some(b),
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

// Standard-14 AFM advance widths for ASCII 32..=126.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// ASCII letter an accented Latin-1 letter is drawn from; accents don't change
/// the advance in Helvetica.
fn latin1_base(ch: char) -> Option<char> {
    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

/// Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    let ascii = if bold {
        &HELVETICA_BOLD_ASCII
    } else {
        &HELVETICA_ASCII
    };
    let ascii_width = |c: char| ascii[(c as u8 - 32) as usize] as f32;
    (32u8..=255u8)
        .map(|b| {
            if b <= 126 {
                return ascii[(b - 32) as usize] as f32;
            }
            let ch = winansi_to_char(b);
            if let Some(base) = latin1_base(ch) {
                // dotless-i based accents are wider than 'i'
                return if base == 'i' { 278.0 } else { ascii_width(base) };
            }
            match ch {
                '\u{00A0}' => 278.0,
                '\u{00B0}' => 400.0,
                '\u{00BA}' => 365.0,
                '\u{00AA}' => 370.0,
                '\u{00A1}' => 333.0,
                '\u{00BF}' => 611.0,
                '\u{2026}' | '\u{2014}' | '\u{2030}' => 1000.0,
                '\u{2018}' | '\u{2019}' | '\u{201A}' => if bold { 278.0 } else { 222.0 },
                '\u{201C}' | '\u{201D}' | '\u{201E}' => if bold { 500.0 } else { 333.0 },
                '\u{2022}' => 350.0,
                _ => 556.0,
            }
        })
        .collect()
}

/// Object ids an embedded face is written to.
struct FontRefs {
    font: Ref,
    descriptor: Ref,
    data: Ref,
}

/// What layout needs from an embedded face.
struct EmbeddedFace {
    widths_1000: Vec<f32>,
    line_h_ratio: f32,
    ascender_ratio: f32,
    char_to_gid: HashMap<char, u16>,
    char_widths_1000: HashMap<char, f32>,
}

fn per_mille(face: &Face, units: i32) -> f32 {
    units as f32 / face.units_per_em() as f32 * 1000.0
}

fn advance_1000(face: &Face, ch: char) -> Option<f32> {
    let gid = face.glyph_index(ch)?;
    face.glyph_hor_advance(gid).map(|adv| per_mille(face, adv as i32))
}

/// Group glyph widths into runs of consecutive ids for the `/W` array.
fn width_runs(widths: &BTreeMap<u16, f32>) -> Vec<(u16, Vec<f32>)> {
    let mut runs: Vec<(u16, Vec<f32>)> = Vec::new();
    for (&gid, &w) in widths {
        match runs.last_mut() {
            Some((start, ws)) if *start as usize + ws.len() == gid as usize => ws.push(w),
            _ => runs.push((gid, vec![w])),
        }
    }
    runs
}

fn write_descriptor(pdf: &mut Pdf, refs: &FontRefs, face: &Face, ps_name: &str) {
    let bb = face.global_bounding_box();
    let cap_height = face
        .capital_height()
        .map(|h| per_mille(face, h as i32))
        .unwrap_or(700.0);
    pdf.font_descriptor(refs.descriptor)
        .name(Name(ps_name.as_bytes()))
        .flags(FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(
            per_mille(face, bb.x_min as i32),
            per_mille(face, bb.y_min as i32),
            per_mille(face, bb.x_max as i32),
            per_mille(face, bb.y_max as i32),
        ))
        .italic_angle(0.0)
        .ascent(per_mille(face, face.ascender() as i32))
        .descent(per_mille(face, face.descender() as i32))
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(refs.data);
}

fn identity() -> SystemInfo<'static> {
    SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    }
}

/// Embed a TrueType/OpenType face as a Type0 font with Identity-H encoding,
/// subset to the glyphs of `used_chars`, with a ToUnicode map so the text
/// stays extractable.
fn embed_truetype(
    pdf: &mut Pdf,
    refs: &FontRefs,
    ps_name: &str,
    font_data: &[u8],
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<EmbeddedFace> {
    let face = Face::parse(font_data, 0)
        .map_err(|e| log::warn!("{ps_name}: not a TrueType/OpenType font: {e}"))
        .ok()?;

    // Sorted so the subset and its glyph ids are stable across runs.
    let mut chars: Vec<char> = used_chars.iter().copied().collect();
    chars.sort_unstable();

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut char_widths_1000 = HashMap::new();
    let mut gid_widths = BTreeMap::new();
    for ch in chars {
        let Some(gid) = face.glyph_index(ch) else {
            continue;
        };
        let new_gid = remapper.remap(gid.0);
        let w = advance_1000(&face, ch).unwrap_or(0.0);
        char_to_gid.insert(ch, new_gid);
        char_widths_1000.insert(ch, w);
        gid_widths.insert(new_gid, w);
    }

    let subset = subsetter::subset(font_data, 0, &remapper).unwrap_or_else(|e| {
        log::warn!("{ps_name}: subsetting failed ({e}), embedding the whole file");
        font_data.to_vec()
    });
    let subset_len = i32::try_from(subset.len()).ok()?;
    pdf.stream(refs.data, &subset).pair(Name(b"Length1"), subset_len);

    write_descriptor(pdf, refs, &face, ps_name);

    let cid_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_ref);
        cid.subtype(CidFontType::Type2)
            .base_font(Name(ps_name.as_bytes()))
            .system_info(identity())
            .font_descriptor(refs.descriptor)
            .default_width(0.0)
            .cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for (start, run) in width_runs(&gid_widths) {
                w.consecutive(start, run);
            }
        }
    }

    let to_unicode_ref = alloc();
    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = UnicodeCmap::new(Name(cmap_name.as_bytes()), identity());
    for (&ch, &gid) in &char_to_gid {
        cmap.pair(gid, ch);
    }
    pdf.stream(to_unicode_ref, cmap.finish().as_slice());

    pdf.type0_font(refs.font)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_ref)
        .to_unicode(to_unicode_ref);

    // WinAnsi table only serves chars the face has no glyph for.
    let widths_1000 = (32u8..=255u8)
        .map(|byte| advance_1000(&face, winansi_to_char(byte)).unwrap_or(0.0))
        .collect();
    let units = face.units_per_em() as f32;
    let ascender = face.ascender() as f32;
    Some(EmbeddedFace {
        widths_1000,
        line_h_ratio: (ascender - face.descender() as f32 + face.line_gap() as f32) / units,
        ascender_ratio: ascender / units,
        char_to_gid,
        char_widths_1000,
    })
}

fn embed_font_file(
    pdf: &mut Pdf,
    path: &Path,
    refs: &FontRefs,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<EmbeddedFace> {
    let file = std::fs::File::open(path)
        .map_err(|e| log::warn!("Cannot open font {}: {e}", path.display()))
        .ok()?;
    let data = unsafe { Mmap::map(&file) }
        .map_err(|e| log::warn!("Cannot map font {}: {e}", path.display()))
        .ok()?;
    let ps_name: String = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("OrdenFont")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    embed_truetype(pdf, refs, &ps_name, &data, used_chars, alloc)
}

/// Register one font style. A configured font file is embedded (subsetted to
/// `used_chars`); without one, or when it cannot be parsed, the standard
/// Helvetica face is referenced instead.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    style: FontStyle,
    file: Option<&Path>,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> FontEntry {
    let t0 = std::time::Instant::now();
    let refs = FontRefs {
        font: alloc(),
        descriptor: alloc(),
        data: alloc(),
    };

    let embedded = file.and_then(|path| {
        let found = embed_font_file(pdf, path, &refs, used_chars, alloc);
        if found.is_none() {
            log::warn!("Font {} unusable, using Helvetica", path.display());
        }
        found
    });

    let entry = match embedded {
        Some(face) => FontEntry {
            pdf_name,
            font_ref: refs.font,
            widths_1000: face.widths_1000,
            line_h_ratio: Some(face.line_h_ratio),
            ascender_ratio: Some(face.ascender_ratio),
            char_to_gid: Some(face.char_to_gid),
            char_widths_1000: Some(face.char_widths_1000),
        },
        None => {
            let base: &[u8] = match style {
                FontStyle::Regular => b"Helvetica",
                FontStyle::Bold => b"Helvetica-Bold",
            };
            pdf.type1_font(refs.font)
                .base_font(Name(base))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            FontEntry {
                pdf_name,
                font_ref: refs.font,
                widths_1000: helvetica_widths(style == FontStyle::Bold),
                line_h_ratio: None,
                ascender_ratio: None,
                char_to_gid: None,
                char_widths_1000: None,
            }
        }
    };

    log::debug!(
        "register_font: {style:?} embedded={} → {:.1}ms",
        entry.char_to_gid.is_some(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    entry
}

#[cfg(test)]
pub(crate) fn builtin_font(style: FontStyle) -> FontEntry {
    FontEntry {
        pdf_name: "F1".into(),
        font_ref: Ref::new(1),
        widths_1000: helvetica_widths(style == FontStyle::Bold),
        line_h_ratio: None,
        ascender_ratio: None,
        char_to_gid: None,
        char_widths_1000: None,
    }
}
