#![allow(dead_code)]

use orden_pdf::{
    Company, DocumentHeader, LineItem, PurchaseOrder, RenderOptions, Signer, Supplier,
};

pub const SAMPLE_ORDER: &str = include_str!("../../demos/orden.json");

pub fn item(description: &str, quantity: f64, unit_price: f64) -> LineItem {
    LineItem {
        description: description.to_string(),
        quantity,
        unit: "UND".to_string(),
        unit_price,
        observations: None,
    }
}

pub fn header() -> DocumentHeader {
    DocumentHeader {
        company: Company {
            name: "Constructora Andina S.A.C.".into(),
            tax_id: "20512345678".into(),
            address: "Av. Javier Prado Este 1234, San Isidro, Lima".into(),
            logo: None,
        },
        number: "OC-0042".into(),
        issue_date: "09/03/2026".into(),
        delivery_date: Some("16/03/2026".into()),
        supplier: Supplier {
            name: "Ferreteria El Progreso".into(),
            tax_id: "20498765432".into(),
            address: None,
            contact: None,
        },
        payment_terms: Some("Contado".into()),
        currency: "PEN".into(),
        exchange_rate: None,
        tax_rate: 18.0,
        tax_exempt: false,
        delivery_address: Some("Calle Las Magnolias 789, Los Olivos".into()),
        warehouse: Some("Central".into()),
        notes: None,
        requester: Some(Signer {
            full_name: "Ana Perez".into(),
            id_number: "45678912".into(),
            role: None,
        }),
        approver: None,
    }
}

pub fn order(items: Vec<LineItem>) -> PurchaseOrder {
    PurchaseOrder {
        header: header(),
        items,
    }
}

/// Subtotals 100.00, 50.00 and 25.00.
pub fn three_items() -> Vec<LineItem> {
    vec![
        item("Cemento Portland", 4.0, 25.0),
        item("Fierro corrugado", 2.0, 25.0),
        item("Alambre negro", 5.0, 5.0),
    ]
}

/// `n` items, each with several lines of observations.
pub fn long_items(n: usize) -> Vec<LineItem> {
    (1..=n)
        .map(|i| LineItem {
            observations: Some(format!(
                "Item {i}: entregar en obra con guia de remision, embalaje original sellado, \
                 certificado de calidad del fabricante y ficha tecnica. Coordinar la descarga \
                 con el almacenero de turno antes de las diez de la manana."
            )),
            ..item(&format!("Producto numero {i}"), 1.0, 10.0)
        })
        .collect()
}

/// Options with a fixed generation time so the footer is predictable.
pub fn options() -> RenderOptions {
    RenderOptions {
        generated_at: chrono::NaiveDate::from_ymd_opt(2026, 3, 9).and_then(|d| d.and_hms_opt(14, 5, 0)),
        ..Default::default()
    }
}

fn find(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= hay.len() {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn parse_int(bytes: &[u8], at: usize) -> Option<usize> {
    let digits: Vec<u8> = bytes[at..]
        .iter()
        .copied()
        .skip_while(|b| *b == b' ')
        .take_while(u8::is_ascii_digit)
        .collect();
    std::str::from_utf8(&digits).ok()?.parse().ok()
}

pub fn count(pdf: &[u8], needle: &str) -> usize {
    let needle = needle.as_bytes();
    pdf.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Object ids of the page content streams, in page order.
fn content_ids(pdf: &[u8]) -> Vec<usize> {
    let mut ids = Vec::new();
    let mut pos = 0;
    while let Some(at) = find(pdf, b"/Contents ", pos) {
        if let Some(id) = parse_int(pdf, at + b"/Contents ".len()) {
            ids.push(id);
        }
        pos = at + 1;
    }
    ids
}

/// Raw (still compressed) stream data of object `id`.
fn stream_of(pdf: &[u8], id: usize) -> Option<&[u8]> {
    let marker = format!("\n{id} 0 obj");
    let obj = find(pdf, marker.as_bytes(), 0)?;
    let len_at = find(pdf, b"/Length ", obj)?;
    let len = parse_int(pdf, len_at + b"/Length ".len())?;
    let start = find(pdf, b"stream\n", len_at)? + b"stream\n".len();
    pdf.get(start..start + len)
}

/// Decompressed content stream of every page, in page order.
pub fn page_streams(pdf: &[u8]) -> Vec<Vec<u8>> {
    content_ids(pdf)
        .into_iter()
        .map(|id| {
            let raw = stream_of(pdf, id).expect("content stream");
            miniz_oxide::inflate::decompress_to_vec_zlib(raw).expect("FlateDecode content")
        })
        .collect()
}

fn winansi(byte: u8) -> char {
    match byte {
        0x80 => '€',
        _ => byte as char,
    }
}

/// Every string shown on a page, decoded from WinAnsi, in drawing order.
pub fn shown_strings(content: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'(' => {
                let mut s = String::new();
                let mut depth = 1;
                i += 1;
                while i < content.len() {
                    let b = content[i];
                    match b {
                        b'\\' => {
                            i += 1;
                            let e = content[i];
                            match e {
                                b'n' => s.push('\n'),
                                b'r' => s.push('\r'),
                                b't' => s.push('\t'),
                                b'b' => s.push('\u{8}'),
                                b'f' => s.push('\u{c}'),
                                b'0'..=b'7' => {
                                    let mut v = 0u32;
                                    let mut n = 0;
                                    while n < 3 && i < content.len() && (b'0'..=b'7').contains(&content[i]) {
                                        v = v * 8 + (content[i] - b'0') as u32;
                                        i += 1;
                                        n += 1;
                                    }
                                    i -= 1;
                                    s.push(winansi(v as u8));
                                }
                                other => s.push(winansi(other)),
                            }
                        }
                        b'(' => {
                            depth += 1;
                            s.push('(');
                        }
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            s.push(')');
                        }
                        _ => s.push(winansi(b)),
                    }
                    i += 1;
                }
                out.push(s);
            }
            b'<' => {
                let end = find(content, b">", i).unwrap_or(content.len());
                let hex: Vec<u8> = content[i + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                let s = hex
                    .chunks(2)
                    .filter_map(|pair| {
                        let text = std::str::from_utf8(pair).ok()?;
                        let text = if text.len() == 1 { format!("{text}0") } else { text.to_string() };
                        u8::from_str_radix(&text, 16).ok()
                    })
                    .map(winansi)
                    .collect();
                out.push(s);
                i = end;
            }
            _ => {}
        }
        i += 1;
    }
    out
}

/// Shown strings per page.
pub fn page_texts(pdf: &[u8]) -> Vec<Vec<String>> {
    page_streams(pdf).iter().map(|c| shown_strings(c)).collect()
}

pub fn has(texts: &[String], needle: &str) -> bool {
    texts.iter().any(|t| t == needle)
}

/// Amount strings of the totals box (the only ones with a currency symbol).
pub fn money_strings(texts: &[String], symbol: &str) -> Vec<String> {
    let prefix = format!("{symbol} ");
    texts.iter().filter(|t| t.starts_with(&prefix)).cloned().collect()
}
