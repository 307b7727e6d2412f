use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the company logo comes from. Loading is best-effort: any failure
/// leaves the header without a logo.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogoSource {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    #[serde(default)]
    pub logo: Option<LogoSource>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub name: String,
    pub tax_id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Person signing the order (requester or approver).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub full_name: String,
    pub id_number: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Everything above the product table. Dates and names arrive already
/// formatted for display.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHeader {
    pub company: Company,
    pub number: String,
    pub issue_date: String,
    #[serde(default)]
    pub delivery_date: Option<String>,
    pub supplier: Supplier,
    #[serde(default)]
    pub payment_terms: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub tax_rate: f64, // percent, e.g. 18.0
    #[serde(default)]
    pub tax_exempt: bool,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub requester: Option<Signer>,
    #[serde(default)]
    pub approver: Option<Signer>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    #[serde(default)]
    pub observations: Option<String>,
}

impl LineItem {
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub header: DocumentHeader,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// Figures printed in the totals block. Only the subtotal is accumulated;
/// tax and total are always derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub total: f64,
    pub tax_exempt: bool,
}

impl Totals {
    pub fn compute(subtotal: f64, tax_rate: f64, tax_exempt: bool) -> Self {
        let tax = if tax_exempt {
            0.0
        } else {
            subtotal * tax_rate / 100.0
        };
        Totals {
            subtotal,
            tax_rate,
            tax,
            total: subtotal + tax,
            tax_exempt,
        }
    }
}

/// Color model of a JPEG, read from its frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JpegColor {
    Gray,
    Rgb,
    /// `inverted` when an Adobe APP14 segment is present; such files store
    /// CMYK inverted.
    Cmyk { inverted: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg(JpegColor),
    Png,
}

#[derive(Clone)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl EmbeddedImage {
    /// Display size in points that fits inside `max_w` x `max_h` keeping the
    /// aspect ratio.
    pub fn fit_within(&self, max_w: f32, max_h: f32) -> (f32, f32) {
        if self.pixel_width == 0 || self.pixel_height == 0 {
            return (0.0, 0.0);
        }
        let w = self.pixel_width as f32;
        let h = self.pixel_height as f32;
        let scale = (max_w / w).min(max_h / h);
        (w * scale, h * scale)
    }
}
