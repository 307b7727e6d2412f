use std::fmt::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::Error;

const DEFAULT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Page size and margins in points. Origin is the bottom-left corner, as in PDF.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4
        PageGeometry {
            width: 595.28,
            height: 841.89,
            margin_top: 36.0,
            margin_bottom: 36.0,
            margin_left: 36.0,
            margin_right: 36.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn top(&self) -> f32 {
        self.height - self.margin_top
    }

    pub fn right(&self) -> f32 {
        self.width - self.margin_right
    }
}

/// Every caption printed on the document.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Labels {
    pub title: String,
    pub number_prefix: String,
    pub tax_id: String,
    pub supplier: String,
    pub supplier_tax_id: String,
    pub supplier_address: String,
    pub contact: String,
    pub issue_date: String,
    pub delivery_date: String,
    pub payment_terms: String,
    pub currency: String,
    pub exchange_rate: String,
    pub warehouse: String,
    pub delivery_address: String,
    pub requester: String,
    pub items_title: String,
    pub col_index: String,
    pub col_description: String,
    pub col_quantity: String,
    pub col_unit: String,
    pub col_unit_price: String,
    pub col_subtotal: String,
    pub observations: String,
    pub notes: String,
    pub subtotal: String,
    /// Name of the sales tax, printed as "{tax} ({rate}%)".
    pub tax: String,
    pub total: String,
    pub requested_by: String,
    pub approved_by: String,
    pub id_number: String,
    /// `{page}` and `{total}` are substituted.
    pub page_stamp: String,
    pub generated_at: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            title: "ORDEN DE COMPRA".into(),
            number_prefix: "N°".into(),
            tax_id: "RUC".into(),
            supplier: "Proveedor".into(),
            supplier_tax_id: "RUC".into(),
            supplier_address: "Dirección".into(),
            contact: "Contacto".into(),
            issue_date: "Fecha de emisión".into(),
            delivery_date: "Fecha de entrega".into(),
            payment_terms: "Condición de pago".into(),
            currency: "Moneda".into(),
            exchange_rate: "Tipo de cambio".into(),
            warehouse: "Almacén".into(),
            delivery_address: "Dirección de entrega".into(),
            requester: "Solicitante".into(),
            items_title: "DETALLE DE PRODUCTOS".into(),
            col_index: "#".into(),
            col_description: "Producto".into(),
            col_quantity: "Cant.".into(),
            col_unit: "U.M.".into(),
            col_unit_price: "P. Unit.".into(),
            col_subtotal: "Subtotal".into(),
            observations: "Obs.".into(),
            notes: "Observaciones".into(),
            subtotal: "Subtotal".into(),
            tax: "IGV".into(),
            total: "TOTAL".into(),
            requested_by: "Solicitado por".into(),
            approved_by: "Aprobado por".into(),
            id_number: "DNI".into(),
            page_stamp: "Página {page} de {total}".into(),
            generated_at: "Generado el".into(),
        }
    }
}

impl Labels {
    pub(crate) fn all(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.number_prefix.as_str(),
            self.tax_id.as_str(),
            self.supplier.as_str(),
            self.supplier_tax_id.as_str(),
            self.supplier_address.as_str(),
            self.contact.as_str(),
            self.issue_date.as_str(),
            self.delivery_date.as_str(),
            self.payment_terms.as_str(),
            self.currency.as_str(),
            self.exchange_rate.as_str(),
            self.warehouse.as_str(),
            self.delivery_address.as_str(),
            self.requester.as_str(),
            self.items_title.as_str(),
            self.col_index.as_str(),
            self.col_description.as_str(),
            self.col_quantity.as_str(),
            self.col_unit.as_str(),
            self.col_unit_price.as_str(),
            self.col_subtotal.as_str(),
            self.observations.as_str(),
            self.notes.as_str(),
            self.subtotal.as_str(),
            self.tax.as_str(),
            self.total.as_str(),
            self.requested_by.as_str(),
            self.approved_by.as_str(),
            self.id_number.as_str(),
            self.page_stamp.as_str(),
            self.generated_at.as_str(),
        ]
    }

    pub fn page_stamp(&self, page: usize, total: usize) -> String {
        self.page_stamp
            .replace("{page}", &page.to_string())
            .replace("{total}", &total.to_string())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FontOptions {
    /// TrueType/OpenType file for regular text. Helvetica when absent.
    pub regular: Option<PathBuf>,
    /// TrueType/OpenType file for bold text. Helvetica-Bold when absent.
    pub bold: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RenderOptions {
    pub page: PageGeometry,
    pub labels: Labels,
    pub fonts: FontOptions,
    pub logo_timeout_secs: u64,
    pub repeat_full_header: bool,
    pub generated_at: Option<NaiveDateTime>,
    pub timestamp_format: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            page: PageGeometry::default(),
            labels: Labels::default(),
            fonts: FontOptions::default(),
            logo_timeout_secs: 10,
            repeat_full_header: true,
            generated_at: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.into(),
        }
    }
}

impl RenderOptions {
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn generation_timestamp(&self) -> String {
        let at = self
            .generated_at
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        let mut out = String::new();
        if write!(out, "{}", at.format(&self.timestamp_format)).is_err() {
            log::warn!("Invalid timestamp format {:?}, using the default", self.timestamp_format);
            out = at.format(DEFAULT_TIMESTAMP_FORMAT).to_string();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: RenderOptions = serde_json::from_str(
            r#"{ "page": { "marginLeft": 50 }, "labels": { "tax": "IVA" }, "repeatFullHeader": false }"#,
        )
        .unwrap();
        assert_eq!(opts.page.margin_left, 50.0);
        assert_eq!(opts.page.margin_right, 36.0);
        assert_eq!(opts.labels.tax, "IVA");
        assert_eq!(opts.labels.total, "TOTAL");
        assert!(!opts.repeat_full_header);
        assert_eq!(opts.logo_timeout_secs, 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<RenderOptions, _> = serde_json::from_str(r#"{ "pageSize": "A4" }"#);
        assert!(res.is_err());
    }

    #[test]
    fn page_stamp_substitution() {
        let labels = Labels::default();
        assert_eq!(labels.page_stamp(2, 5), "Página 2 de 5");
    }

    #[test]
    fn fixed_timestamp() {
        let opts = RenderOptions {
            generated_at: chrono::NaiveDate::from_ymd_opt(2026, 3, 9)
                .and_then(|d| d.and_hms_opt(14, 5, 0)),
            ..Default::default()
        };
        assert_eq!(opts.generation_timestamp(), "09/03/2026 14:05");
    }

    #[test]
    fn broken_timestamp_format_uses_the_default() {
        let opts = RenderOptions {
            generated_at: chrono::NaiveDate::from_ymd_opt(2026, 3, 9)
                .and_then(|d| d.and_hms_opt(14, 5, 0)),
            timestamp_format: "%Y %".into(),
            ..Default::default()
        };
        assert_eq!(opts.generation_timestamp(), "09/03/2026 14:05");
    }
}
