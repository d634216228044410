//! WooCommerce import rows and batch output files
//!
//! Output is written once per batch: the JSON backup of every record
//! first, then the CSV import file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::assembler::ProductRecord;
use crate::error::ExportError;
use crate::events::{EventSink, PipelineEvent, Stage};

pub const JSON_BACKUP_FILE: &str = "raw_products.json";

/// CSV header, in the field order of [`ExportRow`]
pub const COLUMNS: [&str; 46] = [
    "Type",
    "SKU",
    "Name",
    "Published",
    "Featured",
    "Visibility in catalog",
    "Short description",
    "Description",
    "Date sale price starts",
    "Date sale price ends",
    "Tax status",
    "Tax class",
    "In stock?",
    "Stock",
    "Backorders allowed?",
    "Sold individually?",
    "Weight (kg)",
    "Length (cm)",
    "Width (cm)",
    "Height (cm)",
    "Allow customer reviews?",
    "Purchase note",
    "Sale price",
    "Regular price",
    "Categories",
    "Tags",
    "Shipping class",
    "Images",
    "Download limit",
    "Download expiry days",
    "Parent",
    "Grouped products",
    "Upsells",
    "Cross-sells",
    "External URL",
    "Button text",
    "Position",
    "Attribute 1 name",
    "Attribute 1 value(s)",
    "Attribute 1 visible",
    "Attribute 1 global",
    "Attribute 2 name",
    "Attribute 2 value(s)",
    "Attribute 2 visible",
    "Attribute 2 global",
    "Product Link",
];

/// One CSV row in WooCommerce's product import layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Type")]
    pub product_type: &'static str,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Published")]
    pub published: &'static str,
    #[serde(rename = "Featured")]
    pub featured: &'static str,
    #[serde(rename = "Visibility in catalog")]
    pub visibility: &'static str,
    #[serde(rename = "Short description")]
    pub short_description: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Date sale price starts")]
    pub sale_starts: &'static str,
    #[serde(rename = "Date sale price ends")]
    pub sale_ends: &'static str,
    #[serde(rename = "Tax status")]
    pub tax_status: &'static str,
    #[serde(rename = "Tax class")]
    pub tax_class: &'static str,
    #[serde(rename = "In stock?")]
    pub in_stock: &'static str,
    #[serde(rename = "Stock")]
    pub stock: &'static str,
    #[serde(rename = "Backorders allowed?")]
    pub backorders: &'static str,
    #[serde(rename = "Sold individually?")]
    pub sold_individually: &'static str,
    #[serde(rename = "Weight (kg)")]
    pub weight: &'static str,
    #[serde(rename = "Length (cm)")]
    pub length: &'static str,
    #[serde(rename = "Width (cm)")]
    pub width: &'static str,
    #[serde(rename = "Height (cm)")]
    pub height: &'static str,
    #[serde(rename = "Allow customer reviews?")]
    pub reviews: &'static str,
    #[serde(rename = "Purchase note")]
    pub purchase_note: &'static str,
    #[serde(rename = "Sale price")]
    pub sale_price: &'static str,
    #[serde(rename = "Regular price")]
    pub regular_price: String,
    /// Pipe-delimited
    #[serde(rename = "Categories")]
    pub categories: String,
    #[serde(rename = "Tags")]
    pub tags: &'static str,
    #[serde(rename = "Shipping class")]
    pub shipping_class: &'static str,
    /// Comma-delimited
    #[serde(rename = "Images")]
    pub images: String,
    #[serde(rename = "Download limit")]
    pub download_limit: &'static str,
    #[serde(rename = "Download expiry days")]
    pub download_expiry: &'static str,
    #[serde(rename = "Parent")]
    pub parent: &'static str,
    #[serde(rename = "Grouped products")]
    pub grouped: &'static str,
    #[serde(rename = "Upsells")]
    pub upsells: &'static str,
    #[serde(rename = "Cross-sells")]
    pub cross_sells: &'static str,
    #[serde(rename = "External URL")]
    pub external_url: &'static str,
    #[serde(rename = "Button text")]
    pub button_text: &'static str,
    #[serde(rename = "Position")]
    pub position: &'static str,
    #[serde(rename = "Attribute 1 name")]
    pub attribute_1_name: String,
    #[serde(rename = "Attribute 1 value(s)")]
    pub attribute_1_value: String,
    #[serde(rename = "Attribute 1 visible")]
    pub attribute_1_visible: &'static str,
    #[serde(rename = "Attribute 1 global")]
    pub attribute_1_global: &'static str,
    #[serde(rename = "Attribute 2 name")]
    pub attribute_2_name: String,
    #[serde(rename = "Attribute 2 value(s)")]
    pub attribute_2_value: String,
    #[serde(rename = "Attribute 2 visible")]
    pub attribute_2_visible: &'static str,
    #[serde(rename = "Attribute 2 global")]
    pub attribute_2_global: &'static str,
    /// Source URL
    #[serde(rename = "Product Link")]
    pub product_link: String,
}

impl ExportRow {
    pub fn from_record(record: &ProductRecord) -> Self {
        let mut attributes = record.attributes().iter();
        let (attribute_1_name, attribute_1_value) = attributes
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
            .unwrap_or_default();
        let (attribute_2_name, attribute_2_value) = attributes
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
            .unwrap_or_default();

        Self {
            product_type: "simple",
            sku: record.sku().to_string(),
            name: record.name().to_string(),
            published: "1",
            featured: "0",
            visibility: "visible",
            short_description: record.short_description().to_string(),
            description: record.description().to_string(),
            sale_starts: "",
            sale_ends: "",
            tax_status: "taxable",
            tax_class: "",
            in_stock: "yes",
            stock: "",
            backorders: "0",
            sold_individually: "0",
            weight: "",
            length: "",
            width: "",
            height: "",
            reviews: "1",
            purchase_note: "",
            sale_price: "",
            regular_price: record.price().to_string(),
            categories: record.categories().join("|"),
            tags: "",
            shipping_class: "",
            images: record.images().join(","),
            download_limit: "",
            download_expiry: "",
            parent: "",
            grouped: "",
            upsells: "",
            cross_sells: "",
            external_url: "",
            button_text: "",
            position: "",
            attribute_1_name,
            attribute_1_value,
            attribute_1_visible: "1",
            attribute_1_global: "1",
            attribute_2_name,
            attribute_2_value,
            attribute_2_visible: "1",
            attribute_2_global: "1",
            product_link: record.source_url().to_string(),
        }
    }
}

/// Write the header and one row per record. The header is written even
/// for an empty batch.
pub fn write_csv<W: Write>(writer: W, records: &[ProductRecord]) -> Result<(), ExportError> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(COLUMNS)?;
    for record in records {
        csv.serialize(ExportRow::from_record(record))?;
    }
    csv.flush()?;
    Ok(())
}

/// Pretty-printed JSON array of every record
pub fn write_json_backup<W: Write>(writer: W, records: &[ProductRecord]) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Paths produced by [`write_batch_outputs`]
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutputs {
    pub json_backup: PathBuf,
    pub csv: PathBuf,
}

/// Write `raw_products.json` and a timestamped CSV into `dir`
pub fn write_batch_outputs(
    dir: &Path,
    records: &[ProductRecord],
    events: &dyn EventSink,
) -> Result<BatchOutputs, ExportError> {
    fs::create_dir_all(dir)?;
    if records.is_empty() {
        warn!("No products extracted, writing header-only CSV");
    }

    let json_backup = dir.join(JSON_BACKUP_FILE);
    write_json_backup(File::create(&json_backup)?, records)?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let csv = dir.join(format!("woocommerce_import_{stamp}.csv"));
    write_csv(File::create(&csv)?, records)?;

    for record in records {
        events.emit(PipelineEvent::StageEntered {
            url: record.source_url().to_string(),
            stage: Stage::Exported,
        });
    }
    info!("Exported {} products to {}", records.len(), csv.display());

    Ok(BatchOutputs { json_backup, csv })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    fn record() -> ProductRecord {
        serde_json::from_value(serde_json::json!({
            "name": "Wireless Earbuds",
            "description": "",
            "short_description": "",
            "price": "59.9",
            "sku": "1688-1700000000000",
            "images": ["https://cdn.example.com/a.jpg", "https://cdn.example.com/b.jpg"],
            "categories": ["Imported Products", "Headphones"],
            "attributes": {"颜色": "黑色", "材质": "ABS", "重量": "40g"},
            "source_url": "https://detail.example.com/offer/1.html"
        }))
        .unwrap()
    }

    #[test]
    fn test_row_from_record() {
        let row = ExportRow::from_record(&record());
        assert_eq!(row.categories, "Imported Products|Headphones");
        assert_eq!(
            row.images,
            "https://cdn.example.com/a.jpg,https://cdn.example.com/b.jpg"
        );
        assert_eq!(row.regular_price, "59.9");
        assert_eq!(row.product_link, "https://detail.example.com/offer/1.html");
        // BTreeMap order: 材质 < 重量 < 颜色
        assert_eq!(row.attribute_1_name, "材质");
        assert_eq!(row.attribute_1_value, "ABS");
        assert_eq!(row.attribute_2_name, "重量");
        assert_eq!(row.attribute_2_visible, "1");
    }

    #[test]
    fn test_csv_header_and_row() {
        let mut out = Vec::new();
        write_csv(&mut out, &[record()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(header.len(), 46);
        assert_eq!(header[0], "Type");
        assert_eq!(header[45], "Product Link");
        assert!(lines.next().unwrap().starts_with("simple,1688-1700000000000,Wireless Earbuds,1,0,visible"));
    }

    #[test]
    fn test_empty_batch_keeps_header() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 1);
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let header = reader.headers().unwrap().clone();
        assert_eq!(header.len(), 46);
        assert_eq!(&header[45], "Product Link");
        assert_eq!(reader.records().count(), 0);
    }

    #[test]
    fn test_columns_match_row_fields() {
        let mut out = Vec::new();
        let mut csv = csv::Writer::from_writer(&mut out);
        csv.serialize(ExportRow::from_record(&record())).unwrap();
        csv.flush().unwrap();
        drop(csv);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next().unwrap(), COLUMNS.join(","));
    }

    #[test]
    fn test_batch_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let events = RecordingSink::new();
        let outputs = write_batch_outputs(&dir.path().join("out"), &[record()], &events).unwrap();

        let backup: Vec<ProductRecord> =
            serde_json::from_str(&fs::read_to_string(&outputs.json_backup).unwrap()).unwrap();
        assert_eq!(backup, vec![record()]);

        let name = outputs.csv.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("woocommerce_import_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(
            events.count(|e| matches!(e, PipelineEvent::StageEntered { stage: Stage::Exported, .. })),
            1
        );
    }
}
