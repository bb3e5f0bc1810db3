//! A4 invoice rendering with the PDF builtin fonts.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::service::Invoice;
use crate::error::InvoiceError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 7.0;

// Column x positions for the item table
const COL_PRODUCT: f32 = MARGIN;
const COL_QUANTITY: f32 = 110.0;
const COL_UNIT: f32 = 135.0;
const COL_TOTAL: f32 = 165.0;

/// Writes rows top to bottom, starting a new page when the current one fills.
struct Cursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn new(title: &str) -> Self {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        Self {
            doc,
            layer,
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn advance(&mut self, lines: f32) {
        self.y -= LINE_HEIGHT * lines;
        if self.y < MARGIN {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }
}

/// One line of the invoice heading, followed by `gap` blank lines.
#[derive(Debug, PartialEq)]
struct HeaderLine {
    text: String,
    size: f32,
    bold: bool,
    gap: f32,
}

impl HeaderLine {
    fn new(text: impl Into<String>, size: f32, bold: bool, gap: f32) -> Self {
        Self {
            text: text.into(),
            size,
            bold,
            gap,
        }
    }
}

fn header(invoice: &Invoice, shop_name: &str) -> Vec<HeaderLine> {
    vec![
        HeaderLine::new(shop_name, 20.0, true, 1.0),
        HeaderLine::new("Sales receipt", 12.0, false, 2.0),
        HeaderLine::new(format!("Invoice #{}", invoice.order_id), 14.0, true, 1.0),
        HeaderLine::new(
            format!("Date: {}", invoice.date.format("%Y-%m-%d %H:%M")),
            11.0,
            false,
            1.0,
        ),
        HeaderLine::new(format!("Client: {}", invoice.client.name), 11.0, false, 1.0),
        HeaderLine::new(format!("Tax ID: {}", invoice.client.tax_id), 11.0, false, 2.0),
    ]
}

/// Renders an invoice as a PDF document.
///
/// The layout prints the shop name with a "Sales receipt" subtitle, the
/// invoice number and date, the client name and tax id, one row per order
/// item and the grand total.
pub fn render_pdf(invoice: &Invoice, shop_name: &str) -> Result<Vec<u8>, InvoiceError> {
    let mut cursor = Cursor::new(&format!("Invoice {}", invoice.order_id));
    let regular = cursor
        .doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InvoiceError::Render(format!("{e:?}")))?;
    let bold = cursor
        .doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InvoiceError::Render(format!("{e:?}")))?;

    for line in header(invoice, shop_name) {
        let font = if line.bold { &bold } else { &regular };
        cursor.text(&line.text, line.size, MARGIN, font);
        cursor.advance(line.gap);
    }

    cursor.text("Product", 11.0, COL_PRODUCT, &bold);
    cursor.text("Qty", 11.0, COL_QUANTITY, &bold);
    cursor.text("Unit price", 11.0, COL_UNIT, &bold);
    cursor.text("Total", 11.0, COL_TOTAL, &bold);
    cursor.advance(1.0);

    for line in &invoice.lines {
        cursor.text(&line.product_name, 10.0, COL_PRODUCT, &regular);
        cursor.text(&line.quantity.to_string(), 10.0, COL_QUANTITY, &regular);
        cursor.text(&line.unit_price.to_string(), 10.0, COL_UNIT, &regular);
        cursor.text(&line.line_total.to_string(), 10.0, COL_TOTAL, &regular);
        cursor.advance(1.0);
    }

    cursor.advance(1.0);
    cursor.text("TOTAL", 12.0, COL_UNIT, &bold);
    cursor.text(&invoice.total.to_string(), 12.0, COL_TOTAL, &bold);

    cursor
        .doc
        .save_to_bytes()
        .map_err(|e| InvoiceError::Render(format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Client, ClientId, Money, OrderId};

    use crate::invoice::InvoiceLine;

    fn invoice(lines: usize) -> Invoice {
        Invoice {
            order_id: OrderId::new(42),
            date: Utc::now(),
            client: Client {
                id: ClientId::new(1),
                name: "Walk-in customer".to_string(),
                tax_id: "00-00000000-0".to_string(),
            },
            lines: (0..lines)
                .map(|i| InvoiceLine {
                    product_name: format!("Product {i}"),
                    quantity: 1,
                    unit_price: Money::from_cents(500),
                    line_total: Money::from_cents(500),
                })
                .collect(),
            total: Money::from_cents(500 * lines as i64),
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render_pdf(&invoice(2), "Hardware Store").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn heading_prints_subtitle_under_shop_name() {
        let lines: Vec<_> = header(&invoice(1), "Hardware Store")
            .into_iter()
            .map(|line| line.text)
            .collect();

        assert_eq!(lines[0], "Hardware Store");
        assert_eq!(lines[1], "Sales receipt");
        assert_eq!(lines[2], "Invoice #42");
        assert_eq!(lines[4], "Client: Walk-in customer");
        assert_eq!(lines[5], "Tax ID: 00-00000000-0");
    }

    #[test]
    fn long_invoices_spill_onto_more_pages() {
        let short = render_pdf(&invoice(1), "Hardware Store").unwrap();
        let long = render_pdf(&invoice(120), "Hardware Store").unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }
}
