//! CSV export of stored invoices.

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::invoice::InvoiceRecord;

/// Column headers, in output order.
pub const CSV_HEADERS: [&str; 11] = [
    "ID",
    "Vendor",
    "Date",
    "Invoice No",
    "Tax ID",
    "Currency",
    "Subtotal",
    "Tax Rate",
    "Tax Amount",
    "Total",
    "Status",
];

/// Render records as CSV text. Fields containing commas, quotes or newlines are quoted.
pub fn records_to_csv(records: &[InvoiceRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADERS)?;

    for record in records {
        let f = &record.fields;
        let amounts = [f.subtotal, f.tax_rate, f.tax_amount, f.grand_total].map(|n| n.to_string());
        wtr.write_record([
            record.id.as_str(),
            f.vendor_name.as_deref().unwrap_or(""),
            f.invoice_date.as_deref().unwrap_or(""),
            f.invoice_number.as_deref().unwrap_or(""),
            f.tax_id.as_deref().unwrap_or(""),
            f.currency.code(),
            amounts[0].as_str(),
            amounts[1].as_str(),
            amounts[2].as_str(),
            amounts[3].as_str(),
            record.status.as_str(),
        ])?;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Download name for an export made on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("invoices_export_{}.csv", date.format("%Y-%m-%d"))
}
