//! Constrained output shape and instructions sent with every extraction.

use serde_json::{Value, json};

use crate::models::invoice::Currency;

/// Keys the oracle must always return.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "vendor_name",
    "invoice_date",
    "subtotal",
    "grand_total",
    "currency",
];

pub const EXTRACTION_PROMPT: &str = "You are a professional Financial Audit Specialist.
Extract data from this invoice document with 100% mathematical accuracy.

Strictly follow these rules:
1. Extract the Vendor Name, Tax ID, Invoice Date, and Invoice Number.
2. Detect the currency (TRY, USD, EUR, etc.).
3. Extract the Subtotal (Matrah), Tax Rate (KDV %), Tax Amount (KDV Tutari), and Grand Total.
4. If a field is not present or cannot be inferred, return null for strings or 0 for numbers.
5. Ensure all number fields are pure floats (no currency symbols).
6. Return ONLY the JSON object defined in the schema.";

/// JSON response schema in the Generative Language API dialect.
pub fn response_schema() -> Value {
    let currencies: Vec<&str> = Currency::ALL.iter().map(Currency::code).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "vendor_name": { "type": "STRING", "description": "Name of the vendor or supplier." },
            "tax_id": { "type": "STRING", "description": "Tax identification number (VKN/TCKN/VAT ID)." },
            "invoice_date": { "type": "STRING", "description": "Date of the invoice in YYYY-MM-DD format." },
            "invoice_number": { "type": "STRING", "description": "The unique invoice number." },
            "currency": {
                "type": "STRING",
                "enum": currencies,
                "description": "Currency code detected from the invoice."
            },
            "subtotal": { "type": "NUMBER", "description": "The subtotal amount before tax (Matrah)." },
            "tax_rate": { "type": "NUMBER", "description": "The tax rate percentage (e.g., 20 for 20%)." },
            "tax_amount": { "type": "NUMBER", "description": "The calculated tax amount (KDV Tutari)." },
            "grand_total": { "type": "NUMBER", "description": "The final total amount including tax." }
        },
        "required": REQUIRED_FIELDS,
    })
}
