//! Invoice data models: oracle output and stored records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::invoice::validation::{Validation, validate};

/// Currency detected on the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Turkish lira.
    Try,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
    /// Pound sterling.
    Gbp,
    /// The oracle could not tell.
    Unknown,
}

impl Currency {
    /// All currencies in schema order.
    pub const ALL: [Currency; 5] = [
        Currency::Try,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Unknown,
    ];

    /// ISO-style code as used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Try => "TRY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Unknown => "UNKNOWN",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| format!("unknown currency: {}", s))
    }
}

/// Review status of a stored invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Subtotal plus tax matches the grand total.
    Valid,
    /// Arithmetic mismatch, a human should look at it.
    ReviewRequired,
    /// Still being ingested.
    Processing,
    /// Ingestion failed.
    Error,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Valid => "VALID",
            InvoiceStatus::ReviewRequired => "REVIEW_REQUIRED",
            InvoiceStatus::Processing => "PROCESSING",
            InvoiceStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "VALID" => Ok(InvoiceStatus::Valid),
            "REVIEW_REQUIRED" | "REVIEW" => Ok(InvoiceStatus::ReviewRequired),
            "PROCESSING" => Ok(InvoiceStatus::Processing),
            "ERROR" => Ok(InvoiceStatus::Error),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// Structured fields returned by the oracle for one document.
///
/// Required keys (`vendor_name`, `invoice_date`, `subtotal`, `grand_total`,
/// `currency`) mirror the response schema sent with each request. Numbers that
/// come back as `null` are read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Name of the vendor or supplier.
    pub vendor_name: Option<String>,

    /// Tax identification number (VKN/TCKN/VAT ID).
    #[serde(default)]
    pub tax_id: Option<String>,

    /// Invoice date, expected as `YYYY-MM-DD` but not enforced.
    pub invoice_date: Option<String>,

    /// Invoice number as printed.
    #[serde(default)]
    pub invoice_number: Option<String>,

    pub currency: Currency,

    /// Amount before tax.
    #[serde(deserialize_with = "zero_if_null")]
    pub subtotal: f64,

    /// Tax rate in percent (20 for 20%).
    #[serde(default, deserialize_with = "zero_if_null")]
    pub tax_rate: f64,

    #[serde(default, deserialize_with = "zero_if_null")]
    pub tax_amount: f64,

    /// Final total including tax.
    #[serde(deserialize_with = "zero_if_null")]
    pub grand_total: f64,
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl Default for ExtractedFields {
    fn default() -> Self {
        Self {
            vendor_name: None,
            tax_id: None,
            invoice_date: None,
            invoice_number: None,
            currency: Currency::Unknown,
            subtotal: 0.0,
            tax_rate: 0.0,
            tax_amount: 0.0,
            grand_total: 0.0,
        }
    }
}

/// A stored invoice: extracted fields plus identity and review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Short identifier, 8 uppercase alphanumeric characters.
    pub id: String,

    /// Original upload filename.
    pub filename: String,

    /// Upload time in epoch milliseconds.
    pub upload_timestamp: i64,

    pub status: InvoiceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_message: Option<String>,

    #[serde(flatten)]
    pub fields: ExtractedFields,
}

impl InvoiceRecord {
    /// Build a fully formed record, deriving status from the fields.
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        upload_timestamp: i64,
        fields: ExtractedFields,
    ) -> Self {
        let Validation { status, message } = validate(&fields);
        Self {
            id: id.into(),
            filename: filename.into(),
            upload_timestamp,
            status,
            validation_message: message,
            fields,
        }
    }

    /// Re-derive status and message from the current numeric fields.
    pub fn revalidate(&mut self) {
        let Validation { status, message } = validate(&self.fields);
        self.status = status;
        self.validation_message = message;
    }

    /// Whether this record waits for a human reviewer.
    pub fn needs_review(&self) -> bool {
        self.status == InvoiceStatus::ReviewRequired
    }
}

/// Generate a short record identifier.
///
/// Eight uppercase hex characters from a v4 UUID; collisions are negligible
/// for a single user's archive.
pub fn generate_record_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_currency_parsing() {
        assert_eq!("try".parse::<Currency>(), Ok(Currency::Try));
        assert_eq!(" EUR ".parse::<Currency>(), Ok(Currency::Eur));
        assert!("PLN".parse::<Currency>().is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("review".parse::<InvoiceStatus>(), Ok(InvoiceStatus::ReviewRequired));
        assert_eq!(
            "review-required".parse::<InvoiceStatus>(),
            Ok(InvoiceStatus::ReviewRequired)
        );
        assert_eq!("valid".parse::<InvoiceStatus>(), Ok(InvoiceStatus::Valid));
    }

    #[test]
    fn test_fields_from_oracle_json() {
        let json = r#"{
            "vendor_name": "ACME Ltd",
            "tax_id": null,
            "invoice_date": "2024-03-01",
            "invoice_number": "INV-7",
            "currency": "TRY",
            "subtotal": 100,
            "tax_rate": null,
            "tax_amount": 20.0,
            "grand_total": 120.0,
            "confidence": 0.9
        }"#;

        let fields: ExtractedFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.vendor_name.as_deref(), Some("ACME Ltd"));
        assert_eq!(fields.currency, Currency::Try);
        assert_eq!(fields.tax_rate, 0.0);
        assert_eq!(fields.grand_total, 120.0);
    }

    #[test]
    fn test_fields_missing_required_number_is_rejected() {
        let json = r#"{"vendor_name": "X", "invoice_date": null, "currency": "USD", "subtotal": 1}"#;
        assert!(serde_json::from_str::<ExtractedFields>(json).is_err());
    }

    #[test]
    fn test_fields_type_mismatch_is_rejected() {
        let json = r#"{"vendor_name": "X", "invoice_date": null, "currency": "USD",
                       "subtotal": "100", "grand_total": 100}"#;
        assert!(serde_json::from_str::<ExtractedFields>(json).is_err());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = InvoiceRecord::new("ABCD1234", "a.pdf", 1_700_000_000_000, ExtractedFields {
            subtotal: 100.0,
            tax_amount: 20.0,
            grand_total: 120.0,
            currency: Currency::Usd,
            ..Default::default()
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "ABCD1234");
        assert_eq!(value["status"], "VALID");
        assert_eq!(value["currency"], "USD");
        assert_eq!(value["grand_total"], 120.0);
        assert!(value.get("validation_message").is_none());

        let back: InvoiceRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_generate_record_id_shape() {
        let a = generate_record_id();
        let b = generate_record_id();
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_ne!(a, b);
    }
}
