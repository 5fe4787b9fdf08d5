//! Arithmetic consistency check: subtotal + tax must equal the grand total.

use crate::models::invoice::{ExtractedFields, InvoiceStatus};

/// Largest difference still treated as consistent.
///
/// Wider than a cent to absorb rounding noise from the extraction.
pub const TOLERANCE: f64 = 0.05;

/// Outcome of the arithmetic check.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub status: InvoiceStatus,
    pub message: Option<String>,
}

/// Compare `subtotal + tax_amount` against `grand_total`.
///
/// Never fails: a mismatch yields `ReviewRequired` with a message naming the
/// compared values and the difference.
pub fn validate(fields: &ExtractedFields) -> Validation {
    let calculated = fields.subtotal + fields.tax_amount;
    let diff = (calculated - fields.grand_total).abs();

    if diff < TOLERANCE {
        Validation {
            status: InvoiceStatus::Valid,
            message: None,
        }
    } else {
        Validation {
            status: InvoiceStatus::ReviewRequired,
            message: Some(format!(
                "Math mismatch: Subtotal ({}) + Tax ({}) != Total ({}). Diff: {:.2}",
                fields.subtotal, fields.tax_amount, fields.grand_total, diff
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(subtotal: f64, tax_amount: f64, grand_total: f64) -> ExtractedFields {
        ExtractedFields {
            subtotal,
            tax_amount,
            grand_total,
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_match_is_valid() {
        let v = validate(&fields(100.0, 20.0, 120.0));
        assert_eq!(v.status, InvoiceStatus::Valid);
        assert_eq!(v.message, None);
    }

    #[test]
    fn test_mismatch_requires_review() {
        let v = validate(&fields(100.0, 20.0, 125.0));
        assert_eq!(v.status, InvoiceStatus::ReviewRequired);

        let msg = v.message.unwrap();
        assert!(msg.contains("100"));
        assert!(msg.contains("20"));
        assert!(msg.contains("125"));
        assert!(msg.contains("Diff: 5.00"));
    }

    #[test]
    fn test_rounding_noise_within_tolerance() {
        // 0.1 + 0.2 style float noise and sub-tolerance rounding
        assert_eq!(validate(&fields(0.1, 0.2, 0.3)).status, InvoiceStatus::Valid);
        assert_eq!(validate(&fields(1000.0, 180.0, 1180.04)).status, InvoiceStatus::Valid);
        assert_eq!(validate(&fields(1000.0, 180.0, 1179.96)).status, InvoiceStatus::Valid);
    }

    #[test]
    fn test_boundary_at_tolerance() {
        let v = validate(&fields(10.0, 0.0, 10.5));
        assert_eq!(v.status, InvoiceStatus::ReviewRequired);
        assert!(v.message.unwrap().ends_with("Diff: 0.50"));

        let v = validate(&fields(10.0, 0.0, 10.06));
        assert_eq!(v.status, InvoiceStatus::ReviewRequired);
        assert!(v.message.unwrap().ends_with("Diff: 0.06"));
    }

    #[test]
    fn test_missing_numbers_count_as_zero() {
        assert_eq!(validate(&ExtractedFields::default()).status, InvoiceStatus::Valid);

        let v = validate(&fields(0.0, 0.0, 59.9));
        assert_eq!(v.status, InvoiceStatus::ReviewRequired);
        assert!(v.message.unwrap().contains("Diff: 59.90"));
    }

    #[test]
    fn test_tax_rate_is_ignored() {
        let mut f = fields(100.0, 20.0, 120.0);
        f.tax_rate = 99.0;
        assert_eq!(validate(&f).status, InvoiceStatus::Valid);
    }

    #[test]
    fn test_grid_of_differences() {
        for diff in [0.0, 0.01, 0.02, 0.03, 0.04, 0.049] {
            let v = validate(&fields(200.0, 40.0, 240.0 + diff));
            assert_eq!(v.status, InvoiceStatus::Valid, "diff {diff}");
        }
        for diff in [0.051, 0.1, 1.0, -0.06, -3.0] {
            let v = validate(&fields(200.0, 40.0, 240.0 + diff));
            assert_eq!(v.status, InvoiceStatus::ReviewRequired, "diff {diff}");
            assert!(v.message.is_some());
        }
    }
}
