//! Dashboard statistics over stored invoices.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use serde::Serialize;

use crate::models::invoice::{Currency, InvoiceRecord};

/// Spend and tax totals for one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CurrencyTotals {
    pub spend: f64,
    pub tax: f64,
}

/// Grand total per vendor group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorTotal {
    /// Vendor name as it appeared on the first invoice of the group.
    pub name: String,
    pub total: f64,
    pub invoice_count: usize,
}

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    /// Totals per currency; amounts are never mixed across currencies.
    pub by_currency: BTreeMap<Currency, CurrencyTotals>,
    pub invoice_count: usize,
    pub review_count: usize,
    /// Vendors sorted by total, largest first.
    pub vendors: Vec<VendorTotal>,
    /// Statistics over positive tax rates, `None` when no invoice has one.
    pub tax_rate: Option<TaxRateStats>,
    /// Current and previous month per currency, by upload time.
    pub monthly: BTreeMap<Currency, MonthComparison>,
    /// `None` when there are no invoices.
    pub month_over_month: Option<MonthOverMonth>,
    /// Mean grand total over the current and previous month, per currency.
    pub average_per_invoice: BTreeMap<Currency, f64>,
    /// Largest vendor's percent of all vendor spend.
    pub top_vendor_share: f64,
    pub vendor_count: usize,
}

/// Spend, invoice count and tax uploaded within one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub spend: f64,
    pub count: usize,
    pub tax: f64,
}

impl MonthlyTotals {
    fn add(&mut self, record: &InvoiceRecord) {
        self.spend += record.fields.grand_total;
        self.tax += record.fields.tax_amount;
        self.count += 1;
    }
}

/// This month against last month for one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthComparison {
    pub current: MonthlyTotals,
    pub previous: MonthlyTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Month-over-month spend change in the primary currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthOverMonth {
    pub currency: Currency,
    pub current_spend: f64,
    pub previous_spend: f64,
    /// Percent change; 100 when last month had no spend but this month does.
    pub change_pct: f64,
    pub direction: Trend,
}

impl MonthOverMonth {
    fn new(currency: Currency, month: &MonthComparison) -> Self {
        let (current, previous) = (month.current.spend, month.previous.spend);
        let (change_pct, direction) = if previous > 0.0 {
            let pct = (current - previous) / previous * 100.0;
            let direction = if pct > 1.0 {
                Trend::Up
            } else if pct < -1.0 {
                Trend::Down
            } else {
                Trend::Stable
            };
            (pct, direction)
        } else if current > 0.0 {
            (100.0, Trend::Up)
        } else {
            (0.0, Trend::Stable)
        };

        MonthOverMonth {
            currency,
            current_spend: current,
            previous_spend: previous,
            change_pct,
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxRateStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl DashboardStats {
    /// Aggregate `records` with months taken in local time.
    pub fn from_records(records: &[InvoiceRecord]) -> Self {
        Self::from_records_at(records, &Local::now())
    }

    /// Aggregate `records`, treating `now` as the current month.
    pub fn from_records_at<Tz: TimeZone>(records: &[InvoiceRecord], now: &DateTime<Tz>) -> Self {
        let mut stats = DashboardStats {
            invoice_count: records.len(),
            ..Default::default()
        };

        let current_month = (now.year(), now.month());
        let previous_month = match current_month {
            (year, 1) => (year - 1, 12),
            (year, month) => (year, month - 1),
        };
        // records arrive newest first, so this is the latest upload's currency
        let primary = records.first().map(|r| r.fields.currency);

        let mut groups: HashMap<String, VendorTotal> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut rates: Vec<f64> = Vec::new();

        for record in records {
            let f = &record.fields;

            let totals = stats.by_currency.entry(f.currency).or_default();
            totals.spend += f.grand_total;
            totals.tax += f.tax_amount;

            if record.needs_review() {
                stats.review_count += 1;
            }

            let month = stats.monthly.entry(f.currency).or_default();
            let uploaded = DateTime::<Utc>::from_timestamp_millis(record.upload_timestamp)
                .map(|t| t.with_timezone(&now.timezone()))
                .map(|t| (t.year(), t.month()));
            if uploaded == Some(current_month) {
                month.current.add(record);
            } else if uploaded == Some(previous_month) {
                month.previous.add(record);
            }

            if f.tax_rate > 0.0 {
                rates.push(f.tax_rate);
            }

            let display = f
                .vendor_name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("UNKNOWN");
            let key = vendor_key(display);
            let group = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                VendorTotal {
                    name: display.to_string(),
                    total: 0.0,
                    invoice_count: 0,
                }
            });
            group.total += f.grand_total;
            group.invoice_count += 1;
        }

        // first-seen order breaks ties deterministically
        let mut vendors: Vec<VendorTotal> = order
            .into_iter()
            .filter_map(|k| groups.remove(&k))
            .collect();
        vendors.sort_by(|a, b| b.total.total_cmp(&a.total));

        let vendor_spend: f64 = vendors.iter().map(|v| v.total).sum();
        if let Some(top) = vendors.first().filter(|_| vendor_spend > 0.0) {
            stats.top_vendor_share = top.total / vendor_spend * 100.0;
        }
        stats.vendor_count = vendors.len();
        stats.vendors = vendors;

        stats.month_over_month = primary
            .and_then(|c| stats.monthly.get(&c).map(|m| MonthOverMonth::new(c, m)));

        for (currency, month) in &stats.monthly {
            let count = month.current.count + month.previous.count;
            if count > 0 {
                let spend = month.current.spend + month.previous.spend;
                stats.average_per_invoice.insert(*currency, spend / count as f64);
            }
        }

        if !rates.is_empty() {
            let sum: f64 = rates.iter().sum();
            stats.tax_rate = Some(TaxRateStats {
                average: sum / rates.len() as f64,
                min: rates.iter().copied().fold(f64::INFINITY, f64::min),
                max: rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            });
        }

        stats
    }

    /// The `n` vendors with the largest totals.
    pub fn top_vendors(&self, n: usize) -> &[VendorTotal] {
        &self.vendors[..n.min(self.vendors.len())]
    }
}

/// Grouping key for a vendor: first word (3+ chars) of the folded, upper-cased name.
pub fn vendor_key(name: &str) -> String {
    let normalized = fold_turkish(&name.trim().to_uppercase());
    match normalized.split_whitespace().next() {
        Some(first) if first.chars().count() >= 3 => first.to_string(),
        _ => normalized,
    }
}

fn fold_turkish(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'İ' | 'I' => 'I',
            'ı' => 'i',
            'Ş' => 'S',
            'ş' => 's',
            'Ğ' => 'G',
            'ğ' => 'g',
            'Ü' => 'U',
            'ü' => 'u',
            'Ö' => 'O',
            'ö' => 'o',
            'Ç' => 'C',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
