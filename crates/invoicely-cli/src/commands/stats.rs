//! Stats command - dashboard figures over the stored invoices.

use clap::Args;
use console::style;

use invoicely_core::invoice::{DashboardStats, Trend};
use invoicely_core::store::RecordStore;

use super::{load_config, open_store};

const TOP_VENDORS: usize = 5;

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Print statistics as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config);

    let records = store.list()?;
    let stats = DashboardStats::from_records(&records);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "{} invoices, {} need review",
        style(stats.invoice_count).bold(),
        style(stats.review_count).yellow()
    );

    if !stats.by_currency.is_empty() {
        println!();
        println!("{}", style("Spend by currency:").bold());
        for (currency, totals) in &stats.by_currency {
            println!(
                "  {:<8} {:>14.2}  (tax {:.2})",
                currency.code(),
                totals.spend,
                totals.tax
            );
        }
    }

    if let Some(mom) = &stats.month_over_month {
        let change = format!("{:+.1}%", mom.change_pct);
        let change = match mom.direction {
            Trend::Up => style(change).red(),
            Trend::Down => style(change).green(),
            Trend::Stable => style(change).dim(),
        };
        println!();
        println!(
            "This month: {:.2} {} vs {:.2} last month ({})",
            mom.current_spend,
            mom.currency.code(),
            mom.previous_spend,
            change
        );
    }

    if !stats.average_per_invoice.is_empty() {
        println!();
        println!("{}", style("Average per invoice (last two months):").bold());
        for (currency, average) in &stats.average_per_invoice {
            println!("  {:<8} {:>14.2}", currency.code(), average);
        }
    }

    if let Some(rates) = &stats.tax_rate {
        println!();
        println!(
            "Tax rate: avg {:.1}%, min {:.1}%, max {:.1}%",
            rates.average, rates.min, rates.max
        );
    }

    let vendors = stats.top_vendors(TOP_VENDORS);
    if !vendors.is_empty() {
        println!();
        println!(
            "{} {} vendors, largest takes {:.1}% of spend",
            style("Top vendors:").bold(),
            stats.vendor_count,
            stats.top_vendor_share
        );
        for (rank, vendor) in vendors.iter().enumerate() {
            println!(
                "  {}. {:<30} {:>14.2}  ({} invoices)",
                rank + 1,
                vendor.name,
                vendor.total,
                vendor.invoice_count
            );
        }
    }

    Ok(())
}
