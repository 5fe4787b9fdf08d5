//! Record commands - list, show, edit and delete stored invoices.

use clap::Args;
use console::style;

use invoicely_core::models::invoice::{Currency, InvoiceRecord, InvoiceStatus};
use invoicely_core::store::RecordStore;

use super::{load_config, open_store};

#[derive(Args)]
pub struct ListArgs {
    /// Only show invoices with this status (valid, review, ...)
    #[arg(short, long)]
    status: Option<InvoiceStatus>,

    /// Print records as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Invoice id
    id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Invoice id
    id: String,

    #[arg(long)]
    vendor: Option<String>,

    /// Invoice date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Invoice number
    #[arg(long)]
    number: Option<String>,

    #[arg(long)]
    tax_id: Option<String>,

    #[arg(long)]
    currency: Option<Currency>,

    #[arg(long)]
    subtotal: Option<f64>,

    /// Tax rate in percent
    #[arg(long)]
    tax_rate: Option<f64>,

    #[arg(long)]
    tax_amount: Option<f64>,

    #[arg(long)]
    grand_total: Option<f64>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Invoice id
    id: String,
}

pub fn list(args: ListArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config);

    let records: Vec<InvoiceRecord> = store
        .list()?
        .into_iter()
        .filter(|r| args.status.is_none_or(|s| r.status == s))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{} No invoices stored.", style("ℹ").blue());
        return Ok(());
    }

    println!(
        "{:<10} {:<12} {:<28} {:>12} {:<4} {}",
        "ID", "DATE", "VENDOR", "TOTAL", "CUR", "STATUS"
    );
    for record in &records {
        let f = &record.fields;
        println!(
            "{:<10} {:<12} {:<28} {:>12.2} {:<4} {}",
            record.id,
            f.invoice_date.as_deref().unwrap_or("-"),
            truncate(f.vendor_name.as_deref().unwrap_or("-"), 28),
            f.grand_total,
            f.currency.code(),
            styled_status(record.status)
        );
    }
    println!();
    println!("{} invoices", records.len());

    Ok(())
}

pub fn show(args: ShowArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config);

    let Some(record) = store.get(&args.id)? else {
        anyhow::bail!("No invoice with id {}", args.id);
    };

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn edit(args: EditArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config);

    let Some(mut record) = store.get(&args.id)? else {
        anyhow::bail!("No invoice with id {}", args.id);
    };

    let f = &mut record.fields;
    if let Some(vendor) = args.vendor {
        f.vendor_name = Some(vendor);
    }
    if let Some(date) = args.date {
        f.invoice_date = Some(date);
    }
    if let Some(number) = args.number {
        f.invoice_number = Some(number);
    }
    if let Some(tax_id) = args.tax_id {
        f.tax_id = Some(tax_id);
    }
    if let Some(currency) = args.currency {
        f.currency = currency;
    }
    if let Some(subtotal) = args.subtotal {
        f.subtotal = subtotal;
    }
    if let Some(tax_rate) = args.tax_rate {
        f.tax_rate = tax_rate;
    }
    if let Some(tax_amount) = args.tax_amount {
        f.tax_amount = tax_amount;
    }
    if let Some(grand_total) = args.grand_total {
        f.grand_total = grand_total;
    }

    let Some(updated) = store.update(record)? else {
        anyhow::bail!("Invoice {} was deleted while editing", args.id);
    };

    println!(
        "{} Updated {}: {}",
        style("✓").green(),
        updated.id,
        styled_status(updated.status)
    );
    if let Some(message) = &updated.validation_message {
        println!("   {}", message);
    }

    Ok(())
}

pub fn delete(args: DeleteArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config);

    if !store.delete(&args.id)? {
        anyhow::bail!("No invoice with id {}", args.id);
    }

    println!("{} Deleted {}", style("✓").green(), args.id);
    Ok(())
}

fn styled_status(status: InvoiceStatus) -> console::StyledObject<&'static str> {
    match status {
        InvoiceStatus::Valid => style(status.as_str()).green(),
        InvoiceStatus::ReviewRequired => style(status.as_str()).yellow(),
        InvoiceStatus::Error => style(status.as_str()).red(),
        _ => style(status.as_str()).dim(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}
