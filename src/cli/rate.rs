use super::ui;
use crate::core::{Address, CalculateTaxRequest, CalculateTaxResult, TaxService};
use anyhow::{Result, bail};
use comfy_table::Cell;
use futures::future::join_all;
use rust_decimal::Decimal;

/// Parses an order amount, rejecting negative values.
pub fn parse_price(value: &str) -> Result<Decimal, String> {
    let price: Decimal = value
        .trim()
        .parse()
        .map_err(|e| format!("Invalid price '{value}': {e}"))?;
    if price < Decimal::ZERO {
        return Err(format!("Price must not be negative, got {price}"));
    }
    Ok(price)
}

/// Resolves all destinations concurrently through the shared cache.
pub async fn run(service: &TaxService, addresses: &[Address], price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        bail!("Price must not be negative, got {}", price);
    }

    let pb = ui::new_progress_bar(addresses.len() as u64, true);
    pb.set_message("Resolving tax rates...");

    let lookups = addresses.iter().map(|address| {
        let pb = pb.clone();
        async move {
            let request = CalculateTaxRequest {
                address: Some(address.clone()),
                price,
            };
            let result = service.compute_tax_rate(&request).await;
            pb.inc(1);
            (address.clone(), result)
        }
    });
    let results = join_all(lookups).await;
    pb.finish_and_clear();

    println!("{}", results_table(&results));

    let failed = results.iter().filter(|(_, r)| !r.success()).count();
    if failed > 0 {
        bail!("{} of {} tax rate lookups failed", failed, results.len());
    }
    Ok(())
}

pub fn results_table(results: &[(Address, CalculateTaxResult)]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Country"),
        ui::header_cell("State"),
        ui::header_cell("City"),
        ui::header_cell("Zip"),
        ui::header_cell("Rate"),
        ui::header_cell("Error"),
    ]);

    for (address, result) in results {
        let rate = if result.success() {
            ui::percent_cell(result.tax_rate)
        } else {
            ui::na_cell(true)
        };
        table.add_row(vec![
            ui::text_cell(&address.country_code),
            ui::text_cell(&address.state_code),
            ui::text_cell(&address.city),
            ui::text_cell(&address.zip),
            rate,
            Cell::new(result.errors.join("; ")),
        ]);
    }

    table.to_string()
}
