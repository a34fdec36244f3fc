use super::ui;
use crate::core::rate::rate_to_percent;
use crate::core::{Address, RateBreakdown, RateResult, TaxService};
use anyhow::{Result, bail};
use comfy_table::Cell;

pub async fn run(service: &TaxService, address: &Address) -> Result<()> {
    let pb = ui::new_progress_bar(1, true);
    pb.set_message("Testing tax calculation...");
    let result = service.test_tax_rate(address).await;
    pb.finish_and_clear();

    let result = result?;
    if let Some(message) = result.error_message() {
        println!("{}", ui::style_text(&message, ui::StyleType::Error));
        bail!("Test tax calculation failed: {}", message);
    }

    println!("{}", render(address, &result));
    Ok(())
}

/// Method, effective rate, and the provider breakdown when there is one.
pub fn render(address: &Address, result: &RateResult) -> String {
    let mut output = format!(
        "Tax rate for {}\n\n",
        ui::style_text(
            &[&address.zip, &address.city, &address.country_code]
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            ui::StyleType::Title
        )
    );

    let method = if result.breakdown.is_some() {
        "Standard (location-based)"
    } else {
        "Extended (order-based)"
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("Method"), Cell::new(method)]);
    let rate_cell = match rate_to_percent(result.rate_fraction()) {
        Some(percent) => ui::percent_cell(percent),
        None => ui::na_cell(true),
    };
    table.add_row(vec![Cell::new("Rate"), rate_cell]);

    match &result.breakdown {
        Some(RateBreakdown::UsCanada {
            zip,
            country,
            country_rate,
            state,
            state_rate,
            county,
            county_rate,
            city,
            city_rate,
            combined_district_rate,
            combined_rate,
        }) => {
            table.add_row(vec![Cell::new("Zip"), ui::text_cell(zip)]);
            table.add_row(vec![Cell::new(format!("Country ({country})")), ui::rate_cell(*country_rate)]);
            table.add_row(vec![Cell::new(format!("State ({state})")), ui::rate_cell(*state_rate)]);
            table.add_row(vec![Cell::new(format!("County ({county})")), ui::rate_cell(*county_rate)]);
            table.add_row(vec![Cell::new(format!("City ({city})")), ui::rate_cell(*city_rate)]);
            table.add_row(vec![Cell::new("Districts"), ui::rate_cell(*combined_district_rate)]);
            table.add_row(vec![Cell::new("Combined"), ui::rate_cell(*combined_rate)]);
        }
        Some(RateBreakdown::International {
            country,
            name,
            standard_rate,
            reduced_rate,
            super_reduced_rate,
            parking_rate,
        }) => {
            table.add_row(vec![Cell::new("Country"), Cell::new(format!("{name} ({country})"))]);
            table.add_row(vec![Cell::new("Standard"), ui::rate_cell(*standard_rate)]);
            table.add_row(vec![Cell::new("Reduced"), ui::rate_cell(*reduced_rate)]);
            table.add_row(vec![Cell::new("Super reduced"), ui::rate_cell(*super_reduced_rate)]);
            table.add_row(vec![Cell::new("Parking"), ui::rate_cell(*parking_rate)]);
        }
        None => {}
    }

    output.push_str(&table.to_string());
    output
}
