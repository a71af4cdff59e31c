use chrono::NaiveDate;

use super::domain::{CompAdjustment, CompRecord, Condition, SubjectProperty};
use super::tables::CompSeed;

const SIZE_TOLERANCE_SQFT: f64 = 50.0;
const PRICE_PER_SQFT_ADJUSTMENT: f64 = 45.0;
const PRICE_PER_BEDROOM: f64 = 7_500.0;
const PRICE_PER_BATHROOM: f64 = 6_200.0;

#[derive(Debug, thiserror::Error)]
#[error("comp '{address}' has sold date '{value}', expected YYYY-MM-DD")]
pub struct CompParseError {
    pub address: String,
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Share of the comp's sale price moved to account for the subject's condition.
pub const fn condition_adjustment_rate(condition: Condition) -> f64 {
    match condition {
        Condition::Turnkey => 0.02,
        Condition::RentReady => -0.01,
        Condition::LightRehab => -0.04,
        Condition::HeavyRehab => -0.08,
        Condition::TearDown => -0.12,
    }
}

pub fn build_comps(
    subject: &SubjectProperty,
    seeds: &[CompSeed],
) -> Result<Vec<CompRecord>, CompParseError> {
    let condition_rate = condition_adjustment_rate(subject.condition);
    seeds
        .iter()
        .map(|seed| build_comp(subject, seed, condition_rate))
        .collect()
}

fn build_comp(
    subject: &SubjectProperty,
    seed: &CompSeed,
    condition_rate: f64,
) -> Result<CompRecord, CompParseError> {
    let sold_date = parse_sold_date(seed)?;
    let mut adjustments = Vec::with_capacity(4);

    let size_delta = subject.square_feet - seed.square_feet;
    if size_delta.abs() > SIZE_TOLERANCE_SQFT {
        adjustments.push(CompAdjustment {
            label: "Size adjustment".to_string(),
            amount: size_delta * PRICE_PER_SQFT_ADJUSTMENT,
        });
    }

    let bed_delta = subject.beds - seed.beds;
    if bed_delta != 0.0 {
        adjustments.push(CompAdjustment {
            label: "Bedroom count".to_string(),
            amount: bed_delta * PRICE_PER_BEDROOM,
        });
    }

    let bath_delta = subject.baths - seed.baths;
    if bath_delta != 0.0 {
        adjustments.push(CompAdjustment {
            label: "Bathroom count".to_string(),
            amount: bath_delta * PRICE_PER_BATHROOM,
        });
    }

    adjustments.push(CompAdjustment {
        label: "Condition".to_string(),
        amount: seed.sold_price * condition_rate,
    });

    Ok(CompRecord {
        address: seed.address.clone(),
        postal_code: seed.postal_code.clone(),
        sold_price: seed.sold_price,
        sold_date,
        square_feet: seed.square_feet,
        beds: seed.beds,
        baths: seed.baths,
        distance_miles: seed.distance_miles,
        dom: seed.dom,
        adjustments,
    })
}

fn parse_sold_date(seed: &CompSeed) -> Result<NaiveDate, CompParseError> {
    NaiveDate::parse_from_str(seed.sold_date.trim(), "%Y-%m-%d").map_err(|source| {
        CompParseError {
            address: seed.address.clone(),
            value: seed.sold_date.clone(),
            source,
        }
    })
}
