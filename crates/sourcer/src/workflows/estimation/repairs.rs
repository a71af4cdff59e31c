use serde::{Deserialize, Serialize};

use super::domain::{round_cents, Condition, RepairLineItem, SubjectProperty};
use super::tables::{MarketProfile, ZipCostProfile};

const LANDSCAPING_LOT_SIZE: f64 = 500.0;
const DEFAULT_LOT_TO_HOUSE_RATIO: f64 = 1.2;
const DEFAULT_LIGHT_REHAB_RATE: f64 = 18.0;
const CONTINGENCY_RENOVATION_SHARE: f64 = 0.1;

/// Repair trades in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trade {
    Roofing,
    Hvac,
    Plumbing,
    Electrical,
    Interior,
    Exterior,
    Landscaping,
    Contingency,
}

impl Trade {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Roofing,
            Self::Hvac,
            Self::Plumbing,
            Self::Electrical,
            Self::Interior,
            Self::Exterior,
            Self::Landscaping,
            Self::Contingency,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Roofing => "Roofing & Structure",
            Self::Hvac => "HVAC",
            Self::Plumbing => "Plumbing",
            Self::Electrical => "Electrical",
            Self::Interior => "Interior Finish",
            Self::Exterior => "Exterior & Windows",
            Self::Landscaping => "Landscaping",
            Self::Contingency => "Contingency",
        }
    }
}

/// Scales every trade's base cost by how much work the condition implies.
pub const fn condition_multiplier(condition: Condition) -> f64 {
    match condition {
        Condition::Turnkey => 0.25,
        Condition::RentReady => 0.45,
        Condition::LightRehab => 0.85,
        Condition::HeavyRehab => 1.25,
        Condition::TearDown => 1.75,
    }
}

fn quantity(subject: &SubjectProperty, trade: Trade) -> (f64, &'static str) {
    match trade {
        Trade::Landscaping => {
            let lot = subject
                .lot_square_feet
                .unwrap_or(subject.square_feet * DEFAULT_LOT_TO_HOUSE_RATIO);
            (lot / LANDSCAPING_LOT_SIZE, "500 sq ft lots")
        }
        _ => (subject.square_feet, "sq ft"),
    }
}

pub fn build_repair_budget(
    subject: &SubjectProperty,
    market: &MarketProfile,
    zip_profile: &ZipCostProfile,
) -> Vec<RepairLineItem> {
    let multiplier = condition_multiplier(subject.condition);

    Trade::ordered()
        .into_iter()
        .map(|trade| {
            let (quantity, unit) = quantity(subject, trade);
            let labor = zip_profile.labor_rates.get(&trade).copied().unwrap_or(0.0);
            let material = zip_profile
                .material_rates
                .get(&trade)
                .copied()
                .unwrap_or(0.0);
            let mut base_cost = (labor + material) * quantity;

            if trade == Trade::Contingency {
                let light_rehab_rate = market
                    .renovation_cost_per_sqft
                    .get(&Condition::LightRehab)
                    .copied()
                    .unwrap_or(DEFAULT_LIGHT_REHAB_RATE);
                base_cost += light_rehab_rate * CONTINGENCY_RENOVATION_SHARE;
            }

            RepairLineItem {
                trade: trade.label().to_string(),
                description: format!(
                    "{} scope tuned for {}",
                    trade.label(),
                    subject.condition.phrase()
                ),
                quantity: round_cents(quantity),
                unit: unit.to_string(),
                labor_rate: round_cents(labor),
                material_rate: round_cents(material),
                cost: round_cents(base_cost * multiplier),
            }
        })
        .collect()
}

pub fn sum_repair_budget(items: &[RepairLineItem]) -> f64 {
    items.iter().map(|item| item.cost).sum()
}
