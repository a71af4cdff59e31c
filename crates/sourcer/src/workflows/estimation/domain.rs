use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MIN_MAO_FACTOR: f64 = 0.55;
pub const MAX_MAO_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Turnkey,
    RentReady,
    #[default]
    LightRehab,
    HeavyRehab,
    TearDown,
}

impl Condition {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Turnkey,
            Self::RentReady,
            Self::LightRehab,
            Self::HeavyRehab,
            Self::TearDown,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Turnkey => "turnkey",
            Self::RentReady => "rent_ready",
            Self::LightRehab => "light_rehab",
            Self::HeavyRehab => "heavy_rehab",
            Self::TearDown => "tear_down",
        }
    }

    /// Lower-case phrase used in scripts and repair descriptions.
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::Turnkey => "turnkey",
            Self::RentReady => "rent ready",
            Self::LightRehab => "light rehab",
            Self::HeavyRehab => "heavy rehab",
            Self::TearDown => "tear down",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Turnkey => "Turnkey",
            Self::RentReady => "Rent Ready",
            Self::LightRehab => "Light Rehab",
            Self::HeavyRehab => "Heavy Rehab",
            Self::TearDown => "Tear Down",
        }
    }
}

impl FromStr for Condition {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|condition| condition.key() == normalized)
            .ok_or_else(|| ValidationError::UnknownCondition(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    SingleFamily,
    MultiFamily,
    Condo,
    Townhome,
}

impl PropertyType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::SingleFamily,
            Self::MultiFamily,
            Self::Condo,
            Self::Townhome,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::SingleFamily => "single_family",
            Self::MultiFamily => "multi_family",
            Self::Condo => "condo",
            Self::Townhome => "townhome",
        }
    }
}

impl FromStr for PropertyType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.key() == normalized)
            .ok_or_else(|| ValidationError::UnknownPropertyType(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Aggressive,
    #[default]
    Balanced,
    Conservative,
}

impl RiskProfile {
    /// Shift applied to the MAO factor before clamping.
    pub const fn factor_adjustment(self) -> f64 {
        match self {
            Self::Aggressive => -0.03,
            Self::Balanced => 0.0,
            Self::Conservative => 0.03,
        }
    }
}

impl FromStr for RiskProfile {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Ok(Self::Aggressive),
            "balanced" => Ok(Self::Balanced),
            "conservative" => Ok(Self::Conservative),
            _ => Err(ValidationError::UnknownRiskProfile(value.to_string())),
        }
    }
}

/// Normalized description of the property being underwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProperty {
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub square_feet: f64,
    pub beds: f64,
    pub baths: f64,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub lot_square_feet: Option<f64>,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub listing_url: Option<String>,
}

impl SubjectProperty {
    /// Lookup key into the market table, e.g. `"Austin, TX"`.
    pub fn market_key(&self) -> String {
        let key = format!("{}, {}", self.city.trim(), self.state.trim());
        key.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.square_feet.is_finite() && self.square_feet > 0.0) {
            return Err(ValidationError::NonPositive {
                field: "square_feet",
                value: self.square_feet,
            });
        }
        if !(self.beds.is_finite() && self.beds > 0.0) {
            return Err(ValidationError::NonPositive {
                field: "beds",
                value: self.beds,
            });
        }
        if !(self.baths.is_finite() && self.baths > 0.0) {
            return Err(ValidationError::NonPositive {
                field: "baths",
                value: self.baths,
            });
        }
        if let Some(lot) = self.lot_square_feet {
            if !(lot.is_finite() && lot > 0.0) {
                return Err(ValidationError::NonPositive {
                    field: "lot_square_feet",
                    value: lot,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("condition must be one of: turnkey, rent_ready, light_rehab, heavy_rehab, tear_down (got '{0}')")]
    UnknownCondition(String),
    #[error("property type must be one of: single_family, multi_family, condo, townhome (got '{0}')")]
    UnknownPropertyType(String),
    #[error("risk profile must be one of: aggressive, balanced, conservative (got '{0}')")]
    UnknownRiskProfile(String),
}

/// Assignment fee targets and the MAO factor.
///
/// The factor is clamped to `[0.55, 0.75]` whenever a strategy is built,
/// including through deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AssignmentStrategyInput")]
pub struct AssignmentStrategy {
    factor: f64,
    pub assignment_fee: f64,
    pub fee_floor: f64,
    pub fee_ceiling: Option<f64>,
}

impl AssignmentStrategy {
    pub fn new(factor: f64, assignment_fee: f64, fee_floor: f64, fee_ceiling: Option<f64>) -> Self {
        Self {
            factor: factor.clamp(MIN_MAO_FACTOR, MAX_MAO_FACTOR),
            assignment_fee,
            fee_floor,
            fee_ceiling,
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for AssignmentStrategy {
    fn default() -> Self {
        Self::new(0.65, 10_000.0, 4_500.0, None)
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct AssignmentStrategyInput {
    factor: f64,
    assignment_fee: f64,
    fee_floor: f64,
    fee_ceiling: Option<f64>,
}

impl Default for AssignmentStrategyInput {
    fn default() -> Self {
        let strategy = AssignmentStrategy::default();
        Self {
            factor: strategy.factor,
            assignment_fee: strategy.assignment_fee,
            fee_floor: strategy.fee_floor,
            fee_ceiling: strategy.fee_ceiling,
        }
    }
}

impl From<AssignmentStrategyInput> for AssignmentStrategy {
    fn from(input: AssignmentStrategyInput) -> Self {
        Self::new(
            input.factor,
            input.assignment_fee,
            input.fee_floor,
            input.fee_ceiling,
        )
    }
}

/// User-tunable knobs. Every `Option` falls back to the computed value or the
/// market profile default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealConfig {
    pub strategy: AssignmentStrategy,
    pub risk_profile: RiskProfile,
    pub repair_override: Option<f64>,
    pub closing_cost_rate: Option<f64>,
    pub holding_months: Option<f64>,
    pub assignment_fee_override: Option<f64>,
    pub include_report: bool,
}

impl Default for DealConfig {
    fn default() -> Self {
        Self {
            strategy: AssignmentStrategy::default(),
            risk_profile: RiskProfile::default(),
            repair_override: None,
            closing_cost_rate: None,
            holding_months: None,
            assignment_fee_override: None,
            include_report: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompAdjustment {
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompRecord {
    pub address: String,
    pub postal_code: String,
    pub sold_price: f64,
    pub sold_date: NaiveDate,
    pub square_feet: f64,
    pub beds: f64,
    pub baths: f64,
    pub distance_miles: f64,
    pub dom: u32,
    pub adjustments: Vec<CompAdjustment>,
}

impl CompRecord {
    pub fn adjusted_price(&self) -> f64 {
        self.sold_price
            + self
                .adjustments
                .iter()
                .map(|adjustment| adjustment.amount)
                .sum::<f64>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairLineItem {
    pub trade: String,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub labor_rate: f64,
    pub material_rate: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferTier {
    Aggressive,
    Target,
    Safe,
}

impl OfferTier {
    pub const fn ordered() -> [Self; 3] {
        [Self::Aggressive, Self::Target, Self::Safe]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Aggressive => "Aggressive",
            Self::Target => "Target",
            Self::Safe => "Safe",
        }
    }

    pub const fn rationale(self) -> &'static str {
        match self {
            Self::Aggressive => "Anchors negotiations low",
            Self::Target => "Protects assignment spread",
            Self::Safe => "Preserves rapport while staying under as-is",
        }
    }
}

impl fmt::Display for OfferTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferBand {
    pub label: String,
    pub offer_price: f64,
    pub mao: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTrend {
    pub postal_code: String,
    pub median_dom: f64,
    pub average_discount: f64,
    pub absorption_rate: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationScript {
    pub title: String,
    pub body: String,
}

/// Headline figures, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInsight {
    pub arv: f64,
    pub as_is: f64,
    pub repair_budget: f64,
    pub closing_costs: f64,
    pub holding_costs: f64,
    pub assignment_fee: f64,
    pub mao: f64,
    pub projected_profit: f64,
    pub demand_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealEstimate {
    pub property: SubjectProperty,
    pub insight: PropertyInsight,
    pub offers: Vec<OfferBand>,
    pub comps: Vec<CompRecord>,
    pub repairs: Vec<RepairLineItem>,
    pub market_trends: Vec<MarketTrend>,
    pub negotiation_scripts: Vec<NegotiationScript>,
    pub disclaimer: String,
    pub citations: BTreeMap<String, String>,
}

impl DealEstimate {
    pub fn offer(&self, tier: OfferTier) -> Option<&OfferBand> {
        self.offers.iter().find(|band| band.label == tier.label())
    }
}

/// Rounds a monetary value to cents.
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
