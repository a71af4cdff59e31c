use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::comps::{build_comps, CompParseError};
use super::domain::{
    round_cents, DealConfig, DealEstimate, MarketTrend, NegotiationScript, OfferBand, OfferTier,
    PropertyInsight, SubjectProperty, ValidationError, MAX_MAO_FACTOR, MIN_MAO_FACTOR,
};
use super::repairs::{build_repair_budget, sum_repair_budget};
use super::tables::{LookupTables, MarketProfile, ZipCostProfile};
use crate::workflows::report::{render_document, render_text};

const MARKET_ARV_WEIGHT: f64 = 0.55;
const COMPS_ARV_WEIGHT: f64 = 0.45;
const DEFAULT_CONDITION_FACTOR: f64 = 0.8;

const MIN_NEGOTIATION_BUFFER: f64 = 5_000.0;
const NEGOTIATION_BUFFER_RATE: f64 = 0.05;
const MIN_SAFE_BUMP: f64 = 6_500.0;
const SAFE_BUMP_RATE: f64 = 0.035;
const SAFE_AS_IS_CEILING: f64 = 0.97;

const DISCLAIMER: &str = "These values are modeled using public sales records, MLS trend summaries, and internal heuristics. Always validate with licensed professionals before making binding offers.";

#[derive(Debug, thiserror::Error)]
pub enum EstimationError {
    #[error("No market profile for '{market_key}'. Known markets: {}", .known_markets.join(", "))]
    UnknownMarket {
        market_key: String,
        known_markets: Vec<String>,
    },
    #[error("No ZIP pricing data for {postal_code}. Provide a supported ZIP or update data tables.")]
    UnknownPostalCode { postal_code: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    CompData(#[from] CompParseError),
}

impl EstimationError {
    /// Both lookup misses mean the subject sits outside the supported markets.
    pub fn is_market_not_found(&self) -> bool {
        matches!(
            self,
            EstimationError::UnknownMarket { .. } | EstimationError::UnknownPostalCode { .. }
        )
    }
}

/// Everything one estimation call produces.
#[derive(Debug, Clone)]
pub struct EstimationArtifacts {
    pub estimate: DealEstimate,
    pub text_summary: String,
    /// Rendered PDF bytes when the config asked for a report.
    pub document: Option<Vec<u8>>,
}

/// Generates offer guidance, comps, and collateral for a subject property.
#[derive(Debug, Clone)]
pub struct EstimationEngine {
    tables: LookupTables,
}

impl EstimationEngine {
    pub fn new(tables: LookupTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    /// Known market keys in sorted order.
    pub fn available_markets(&self) -> Vec<String> {
        self.tables.markets.keys().cloned().collect()
    }

    pub fn estimate(
        &self,
        subject: &SubjectProperty,
        config: Option<&DealConfig>,
    ) -> Result<EstimationArtifacts, EstimationError> {
        let default_config = DealConfig::default();
        let config = config.unwrap_or(&default_config);

        subject.validate()?;
        let market = self.resolve_market(subject)?;
        let zip_profile = self.resolve_zip(subject, market)?;
        debug!(
            market = %market.name,
            zip_profile = %zip_profile.postal_code,
            "lookup profiles resolved"
        );

        let seeds = self
            .tables
            .comp_pools
            .get(&subject.market_key())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let comps = build_comps(subject, seeds)?;
        let mut adjusted_prices: Vec<f64> = comps.iter().map(|comp| comp.adjusted_price()).collect();
        if adjusted_prices.is_empty() {
            adjusted_prices.push(subject.square_feet * market.price_per_sqft_turnkey);
        }

        let arv_from_market =
            subject.square_feet * market.price_per_sqft_turnkey * market.demand_index;
        let arv_from_comps = mean(&adjusted_prices);
        let arv = MARKET_ARV_WEIGHT * arv_from_market + COMPS_ARV_WEIGHT * arv_from_comps;

        let condition_factor = market
            .condition_adjustment
            .get(&subject.condition)
            .copied()
            .unwrap_or(DEFAULT_CONDITION_FACTOR);
        let as_is = arv * condition_factor;

        let repairs = build_repair_budget(subject, market, zip_profile);
        let repair_total = config
            .repair_override
            .unwrap_or_else(|| sum_repair_budget(&repairs));

        let closing_rate = config.closing_cost_rate.unwrap_or(market.closing_cost_rate);
        let holding_months = config.holding_months.unwrap_or(market.holding_months);
        let holding_cost = as_is * market.holding_cost_rate * holding_months;
        let closing_cost = arv * closing_rate;

        let assignment_fee = config
            .assignment_fee_override
            .unwrap_or_else(|| assignment_fee(config, market, arv));

        let factor = mao_factor(config);
        let mao = (arv * factor - repair_total - assignment_fee - closing_cost - holding_cost)
            .max(0.0);
        let offers = offer_bands(mao, as_is);

        let target_offer = offers
            .iter()
            .find(|band| band.label == OfferTier::Target.label())
            .map(|band| band.offer_price)
            .unwrap_or(0.0);
        let projected_profit = (arv
            - (target_offer + repair_total + closing_cost + holding_cost + assignment_fee))
            .max(0.0);

        let insight = PropertyInsight {
            arv: round_cents(arv),
            as_is: round_cents(as_is),
            repair_budget: round_cents(repair_total),
            closing_costs: round_cents(closing_cost),
            holding_costs: round_cents(holding_cost),
            assignment_fee: round_cents(assignment_fee),
            mao: round_cents(mao),
            projected_profit: round_cents(projected_profit),
            demand_score: round_cents(market.demand_index),
        };

        info!(
            market = %market.name,
            postal_code = %subject.postal_code,
            arv = insight.arv,
            mao = insight.mao,
            comps = comps.len(),
            "estimate computed"
        );

        let estimate = DealEstimate {
            property: subject.clone(),
            insight,
            offers,
            comps,
            repairs,
            market_trends: vec![market_trend(subject, zip_profile)],
            negotiation_scripts: negotiation_scripts(subject, config),
            disclaimer: DISCLAIMER.to_string(),
            citations: citations(market, zip_profile),
        };

        let document = config.include_report.then(|| render_document(&estimate));
        let text_summary = render_text(&estimate);

        Ok(EstimationArtifacts {
            estimate,
            text_summary,
            document,
        })
    }

    fn resolve_market(&self, subject: &SubjectProperty) -> Result<&MarketProfile, EstimationError> {
        let market_key = subject.market_key();
        self.tables
            .markets
            .get(&market_key)
            .ok_or_else(|| EstimationError::UnknownMarket {
                market_key,
                known_markets: self.available_markets(),
            })
    }

    /// Exact postal code first, then the first profile (in postal-code order)
    /// whose `source` starts with the market name before its comma.
    fn resolve_zip(
        &self,
        subject: &SubjectProperty,
        market: &MarketProfile,
    ) -> Result<&ZipCostProfile, EstimationError> {
        if let Some(profile) = self.tables.zip_costs.get(&subject.postal_code) {
            return Ok(profile);
        }

        let prefix = market.name_prefix();
        let fallback = self
            .tables
            .zip_costs
            .values()
            .find(|candidate| candidate.source.starts_with(prefix));

        match fallback {
            Some(profile) => {
                warn!(
                    postal_code = %subject.postal_code,
                    fallback = %profile.postal_code,
                    "no ZIP cost profile for subject; using market fallback"
                );
                Ok(profile)
            }
            None => Err(EstimationError::UnknownPostalCode {
                postal_code: subject.postal_code.clone(),
            }),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn assignment_fee(config: &DealConfig, market: &MarketProfile, arv: f64) -> f64 {
    let strategy = &config.strategy;
    let fee = strategy.assignment_fee.max(arv * market.wholesale_fee_rate);
    let ceiling = strategy.fee_ceiling.unwrap_or(f64::INFINITY);
    fee.min(ceiling).max(strategy.fee_floor)
}

fn mao_factor(config: &DealConfig) -> f64 {
    (config.strategy.factor() + config.risk_profile.factor_adjustment())
        .clamp(MIN_MAO_FACTOR, MAX_MAO_FACTOR)
}

pub(crate) fn offer_bands(mao: f64, as_is: f64) -> Vec<OfferBand> {
    let buffer = MIN_NEGOTIATION_BUFFER.max(mao * NEGOTIATION_BUFFER_RATE);
    let safe_bump = MIN_SAFE_BUMP.max(mao * SAFE_BUMP_RATE);

    debug!(mao, buffer, safe_bump, "deriving offer bands");

    OfferTier::ordered()
        .into_iter()
        .map(|tier| {
            let price = match tier {
                OfferTier::Aggressive => (mao - buffer).max(0.0),
                OfferTier::Target => mao.max(0.0),
                OfferTier::Safe => (as_is * SAFE_AS_IS_CEILING).min(mao + safe_bump),
            };
            OfferBand {
                label: tier.label().to_string(),
                offer_price: round_cents(price),
                mao: round_cents(mao),
                rationale: tier.rationale().to_string(),
            }
        })
        .collect()
}

fn market_trend(subject: &SubjectProperty, zip_profile: &ZipCostProfile) -> MarketTrend {
    MarketTrend {
        postal_code: subject.postal_code.clone(),
        median_dom: zip_profile.dom_days,
        average_discount: zip_profile.discount_rate,
        absorption_rate: zip_profile.absorption_rate,
        source: zip_profile.source.clone(),
    }
}

fn negotiation_scripts(subject: &SubjectProperty, config: &DealConfig) -> Vec<NegotiationScript> {
    vec![
        NegotiationScript {
            title: "Condition & Carry Costs".to_string(),
            body: format!(
                "Given the {} condition we are carrying a repair budget north of ${}. Our target number keeps us safe on holding costs while guaranteeing closing.",
                subject.condition.phrase(),
                crate::workflows::report::format_whole_dollars(config.strategy.assignment_fee),
            ),
        },
        NegotiationScript {
            title: "Speed-to-close".to_string(),
            body: "We can close in 14 days with hard earnest money. If we can land closer to the target band we'll handle all title and inspection logistics.".to_string(),
        },
        NegotiationScript {
            title: "Walk-away framing".to_string(),
            body: "If a higher number is a must, we can explore our safe band but it trims our spread considerably. We'd need flexibility on access or closing timeline to justify it.".to_string(),
        },
    ]
}

fn citations(market: &MarketProfile, zip_profile: &ZipCostProfile) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "Market profile".to_string(),
            format!(
                "Sintrix blended MLS + public record heuristics ({})",
                market.name
            ),
        ),
        ("ZIP cost".to_string(), zip_profile.source.clone()),
    ])
}
