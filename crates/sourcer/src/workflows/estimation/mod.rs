//! Offer estimation: comps, repair budgets, ARV/MAO math and offer bands.

pub mod comps;
pub mod domain;
pub mod engine;
pub mod repairs;
pub mod tables;

pub use comps::{build_comps, CompParseError};
pub use domain::{
    AssignmentStrategy, CompAdjustment, CompRecord, Condition, DealConfig, DealEstimate,
    MarketTrend, NegotiationScript, OfferBand, OfferTier, PropertyInsight, PropertyType,
    RepairLineItem, RiskProfile, SubjectProperty, ValidationError,
};
pub use engine::{EstimationArtifacts, EstimationEngine, EstimationError};
pub use repairs::{build_repair_budget, sum_repair_budget, Trade};
pub use tables::{CompSeed, LookupTables, MarketProfile, TableLoadError, ZipCostProfile};
