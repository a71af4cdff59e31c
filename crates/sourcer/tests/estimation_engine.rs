use std::collections::BTreeMap;

use sourcer::workflows::estimation::{
    AssignmentStrategy, Condition, DealConfig, EstimationEngine, EstimationError, LookupTables,
    MarketProfile, OfferTier, PropertyType, RiskProfile, SubjectProperty, ValidationError,
    ZipCostProfile,
};

fn engine() -> EstimationEngine {
    EstimationEngine::new(LookupTables::bundled().expect("bundled tables load"))
}

fn subject(city: &str, state: &str, postal_code: &str) -> SubjectProperty {
    SubjectProperty {
        address: "123 Demo St".to_string(),
        city: city.to_string(),
        state: state.to_string(),
        postal_code: postal_code.to_string(),
        square_feet: 1850.0,
        beds: 3.0,
        baths: 2.0,
        year_built: Some(1978),
        lot_square_feet: None,
        condition: Condition::LightRehab,
        property_type: PropertyType::SingleFamily,
        listing_url: Some("https://example.com/listing/123".to_string()),
    }
}

fn austin() -> SubjectProperty {
    subject("Austin", "TX", "78704")
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 0.02
}

#[test]
fn austin_scenario_produces_full_packet() {
    let artifacts = engine()
        .estimate(&austin(), None)
        .expect("austin estimate succeeds");
    let estimate = &artifacts.estimate;

    assert_eq!(estimate.offers.len(), 3);
    assert_eq!(estimate.repairs.len(), 8);
    assert_eq!(estimate.comps.len(), 4);
    assert_eq!(estimate.negotiation_scripts.len(), 3);
    assert!(artifacts.text_summary.contains("SOURCER OFFER SUMMARY"));

    let insight = &estimate.insight;
    assert!(close(insight.arv, 525_903.56), "arv {}", insight.arv);
    assert!(close(insight.mao, 227_886.66), "mao {}", insight.mao);
    assert_eq!(insight.demand_score, 1.04);
    // 2% of ARV clears the $10,000 strategy fee
    assert!(close(insight.assignment_fee, 10_518.07), "fee {}", insight.assignment_fee);

    let target = estimate.offer(OfferTier::Target).expect("target band");
    assert_eq!(target.offer_price, insight.mao);
    assert_eq!(
        estimate.citations.get("Market profile").map(String::as_str),
        Some("Sintrix blended MLS + public record heuristics (Austin, TX)")
    );
    assert_eq!(estimate.market_trends[0].source, "Austin Metro Contractor Survey 2024");
    assert!(estimate.negotiation_scripts[0]
        .body
        .starts_with("Given the light rehab condition we are carrying a repair budget north of $10,000."));

    let document = artifacts.document.expect("report rendered by default");
    assert!(document.starts_with(b"%PDF-1.4"));
    assert!(document.ends_with(b"%%EOF"));

    let pdf = String::from_utf8(document).expect("pdf is utf-8");
    assert!(pdf.contains("/Count 2"));
    for closing in [
        "(Disclaimers)",
        "(Citations)",
        "(- ZIP cost: Austin Metro Contractor Survey 2024)",
    ] {
        assert!(pdf.contains(closing), "missing {closing}");
    }
}

#[test]
fn unknown_market_lists_every_known_market() {
    let error = engine()
        .estimate(&subject("Nowhere", "ZZ", "00000"), None)
        .expect_err("unknown market rejected");

    assert!(error.is_market_not_found());
    match &error {
        EstimationError::UnknownMarket {
            market_key,
            known_markets,
        } => {
            assert_eq!(market_key, "Nowhere, ZZ");
            assert_eq!(known_markets, &engine().available_markets());
        }
        other => panic!("expected unknown market, got {other:?}"),
    }
    assert!(error.to_string().contains(
        "Known markets: Atlanta, GA, Austin, TX, Dallas, TX, Houston, TX, Phoenix, AZ"
    ));
}

#[test]
fn identical_inputs_give_identical_insight() {
    let engine = engine();
    let first = engine.estimate(&austin(), None).expect("first estimate");
    let second = engine.estimate(&austin(), None).expect("second estimate");
    assert_eq!(first.estimate.insight, second.estimate.insight);
    assert_eq!(first.text_summary, second.text_summary);
    assert_eq!(first.document, second.document);
}

#[test]
fn value_and_offer_ordering_hold_across_subject_grid() {
    let engine = engine();
    let markets = [
        ("Atlanta", "GA", "30310"),
        ("Austin", "TX", "78704"),
        ("Dallas", "TX", "75208"),
        ("Houston", "TX", "77008"),
        ("Phoenix", "AZ", "85016"),
    ];
    let sizes = [650.0, 1_100.0, 1_850.0, 2_600.0, 4_200.0];
    let rooms = [(1.0, 1.0), (3.0, 2.0), (5.0, 3.5)];

    for (city, state, postal_code) in markets {
        for condition in Condition::ordered() {
            for square_feet in sizes {
                for (beds, baths) in rooms {
                    let mut property = subject(city, state, postal_code);
                    property.condition = condition;
                    property.square_feet = square_feet;
                    property.beds = beds;
                    property.baths = baths;

                    let artifacts = engine
                        .estimate(&property, None)
                        .expect("grid estimate succeeds");
                    let insight = &artifacts.estimate.insight;
                    let offers: Vec<f64> = artifacts
                        .estimate
                        .offers
                        .iter()
                        .map(|band| band.offer_price)
                        .collect();
                    let case = format!("{city} {condition:?} {square_feet} {beds}/{baths}");

                    assert!(insight.arv > 0.0, "{case}");
                    assert!(insight.as_is <= insight.arv, "{case}");
                    assert!(insight.mao <= insight.arv, "{case}");
                    assert!(insight.mao >= 0.0, "{case}");
                    assert!(offers[0] <= offers[1] && offers[1] <= offers[2], "{case}: {offers:?}");
                    assert!(
                        artifacts
                            .estimate
                            .comps
                            .iter()
                            .all(|comp| (1..=4).contains(&comp.adjustments.len())
                                && comp.adjustments.iter().any(|adj| adj.label == "Condition")),
                        "{case}"
                    );
                }
            }
        }
    }
}

#[test]
fn explicit_zero_overrides_are_respected() {
    let engine = engine();
    let baseline = engine.estimate(&austin(), None).expect("baseline");

    let config = DealConfig {
        repair_override: Some(0.0),
        assignment_fee_override: Some(0.0),
        holding_months: Some(0.0),
        closing_cost_rate: Some(0.0),
        include_report: false,
        ..DealConfig::default()
    };
    let overridden = engine
        .estimate(&austin(), Some(&config))
        .expect("overridden estimate");
    let insight = &overridden.estimate.insight;

    assert_eq!(insight.repair_budget, 0.0);
    assert_eq!(insight.assignment_fee, 0.0);
    assert_eq!(insight.holding_costs, 0.0);
    assert_eq!(insight.closing_costs, 0.0);
    assert_eq!(insight.arv, baseline.estimate.insight.arv);
    assert!(close(insight.mao, insight.arv * 0.65));
    assert!(overridden.document.is_none());
    // repair line items are still itemized when the total is overridden
    assert_eq!(overridden.estimate.repairs.len(), 8);
}

#[test]
fn risk_profile_and_strategy_move_mao() {
    let engine = engine();
    let mao_for = |config: DealConfig| {
        engine
            .estimate(&austin(), Some(&config))
            .expect("estimate")
            .estimate
            .insight
            .mao
    };

    let balanced = mao_for(DealConfig::default());
    let aggressive = mao_for(DealConfig {
        risk_profile: RiskProfile::Aggressive,
        ..DealConfig::default()
    });
    let conservative = mao_for(DealConfig {
        risk_profile: RiskProfile::Conservative,
        ..DealConfig::default()
    });
    assert!(aggressive < balanced && balanced < conservative);

    let clamped_high = mao_for(DealConfig {
        strategy: AssignmentStrategy::new(0.95, 10_000.0, 4_500.0, None),
        risk_profile: RiskProfile::Conservative,
        ..DealConfig::default()
    });
    let at_ceiling = mao_for(DealConfig {
        strategy: AssignmentStrategy::new(0.75, 10_000.0, 4_500.0, None),
        ..DealConfig::default()
    });
    assert_eq!(clamped_high, at_ceiling);
}

#[test]
fn fee_ceiling_caps_assignment_fee() {
    let config = DealConfig {
        strategy: AssignmentStrategy::new(0.65, 10_000.0, 4_500.0, Some(8_000.0)),
        ..DealConfig::default()
    };
    let artifacts = engine()
        .estimate(&austin(), Some(&config))
        .expect("estimate");
    assert_eq!(artifacts.estimate.insight.assignment_fee, 8_000.0);
}

#[test]
fn unlisted_postal_code_falls_back_to_market_survey() {
    let artifacts = engine()
        .estimate(&subject("Austin", "TX", "78701"), None)
        .expect("fallback estimate");
    assert_eq!(
        artifacts.estimate.citations.get("ZIP cost").map(String::as_str),
        Some("Austin Metro Contractor Survey 2024")
    );
}

#[test]
fn postal_code_without_any_market_survey_is_not_found() {
    let market: MarketProfile = serde_json::from_value(serde_json::json!({
        "price_per_sqft_turnkey": 150.0,
        "condition_adjustment": {"light_rehab": 0.8},
        "property_type_adjustment": {},
        "renovation_cost_per_sqft": {},
        "closing_cost_rate": 0.03,
        "holding_cost_rate": 0.01,
        "wholesale_fee_rate": 0.02,
        "holding_months": 4.0,
        "demand_index": 1.0
    }))
    .expect("market parses");
    let zip: ZipCostProfile = serde_json::from_value(serde_json::json!({
        "dom_days": 30.0,
        "discount_rate": 0.05,
        "absorption_rate": 0.4,
        "source": "Elsewhere Contractor Survey"
    }))
    .expect("zip parses");

    let engine = EstimationEngine::new(LookupTables::new(
        BTreeMap::from([("Lonely, KS".to_string(), market)]),
        BTreeMap::from([("11111".to_string(), zip)]),
        BTreeMap::new(),
    ));
    let error = engine
        .estimate(&subject("Lonely", "KS", "67000"), None)
        .expect_err("no zip profile");
    assert!(matches!(
        error,
        EstimationError::UnknownPostalCode { ref postal_code } if postal_code == "67000"
    ));
    assert!(error.is_market_not_found());
}

#[test]
fn invalid_subject_is_rejected_before_lookup() {
    let mut property = subject("Nowhere", "ZZ", "00000");
    property.square_feet = -10.0;
    let error = engine()
        .estimate(&property, None)
        .expect_err("negative size rejected");
    assert!(matches!(
        error,
        EstimationError::Validation(ValidationError::NonPositive {
            field: "square_feet",
            ..
        })
    ));
}

#[test]
fn negative_lot_size_cannot_shrink_the_repair_budget() {
    let mut property = subject("Austin", "TX", "78704");
    property.lot_square_feet = Some(-5_000.0);
    let error = engine()
        .estimate(&property, None)
        .expect_err("negative lot rejected");
    assert!(matches!(
        error,
        EstimationError::Validation(ValidationError::NonPositive {
            field: "lot_square_feet",
            ..
        })
    ));
}
