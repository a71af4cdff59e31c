use super::format::dollars;
use crate::workflows::estimation::DealEstimate;

pub const TEXT_HEADER: &str = "=== SOURCER OFFER SUMMARY ===";

/// Plain-text offer summary for terminals and API responses.
pub fn render_text(estimate: &DealEstimate) -> String {
    let property = &estimate.property;
    let insight = &estimate.insight;

    let mut lines = vec![
        TEXT_HEADER.to_string(),
        format!(
            "Property: {}, {}, {} {}",
            property.address, property.city, property.state, property.postal_code
        ),
        format!("Condition: {}", property.condition.key()),
        format!(
            "ARV {} | As-Is {} | MAO {}",
            dollars(insight.arv),
            dollars(insight.as_is),
            dollars(insight.mao)
        ),
        format!("Projected Profit: {}", dollars(insight.projected_profit)),
        String::new(),
        "Repair Budget:".to_string(),
    ];

    lines.extend(estimate.repairs.iter().map(|item| {
        format!(
            "  - {}: {} ({:.2} {}, labor {:.2}/material {:.2})",
            item.trade,
            dollars(item.cost),
            item.quantity,
            item.unit,
            item.labor_rate,
            item.material_rate
        )
    }));

    lines.push(String::new());
    lines.push("Offer Bands:".to_string());
    lines.extend(estimate.offers.iter().map(|offer| {
        format!(
            "  - {}: {} | {}",
            offer.label,
            dollars(offer.offer_price),
            offer.rationale
        )
    }));

    lines.push(String::new());
    lines.push("Comps:".to_string());
    lines.extend(estimate.comps.iter().map(|comp| {
        format!(
            "  - {} ({:.0} sf) sold {} for {}, adj {}",
            comp.address,
            comp.square_feet,
            comp.sold_date.format("%Y-%m-%d"),
            dollars(comp.sold_price),
            dollars(comp.adjusted_price())
        )
    }));

    lines.push(String::new());
    lines.push("Market Trends:".to_string());
    lines.extend(estimate.market_trends.iter().map(|trend| {
        format!(
            "  - ZIP {}: {} DOM, avg discount {:.1}%, absorption {:.2} (source: {})",
            trend.postal_code,
            trend.median_dom,
            trend.average_discount * 100.0,
            trend.absorption_rate,
            trend.source
        )
    }));

    lines.push(String::new());
    lines.push("Negotiation Scripts:".to_string());
    lines.extend(
        estimate
            .negotiation_scripts
            .iter()
            .map(|script| format!("  * {}: {}", script.title, script.body)),
    );

    lines.push(String::new());
    lines.push("Disclaimer:".to_string());
    lines.push(format!("  {}", estimate.disclaimer));

    lines.push(String::new());
    lines.push("Citations:".to_string());
    lines.extend(
        estimate
            .citations
            .iter()
            .map(|(key, value)| format!("  - {key}: {value}")),
    );

    lines.join("\n")
}
