use super::format::{dollars, wrap_words};
use crate::workflows::estimation::{DealEstimate, OfferTier};

pub const DOCUMENT_HEADER: &str = "SOURCER DEAL SNAPSHOT";

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const LEFT_MARGIN: u32 = 60;
const FIRST_BASELINE: i32 = 720;
const BOTTOM_MARGIN: i32 = 72;
const LEADING: i32 = 14;
const FONT_SIZE: u32 = 11;
const WRAP_WIDTH: usize = 90;

/// PDF snapshot of the estimate, continuing onto further pages past the bottom margin.
pub fn render_document(estimate: &DealEstimate) -> Vec<u8> {
    build_pdf(&snapshot_lines(estimate)).into_bytes()
}

fn snapshot_lines(estimate: &DealEstimate) -> Vec<String> {
    let property = &estimate.property;
    let insight = &estimate.insight;
    let recommended = estimate
        .offer(OfferTier::Target)
        .map(|band| band.offer_price)
        .unwrap_or(insight.mao);

    let mut lines = vec![
        DOCUMENT_HEADER.to_string(),
        String::new(),
        format!(
            "Address: {}, {} {}",
            property.address, property.city, property.postal_code
        ),
        format!("Condition: {}", property.condition.label()),
        String::new(),
        format!("ARV: {}", dollars(insight.arv)),
        format!("MAO: {}", dollars(insight.mao)),
        format!("Recommended Offer: {}", dollars(recommended)),
        format!("Projected Profit: {}", dollars(insight.projected_profit)),
        String::new(),
        "Repair Budget".to_string(),
    ];

    for item in &estimate.repairs {
        lines.push(format!(
            "- {}: {} ({:.2} {} @ L{:.2}/M{:.2})",
            item.trade,
            dollars(item.cost),
            item.quantity,
            item.unit,
            item.labor_rate,
            item.material_rate
        ));
    }

    lines.push(String::new());
    lines.push("Offer Bands".to_string());
    for offer in &estimate.offers {
        lines.push(format!(
            "- {}: {} | {}",
            offer.label,
            dollars(offer.offer_price),
            offer.rationale
        ));
    }

    lines.push(String::new());
    lines.push("Comps".to_string());
    for comp in &estimate.comps {
        lines.push(format!(
            "- {} ({:.0} sf) sold {} for {} | adj {}",
            comp.address,
            comp.square_feet,
            comp.sold_date.format("%b %Y"),
            dollars(comp.sold_price),
            dollars(comp.adjusted_price())
        ));
    }

    lines.push(String::new());
    lines.push("Market Trends".to_string());
    for trend in &estimate.market_trends {
        lines.push(format!(
            "- ZIP {}: {} DOM | discount {:.1}% | absorption {:.2}",
            trend.postal_code,
            trend.median_dom,
            trend.average_discount * 100.0,
            trend.absorption_rate
        ));
    }

    lines.push(String::new());
    lines.push("Negotiation Notes".to_string());
    for script in &estimate.negotiation_scripts {
        lines.push(format!("* {}", script.title));
        lines.extend(wrap_words(&script.body, WRAP_WIDTH));
        lines.push(String::new());
    }

    lines.push("Disclaimers".to_string());
    lines.extend(wrap_words(&estimate.disclaimer, WRAP_WIDTH));
    lines.push(String::new());

    lines.push("Citations".to_string());
    for (key, value) in &estimate.citations {
        lines.push(format!("- {key}: {value}"));
    }

    lines
}

/// PDF string literals cannot hold unbalanced parentheses; brackets read the same.
fn sanitize(line: &str) -> String {
    line.replace('\\', "\\\\")
        .replace('(', "[")
        .replace(')', "]")
}

/// Splits lines into pages of baselines 720 down to the bottom margin.
fn paginate(lines: &[String]) -> Vec<&[String]> {
    let per_page = ((FIRST_BASELINE - BOTTOM_MARGIN) / LEADING + 1) as usize;
    if lines.is_empty() {
        return vec![lines];
    }
    lines.chunks(per_page).collect()
}

fn content_stream(lines: &[String]) -> String {
    let mut stream = vec![format!("BT /F1 {FONT_SIZE} Tf")];
    let baselines = (0..).map(|index| FIRST_BASELINE - index * LEADING);
    for (line, y) in lines.iter().zip(baselines) {
        stream.push(format!(
            "1 0 0 1 {LEFT_MARGIN} {y} Tm ({}) Tj",
            sanitize(line)
        ));
    }
    stream.push("ET".to_string());
    stream.join("\n")
}

// Object layout: 1 catalog, 2 page tree, 3 font, then a page and its content stream per page.
fn build_pdf(lines: &[String]) -> String {
    let pages = paginate(lines);
    let page_ids: Vec<usize> = (0..pages.len()).map(|index| 4 + index * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (page, page_id) in pages.iter().zip(&page_ids) {
        let stream = content_stream(page);
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj {body} endobj\n", index + 1));
    }

    let xref_start = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{xref_start}\n%%EOF",
        objects.len() + 1
    ));
    pdf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("line {index}")).collect()
    }

    #[test]
    fn pdf_has_header_trailer_and_font() {
        let pdf = build_pdf(&[DOCUMENT_HEADER.to_string()]);
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF"));
        assert!(pdf.contains("/BaseFont /Helvetica"));
        assert!(pdf.contains("/MediaBox [0 0 612 792]"));
        assert!(pdf.contains("BT /F1 11 Tf\n1 0 0 1 60 720 Tm (SOURCER DEAL SNAPSHOT) Tj\nET"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let pdf = build_pdf(&lines(60));
        let xref_start: usize = pdf
            .lines()
            .skip_while(|line| *line != "startxref")
            .nth(1)
            .and_then(|value| value.parse().ok())
            .expect("startxref value");
        // catalog, page tree, font, then two pages with their streams
        assert!(pdf[xref_start..].starts_with("xref\n0 8\n"));

        let offsets: Vec<usize> = pdf[xref_start..]
            .lines()
            .skip(3)
            .take(7)
            .map(|entry| entry[..10].parse().expect("offset"))
            .collect();
        for (index, offset) in offsets.into_iter().enumerate() {
            assert!(pdf[offset..].starts_with(&format!("{} 0 obj", index + 1)));
        }
    }

    #[test]
    fn stream_length_matches_content() {
        let stream = content_stream(&lines(2));
        let pdf = build_pdf(&lines(2));
        assert!(pdf.contains(&format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len())));
    }

    #[test]
    fn overflow_continues_on_a_new_page() {
        let pdf = build_pdf(&lines(80));
        // baselines 720 down to 76 hold 47 lines
        assert!(pdf.contains("/Kids [4 0 R 6 0 R] /Count 2"));
        assert!(pdf.contains("1 0 0 1 60 76 Tm (line 46) Tj"));
        assert!(pdf.contains("1 0 0 1 60 720 Tm (line 47) Tj"));
        assert!(pdf.contains("(line 79) Tj"));
        assert_eq!(pdf.matches(" Tj").count(), 80);
        assert_eq!(pdf.matches("/Type /Page ").count(), 2);
    }

    #[test]
    fn exact_page_fits_without_a_second_page() {
        let pdf = build_pdf(&lines(47));
        assert!(pdf.contains("/Kids [4 0 R] /Count 1"));
    }

    #[test]
    fn parentheses_become_brackets() {
        let stream = content_stream(&["- Roofing: $1 (1850 sq ft)".to_string()]);
        assert!(stream.contains("(- Roofing: $1 [1850 sq ft]) Tj"));
    }

    #[test]
    fn repair_lines_use_two_decimals() {
        use crate::workflows::estimation::{EstimationEngine, LookupTables, SubjectProperty};

        let engine = EstimationEngine::new(LookupTables::bundled().expect("bundled tables"));
        let subject = SubjectProperty {
            address: "123 Demo St".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            postal_code: "78704".to_string(),
            square_feet: 1850.0,
            beds: 3.0,
            baths: 2.0,
            year_built: None,
            lot_square_feet: None,
            condition: Default::default(),
            property_type: Default::default(),
            listing_url: None,
        };
        let estimate = engine.estimate(&subject, None).expect("austin estimate").estimate;
        let lines = snapshot_lines(&estimate);
        assert!(lines
            .iter()
            .any(|line| line.ends_with("(1850.00 sq ft @ L4.50/M3.80)")));
        assert!(lines
            .iter()
            .any(|line| line.ends_with("(4.44 500 sq ft lots @ L95.00/M60.00)")));
    }
}
