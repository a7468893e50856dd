use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::db::DocumentMeta;

/// Sentinel stored for card fields whose span is absent entirely.
pub const NOT_AVAILABLE: &str = "N/A";

static DATA_SPANS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[data-arg]").unwrap());

/// Extract one decision's metadata from a `div.card` element. Values are
/// taken verbatim (trimmed); a present-but-empty span stays empty, only a
/// missing span becomes [`NOT_AVAILABLE`]. Never fails.
pub fn parse_card(card: ElementRef<'_>, category: &str) -> DocumentMeta {
    let mut values: HashMap<&str, String> = HashMap::new();
    for span in card.select(&DATA_SPANS) {
        let Some(key) = span.value().attr("data-arg") else {
            continue;
        };
        // First span wins when the portal repeats a data-arg.
        values
            .entry(key)
            .or_insert_with(|| span.text().map(str::trim).collect());
    }

    let mut field = |key: &str| {
        values
            .remove(key)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    DocumentMeta {
        category: category.to_string(),
        id: field("id"),
        section: field("szdec"),
        kind: field("kind"),
        doc_type: field("tipoprov"),
        number: field("numcard"),
        date: field("datdep"),
        ecli: field("ecli"),
        president: field("presidente"),
        relator: field("relatore"),
        pdf_url: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn parse(html: &str, category: &str) -> DocumentMeta {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("div.card").unwrap();
        let card = doc.select(&sel).next().expect("fixture has a card");
        parse_card(card, category)
    }

    const FULL_CARD: &str = r#"
        <div class="card">
          <div class="intesta">
            <span data-arg="szdec">PRIMA</span>
            <span data-arg="tipoprov">SENTENZA</span>
          </div>
          <span data-arg="id"> 34562842 </span>
          <span data-arg="kind">CIVILE</span>
          <span data-arg="numcard">7</span>
          <span data-arg="datdep">05/03/2021</span>
          <span data-arg="ecli">ECLI:IT:CASS:2021:7CIV</span>
          <span data-arg="presidente">ROSSI M.</span>
          <span data-arg="relatore">BIANCHI G.</span>
        </div>"#;

    #[test]
    fn full_card() {
        let meta = parse(FULL_CARD, "CIVILE");
        assert_eq!(meta.category, "CIVILE");
        assert_eq!(meta.id, "34562842");
        assert_eq!(meta.section, "PRIMA");
        assert_eq!(meta.kind, "CIVILE");
        assert_eq!(meta.doc_type, "SENTENZA");
        assert_eq!(meta.number, "7");
        assert_eq!(meta.date, "05/03/2021");
        assert_eq!(meta.ecli, "ECLI:IT:CASS:2021:7CIV");
        assert_eq!(meta.president, "ROSSI M.");
        assert_eq!(meta.relator, "BIANCHI G.");
        assert!(meta.pdf_url.is_empty());
    }

    #[test]
    fn missing_span_gets_sentinel() {
        let html = r#"
            <div class="card">
              <span data-arg="id">123</span>
              <span data-arg="datdep">01/02/2020</span>
            </div>"#;
        let meta = parse(html, "PENALE");
        assert_eq!(meta.id, "123");
        assert_eq!(meta.date, "01/02/2020");
        assert_eq!(meta.ecli, NOT_AVAILABLE);
        assert_eq!(meta.section, NOT_AVAILABLE);
        assert_eq!(meta.president, NOT_AVAILABLE);
    }

    #[test]
    fn empty_span_stays_empty() {
        let html = r#"<div class="card"><span data-arg="ecli"></span></div>"#;
        let meta = parse(html, "CIVILE");
        assert_eq!(meta.ecli, "");
        assert_eq!(meta.id, NOT_AVAILABLE);
    }

    #[test]
    fn nested_markup_text_is_trimmed_and_joined() {
        let html = r#"
            <div class="card">
              <span data-arg="presidente"> ROSSI <b> M. </b></span>
            </div>"#;
        let meta = parse(html, "CIVILE");
        assert_eq!(meta.president, "ROSSIM.");
    }

    #[test]
    fn first_duplicate_span_wins() {
        let html = r#"
            <div class="card">
              <span data-arg="id">first</span>
              <span data-arg="id">second</span>
            </div>"#;
        let meta = parse(html, "CIVILE");
        assert_eq!(meta.id, "first");
    }

    #[test]
    fn category_label_passes_through_verbatim() {
        let meta = parse(FULL_CARD, "penale");
        assert_eq!(meta.category, "penale");
    }
}
