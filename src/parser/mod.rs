pub mod card;
pub mod pdf_url;

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::db::DocumentMeta;

static CARDS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.card").unwrap());

/// Two-pass extraction over one result page: every `div.card` in document
/// order becomes a metadata record, then gets its download URL derived
/// from its own fields. An empty vector means the page has no results,
/// which is how the pagination driver knows to stop.
pub fn collect_cards(page_html: &str, category: &str) -> Vec<DocumentMeta> {
    let doc = Html::parse_document(page_html);
    doc.select(&CARDS)
        .map(|card| {
            let mut meta = card::parse_card(card, category);
            meta.pdf_url = pdf_url::derive_pdf_url(
                &meta.category,
                &meta.date,
                &meta.section,
                &meta.number,
                &meta.doc_type,
            );
            meta
        })
        .collect()
}
