//! Derivation of the canonical `.clean.pdf` download URL for a decision.
//!
//! The portal serves every decision from a predictable attachment URL built
//! out of the card metadata; nothing here touches the network.

/// Chamber label → section code used in the attachment id.
const SECTION_CODES: &[(&str, &str)] = &[
    ("PRIMA", "s10"),
    ("SECONDA", "s20"),
    ("TERZA", "s30"),
    ("QUARTA", "s40"),
    ("QUINTA", "s50"),
    ("SESTA", "s60"),
    ("SETTIMA", "s70"),
    ("UNITE", "su0"),
];

/// Build the download URL for a decision. Best effort by design: malformed
/// input degrades to safe defaults instead of failing, so this always
/// returns a syntactically complete URL.
pub fn derive_pdf_url(
    category: &str,
    date: &str,
    section: &str,
    number: &str,
    doc_type: &str,
) -> String {
    let db = if category.eq_ignore_ascii_case("CIVILE") {
        "snciv"
    } else {
        "snpen"
    };
    let (day, month, year) = split_date(date);
    let sec = section_code(section);
    let t = type_code(doc_type);
    format!(
        "https://www.italgiure.giustizia.it/xway/application/nif/clean/hc.dll\
         ?verbo=attach&db={db}&id=./{year}{month:0>2}{day:0>2}/{db}@{sec}@a{year}@n{number:0>5}@t{t}.clean.pdf"
    )
}

/// Split a DD/MM/YYYY string into its parts. Anything that is not exactly
/// three slash-separated fields falls back to 01/01/1970; the fields
/// themselves are taken verbatim, the portal owns their contents.
fn split_date(raw: &str) -> (&str, &str, &str) {
    let mut parts = raw.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(day), Some(month), Some(year), None) => (day, month, year),
        _ => ("01", "01", "1970"),
    }
}

fn section_code(section: &str) -> &'static str {
    let upper = section.to_uppercase();
    SECTION_CODES
        .iter()
        .find(|(label, _)| *label == upper)
        .map(|(_, code)| *code)
        .unwrap_or("s00")
}

/// INTERLOCUTORIA outranks ORDINANZA when a type mentions both.
fn type_code(doc_type: &str) -> &'static str {
    let upper = doc_type.to_uppercase();
    if upper.contains("INTERLOCUTORIA") {
        "I"
    } else if upper.contains("ORDINANZA") {
        "O"
    } else {
        "S"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civile_sentenza() {
        let url = derive_pdf_url("CIVILE", "05/03/2021", "PRIMA", "7", "SENTENZA");
        assert!(url.contains("db=snciv"));
        assert!(url.contains("id=./20210305/snciv@s10@a2021@n00007@tS.clean.pdf"));
    }

    #[test]
    fn penale_interlocutoria_unknown_section() {
        let url = derive_pdf_url(
            "PENALE",
            "1/1/1970",
            "SCONOSCIUTA",
            "123",
            "ORDINANZA INTERLOCUTORIA",
        );
        assert!(url.contains("db=snpen"));
        assert!(url.contains("id=./19700101/snpen@s00@a1970@n00123@tI.clean.pdf"));
    }

    #[test]
    fn interlocutoria_outranks_ordinanza() {
        let url = derive_pdf_url("PENALE", "05/03/2021", "PRIMA", "1", "ORDINANZA INTERLOCUTORIA");
        assert!(url.contains("@tI.clean.pdf"));
        let url = derive_pdf_url("PENALE", "05/03/2021", "PRIMA", "1", "ORDINANZA");
        assert!(url.contains("@tO.clean.pdf"));
    }

    #[test]
    fn malformed_date_defaults_to_epoch() {
        let url = derive_pdf_url("CIVILE", "05-03-2021", "PRIMA", "7", "SENTENZA");
        assert!(url.contains("id=./19700101/"));
        assert!(url.contains("@a1970@"));

        let url = derive_pdf_url("CIVILE", "05/03/2021/9", "PRIMA", "7", "SENTENZA");
        assert!(url.contains("id=./19700101/"));
    }

    #[test]
    fn date_parts_are_not_validated() {
        // The derivation only splits and pads; nonsense parts pass through.
        let url = derive_pdf_url("CIVILE", "31/02/2021", "PRIMA", "7", "SENTENZA");
        assert!(url.contains("id=./20210231/"));
    }

    #[test]
    fn category_and_section_are_case_insensitive() {
        let url = derive_pdf_url("civile", "05/03/2021", "unite", "7", "sentenza");
        assert!(url.contains("db=snciv"));
        assert!(url.contains("@su0@"));
        assert!(url.contains("@tS.clean.pdf"));
    }

    #[test]
    fn number_padding() {
        let url = derive_pdf_url("CIVILE", "05/03/2021", "PRIMA", "31415", "SENTENZA");
        assert!(url.contains("@n31415@"));
        let url = derive_pdf_url("CIVILE", "05/03/2021", "PRIMA", "123456", "SENTENZA");
        assert!(url.contains("@n123456@"));
    }

    #[test]
    fn sentinel_fields_degrade_safely() {
        // A card with every field missing still derives a well-formed URL.
        let url = derive_pdf_url("N/A", "N/A", "N/A", "N/A", "N/A");
        assert!(url.contains("db=snpen"));
        assert!(url.contains("id=./19700101/snpen@s00@a1970@n00N/A@tS.clean.pdf"));
    }
}
