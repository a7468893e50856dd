use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id        TEXT PRIMARY KEY,
            category  TEXT,
            section   TEXT,
            kind      TEXT,
            type      TEXT,
            number    TEXT,
            date      TEXT,
            ecli      TEXT,
            president TEXT,
            relator   TEXT,
            pdf_path  TEXT
        );
        ",
    )?;
    Ok(())
}

/// Metadata scraped from one result card. `pdf_url` is derived by the page
/// collector and never stored; the download path is persisted separately
/// once the PDF is on disk.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub category: String,
    pub id: String,
    pub section: String,
    pub kind: String,
    pub doc_type: String,
    pub number: String,
    pub date: String,
    pub ecli: String,
    pub president: String,
    pub relator: String,
    pub pdf_url: String,
}

/// A full row read back from the `documents` table.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRow {
    pub id: String,
    pub category: String,
    pub section: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub number: String,
    pub date: String,
    pub ecli: String,
    pub president: String,
    pub relator: String,
    pub pdf_path: String,
}

pub fn save_document(conn: &Connection, doc: &DocumentMeta, pdf_path: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO documents
         (id, category, section, kind, type, number, date, ecli, president, relator, pdf_path)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            doc.id,
            doc.category,
            doc.section,
            doc.kind,
            doc.doc_type,
            doc.number,
            doc.date,
            doc.ecli,
            doc.president,
            doc.relator,
            pdf_path,
        ],
    )?;
    Ok(())
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        category: row.get(1)?,
        section: row.get(2)?,
        kind: row.get(3)?,
        doc_type: row.get(4)?,
        number: row.get(5)?,
        date: row.get(6)?,
        ecli: row.get(7)?,
        president: row.get(8)?,
        relator: row.get(9)?,
        pdf_path: row.get(10)?,
    })
}

const DOCUMENT_COLUMNS: &str =
    "id, category, section, kind, type, number, date, ecli, president, relator,
     COALESCE(pdf_path, '')";

/// Stored documents, newest decision first. Dates the portal reports as
/// anything other than DD/MM/YYYY sort last.
pub fn fetch_documents(
    conn: &Connection,
    category: Option<&str>,
    limit: usize,
) -> Result<Vec<DocumentRow>> {
    let mut rows = match category {
        Some(cat) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE category = ?1"
            ))?;
            let rows = stmt
                .query_map([cat.to_uppercase()], row_to_document)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt =
                conn.prepare(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents"))?;
            let rows = stmt
                .query_map([], row_to_document)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };

    // Decision dates are DD/MM/YYYY strings; ordering them textually would
    // sort by day first, so parse before comparing.
    rows.sort_by_key(|r| std::cmp::Reverse(decision_date(&r.date)));
    rows.truncate(limit);
    Ok(rows)
}

pub fn fetch_document(conn: &Connection, id: &str) -> Result<Option<DocumentRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
            [id],
            row_to_document,
        )
        .optional()?;
    Ok(row)
}

fn decision_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
}

pub struct Stats {
    pub total: usize,
    pub civile: usize,
    pub penale: usize,
    pub with_pdf: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let civile: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE category = 'CIVILE'",
        [],
        |r| r.get(0),
    )?;
    let penale: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE category = 'PENALE'",
        [],
        |r| r.get(0),
    )?;
    let with_pdf: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE pdf_path IS NOT NULL AND pdf_path != ''",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        total,
        civile,
        penale,
        with_pdf,
    })
}
