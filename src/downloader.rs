use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::{self, DocumentMeta};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Download stats returned after completion.
pub struct DownloadStats {
    pub saved: usize,
    pub failed: usize,
}

/// The portal's certificate chain does not always validate, so
/// verification is turned off for the PDF endpoint.
fn client() -> Result<Client> {
    Ok(Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Fetch every document's PDF into `dir` and record the successful ones.
/// A failed download is logged and skipped; that document gets no
/// database row at all.
pub async fn download_all(
    conn: &Connection,
    docs: &[DocumentMeta],
    dir: &Path,
) -> Result<DownloadStats> {
    let client = client()?;
    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut saved = 0usize;
    let mut failed = 0usize;
    for doc in docs {
        debug!("downloading {} -> {}", doc.id, doc.pdf_url);
        let path = dir.join(format!("{}.pdf", doc.id));
        match download_pdf(&client, &doc.pdf_url, &path).await {
            Ok(()) => {
                db::save_document(conn, doc, &path.to_string_lossy())?;
                saved += 1;
            }
            Err(e) => {
                warn!("download failed for {}: {e:#}", doc.id);
                failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("downloaded {} PDFs ({} failed)", saved, failed);
    Ok(DownloadStats { saved, failed })
}

/// GET one PDF to `path`, creating parent directories as needed.
async fn download_pdf(client: &Client, url: &str, path: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("server rejected {url}"))?;
    let body = response.bytes().await.context("body read failed")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(path, &body).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn sample_doc(id: &str) -> DocumentMeta {
        DocumentMeta {
            category: "CIVILE".into(),
            id: id.into(),
            section: "PRIMA".into(),
            kind: "CIVILE".into(),
            doc_type: "SENTENZA".into(),
            number: "12345".into(),
            date: "05/03/2021".into(),
            ecli: "ECLI:IT:CASS:2021:12345CIV".into(),
            president: "ROSSI".into(),
            relator: "BIANCHI".into(),
            pdf_url: String::new(),
        }
    }

    /// Serve one canned 200 response on an ephemeral port.
    async fn serve_once(body: &'static [u8]) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            sock.write_all(head.as_bytes()).await.unwrap();
            sock.write_all(body).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn saves_pdf_and_row_on_success() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let base = serve_once(b"%PDF-1.4 stub").await;
        let mut doc = sample_doc("doc-1");
        doc.pdf_url = format!("{base}/stub.pdf");

        let stats = download_all(&conn, &[doc], dir.path()).await.unwrap();
        assert_eq!(stats.saved, 1);
        assert_eq!(stats.failed, 0);

        let on_disk = std::fs::read(dir.path().join("doc-1.pdf")).unwrap();
        assert_eq!(on_disk, b"%PDF-1.4 stub");

        let row = db::fetch_document(&conn, "doc-1").unwrap().unwrap();
        assert!(row.pdf_path.ends_with("doc-1.pdf"));
    }

    #[tokio::test]
    async fn failed_download_leaves_no_row_and_no_file() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut doc = sample_doc("doc-2");
        // Port 1 refuses connections, so the GET fails fast.
        doc.pdf_url = "http://127.0.0.1:1/unreachable.pdf".to_string();

        let stats = download_all(&conn, &[doc], dir.path()).await.unwrap();
        assert_eq!(stats.saved, 0);
        assert_eq!(stats.failed, 1);
        assert!(db::fetch_document(&conn, "doc-2").unwrap().is_none());
        assert!(!dir.path().join("doc-2.pdf").exists());
    }
}
