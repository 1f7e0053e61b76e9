//! Record ingestion from `id,name` lines.
//!
//! The id is everything before the first comma. Lines without an id get
//! `L_<line number>` (1-based), so rendering can tell generated ids apart.
//!
//! Lines come from a local file or from an `http(s)://` URL.

use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::preprocess::Preprocessor;
use crate::record::{Collection, Record, LINE_ID_PREFIX};

/// Parse one input line. Blank lines and lines with a blank name yield `None`.
pub fn parse_line(line: &str, line_number: usize, preprocessor: &Preprocessor) -> Option<Record> {
    let (id, name) = match line.split_once(',') {
        Some((id, name)) => (id.trim(), name.trim()),
        None => ("", line.trim()),
    };
    if name.is_empty() {
        return None;
    }

    let id = if id.is_empty() {
        format!("{}{}", LINE_ID_PREFIX, line_number)
    } else {
        id.to_string()
    };
    Some(Record::new(id, name, preprocessor.preprocess(name)))
}

/// Build a collection from lines, numbering them from 1.
pub fn load_lines<I, S>(lines: I, preprocessor: &Preprocessor) -> Collection
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let records: Vec<Record> = lines
        .into_iter()
        .enumerate()
        .filter_map(|(i, line)| parse_line(line.as_ref(), i + 1, preprocessor))
        .collect();
    Collection::new(records)
}

/// Read and parse a names file.
pub fn load_file<P: AsRef<Path>>(path: P, preprocessor: &Preprocessor) -> Result<Collection> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read names file: {:?}", path.as_ref()))?;
    let collection = load_lines(content.lines(), preprocessor);
    debug!(
        path = ?path.as_ref(),
        records = collection.len(),
        preprocessor = %preprocessor.name(),
        "names loaded"
    );
    Ok(collection)
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Whether `source` names an HTTP resource rather than a file.
pub fn is_url(source: &str) -> bool {
    let lower = source.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Fetch a names list over HTTP. Any non-2xx status is an error.
pub fn load_url(url: &str, preprocessor: &Preprocessor) -> Result<Collection> {
    let url = url.trim();
    if !is_url(url) {
        bail!("Invalid URL scheme, expected http:// or https://: {}", url);
    }

    let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
    let response = agent
        .get(url)
        .call()
        .map_err(|e| anyhow!("Failed to fetch names from {}: {}", url, e))?;
    if !(200..300).contains(&response.status()) {
        bail!("Failed to fetch names from {}: status {}", url, response.status());
    }
    let body = response
        .into_string()
        .with_context(|| format!("Failed to read response body from {}", url))?;

    let collection = load_lines(body.lines(), preprocessor);
    info!(url, records = collection.len(), "names fetched");
    Ok(collection)
}

/// Load from a URL or, failing the scheme check, a local path (`~` expanded).
pub fn load_source(source: &str, preprocessor: &Preprocessor) -> Result<Collection> {
    if is_url(source) {
        load_url(source, preprocessor)
    } else {
        load_file(shellexpand::tilde(source).into_owned(), preprocessor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::Arc;

    /// Serve one HTTP response on a local port, returning its base URL.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/names.txt", listener.local_addr().unwrap());
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
        });
        url
    }

    fn pipeline() -> Preprocessor {
        Preprocessor::parse("PIPELINE:TOKENIZE,LOWERCASE", Arc::default())
    }

    #[test]
    fn test_parse_line_ids() {
        let p = pipeline();

        let r = parse_line("42, John Smith", 1, &p).unwrap();
        assert_eq!(r.id, "42");
        assert_eq!(r.original_text, "John Smith");
        assert_eq!(r.tokens, vec!["john", "smith"]);

        let r = parse_line("Jane Doe", 7, &p).unwrap();
        assert_eq!(r.id, "L_7");

        let r = parse_line("  , Jane Doe", 3, &p).unwrap();
        assert_eq!(r.id, "L_3");

        // only the first comma separates the id
        let r = parse_line("x1,Smith, John", 1, &p).unwrap();
        assert_eq!(r.id, "x1");
        assert_eq!(r.original_text, "Smith, John");
    }

    #[test]
    fn test_blank_lines_skipped_but_counted() {
        let names = load_lines(["john smith", "", "   ", "jane smith", "9,"], &pipeline());
        let ids: Vec<&str> = names.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["L_1", "L_4"]);
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("namematch-loader-{}.txt", std::process::id()));
        std::fs::write(&path, "a1,Peter Jones\nMary Jones\n").unwrap();
        let names = load_file(&path, &pipeline()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(names.len(), 2);
        assert_eq!(names[1].id, "L_2");
        assert!(load_file(&path, &pipeline()).is_err());
    }

    #[test]
    fn test_url_detection() {
        assert!(is_url("https://example.org/names.txt"));
        assert!(is_url("  HTTP://example.org"));
        assert!(!is_url("ftp://example.org/names.txt"));
        assert!(!is_url("~/names.txt"));
        assert!(load_url("ftp://example.org/names.txt", &pipeline()).is_err());
    }

    #[test]
    fn test_load_url() {
        let url = serve_once("200 OK", "7,John Smith\r\nJane Doe\r\n");
        let names = load_source(&url, &pipeline()).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].id, "7");
        assert_eq!(names[1].id, "L_2");
        assert_eq!(names[1].tokens, vec!["jane", "doe"]);
    }

    #[test]
    fn test_load_url_error_status() {
        let url = serve_once("404 Not Found", "missing");
        assert!(load_url(&url, &pipeline()).is_err());
    }
}
