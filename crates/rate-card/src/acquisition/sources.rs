use super::{builtin, parser, AcquisitionError, RateTableSource};
use crate::pricing::RateTable;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::PathBuf;
use std::time::Duration;

/// Rate table shipped with the binary. Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSource;

impl RateTableSource for BuiltinSource {
    fn name(&self) -> &str {
        "builtin"
    }

    fn load(&self) -> Result<RateTable, AcquisitionError> {
        Ok(builtin::rate_table())
    }
}

/// Local CSV or JSON export, chosen by file extension.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

impl RateTableSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<RateTable, AcquisitionError> {
        let reader = BufReader::new(File::open(&self.path)?);
        if self.is_json() {
            Ok(parser::parse_json(reader)?)
        } else {
            Ok(parser::parse_csv(reader)?)
        }
    }
}

/// Published spreadsheet export fetched over HTTP. The response content type
/// selects the parser; binary workbooks are rejected.
///
/// Uses the blocking client, so `load` must run off the async executor
/// (see [`super::store::refresh_in_background`]).
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    name: String,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = format!("http:{url}");
        Self { url, name }
    }
}

impl RateTableSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<RateTable, AcquisitionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let response = client
            .get(&self.url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = response.bytes()?;

        decode_body(&content_type, &body)
    }
}

pub(crate) fn decode_body(content_type: &str, body: &[u8]) -> Result<RateTable, AcquisitionError> {
    if content_type.contains("json") {
        Ok(parser::parse_json(Cursor::new(body))?)
    } else if content_type.contains("text") || content_type.contains("csv") {
        Ok(parser::parse_csv(Cursor::new(body))?)
    } else {
        Err(AcquisitionError::UnsupportedContent(content_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::Location;
    use std::io::Write;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("rate-card-{}-{name}", std::process::id()));
        let mut file = File::create(&path).expect("create scratch file");
        file.write_all(contents.as_bytes()).expect("write scratch file");
        path
    }

    #[test]
    fn file_source_parses_csv_by_default() {
        let path = scratch_file(
            "rates.csv",
            "Role,Onshore,Offshore,Nearshore\nRelease Manager,99,13.5,56\n",
        );
        let table = FileSource::new(&path).load().expect("csv loads");
        std::fs::remove_file(&path).ok();

        assert_eq!(
            table.find("Release Manager").map(|r| r.cost(Location::Offshore)),
            Some(13.5)
        );
    }

    #[test]
    fn file_source_parses_json_by_extension() {
        let path = scratch_file(
            "rates.JSON",
            r#"[{"role": "Junior Developer", "onshore": {"cost": 69}}]"#,
        );
        let table = FileSource::new(&path).load().expect("json loads");
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), 1);
    }

    #[test]
    fn file_source_propagates_io_errors() {
        let error = FileSource::new("./does-not-exist.csv")
            .load()
            .expect_err("expected io error");

        match error {
            AcquisitionError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn body_decoding_follows_content_type() {
        let csv = b"Role,On,Off,Near\nRelease Manager,99,13.5,56\n";
        assert_eq!(decode_body("text/csv; charset=utf-8", csv).expect("csv").len(), 1);

        let json = br#"[{"Role": "Release Manager", "Onshore Cost/hr": 99}]"#;
        assert_eq!(decode_body("application/json", json).expect("json").len(), 1);

        match decode_body(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            b"PK",
        ) {
            Err(AcquisitionError::UnsupportedContent(kind)) => assert!(kind.contains("spreadsheet")),
            other => panic!("expected unsupported content, got {other:?}"),
        }
    }

    #[test]
    fn builtin_source_always_loads() {
        let table = BuiltinSource.load().expect("builtin loads");
        assert!(!table.is_empty());
    }

    async fn serve_exports() -> String {
        use axum::http::StatusCode;
        use axum::routing::get;

        let app = axum::Router::new()
            .route(
                "/rates.csv",
                get(|| async {
                    (
                        [("content-type", "text/csv; charset=utf-8")],
                        "Role,Onshore,Offshore,Nearshore,Client Rate\nRelease Manager,99,13.5,56,160\n",
                    )
                }),
            )
            .route(
                "/rates.json",
                get(|| async {
                    (
                        [("content-type", "application/json")],
                        r#"[{"role": "Junior Developer", "onshore": {"cost": 69}}]"#,
                    )
                }),
            )
            .route(
                "/rates.xlsx",
                get(|| async {
                    (
                        [(
                            "content-type",
                            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                        )],
                        vec![0x50_u8, 0x4b, 0x03, 0x04],
                    )
                }),
            )
            .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    async fn fetch(url: String) -> Result<RateTable, AcquisitionError> {
        tokio::task::spawn_blocking(move || HttpSource::new(url).load())
            .await
            .expect("blocking fetch joins")
    }

    #[tokio::test]
    async fn http_source_picks_parser_from_response() {
        let base = serve_exports().await;

        let csv = fetch(format!("{base}/rates.csv")).await.expect("csv export");
        let manager = csv.find("Release Manager").expect("manager");
        assert_eq!(manager.cost(Location::Offshore), 13.5);
        assert_eq!(manager.client_rate, Some(160.0));

        let json = fetch(format!("{base}/rates.json")).await.expect("json export");
        assert_eq!(
            json.find("Junior Developer").map(|r| r.cost(Location::Onshore)),
            Some(69.0)
        );
    }

    #[tokio::test]
    async fn http_source_rejects_workbooks_and_failed_responses() {
        let base = serve_exports().await;

        match fetch(format!("{base}/rates.xlsx")).await {
            Err(AcquisitionError::UnsupportedContent(kind)) => assert!(kind.contains("spreadsheetml")),
            other => panic!("expected unsupported content, got {other:?}"),
        }

        match fetch(format!("{base}/broken")).await {
            Err(AcquisitionError::Status(500)) => {}
            other => panic!("expected HTTP 500, got {other:?}"),
        }
    }
}
