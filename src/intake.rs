use log::{debug, info, warn};
use std::panic::{self, AssertUnwindSafe};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use event_record::*;
use snafu::{prelude::*, Snafu};

use serde::{Deserialize, Serialize};
use serde_json::json;

pub mod config_reader;
mod io_common;
mod io_excel;
mod io_pdf;
pub mod stores;

use crate::intake::config_reader::IntakeConfig;
pub use crate::intake::io_common::simplify_file_name;
use crate::intake::io_pdf::PdfNormalizer;
use crate::intake::stores::*;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_CONTENT_TYPE: &str = "application/vnd.ms-excel";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IntakeError {
    #[snafu(display("The upload payload is not valid base64"))]
    DecodingPayload { source: base64::DecodeError },
    #[snafu(display("The upload request is not valid JSON"))]
    ParsingRequest { source: serde_json::Error },

    #[snafu(display("Unsupported file type: {content_type}"))]
    UnsupportedFormat { content_type: String },

    #[snafu(display("Error opening the workbook as xlsx"))]
    OpeningXlsx { source: calamine::XlsxError },
    #[snafu(display("Error opening the workbook as xls"))]
    OpeningXls { source: calamine::XlsError },
    #[snafu(display("The document is empty"))]
    EmptyDocument {},
    #[snafu(display("No text could be extracted from the PDF ({primary}; then {fallback})"))]
    ExtractingPdfText { primary: String, fallback: String },
    #[snafu(display("The {format} reader failed on malformed input"))]
    ReaderPanicked { format: String },
    #[snafu(display("Invalid label pattern"))]
    CompilingPattern { source: regex::Error },

    #[snafu(display("Error writing object {key}"))]
    WritingObject { source: std::io::Error, key: String },
    #[snafu(display("Error reading object {key}"))]
    ReadingObject { source: std::io::Error, key: String },
    #[snafu(display("Object {key} does not exist"))]
    MissingObject { key: String },
    #[snafu(display("Error writing record {event_id}"))]
    WritingRecord {
        source: std::io::Error,
        event_id: String,
    },
    #[snafu(display("Error serializing the event record"))]
    SerializingRecord { source: serde_json::Error },
    #[snafu(display("Storage is not configured"))]
    StorageDisabled {},

    #[snafu(display("No alert topic configured"))]
    AlertTopicMissing {},
    #[snafu(display("Error serializing the alert"))]
    SerializingAlert { source: serde_json::Error },

    #[snafu(display("Error opening config file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing config file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error reading input file {path}"))]
    ReadingInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing output file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No input provided: use --input or --request"))]
    MissingInput {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type IntakeResult<T> = Result<T, IntakeError>;

/// The families of failures. The upload cascade decides what to do next
/// from the family only.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorKind {
    Decode,
    UnsupportedFormat,
    Parse,
    Storage,
    Notify,
    Config,
}

impl IntakeError {
    pub fn kind(&self) -> ErrorKind {
        use IntakeError::*;
        match self {
            DecodingPayload { .. } | ParsingRequest { .. } => ErrorKind::Decode,
            UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            OpeningXlsx { .. }
            | OpeningXls { .. }
            | EmptyDocument {}
            | ExtractingPdfText { .. }
            | ReaderPanicked { .. }
            | CompilingPattern { .. } => ErrorKind::Parse,
            WritingObject { .. }
            | ReadingObject { .. }
            | MissingObject { .. }
            | WritingRecord { .. }
            | SerializingRecord { .. }
            | StorageDisabled {} => ErrorKind::Storage,
            AlertTopicMissing {} | SerializingAlert { .. } => ErrorKind::Notify,
            OpeningConfig { .. }
            | ParsingConfig { .. }
            | ReadingInput { .. }
            | WritingOutput { .. }
            | MissingInput {}
            | Whatever { .. } => ErrorKind::Config,
        }
    }
}

// ******** Format routing *********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DocumentFormat {
    Spreadsheet,
    Pdf,
}

impl DocumentFormat {
    /// Maps a declared content type to a format. Parameters (`; charset=...`)
    /// and case are ignored.
    pub fn from_content_type(content_type: &str) -> IntakeResult<DocumentFormat> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            XLSX_CONTENT_TYPE | XLS_CONTENT_TYPE => Ok(DocumentFormat::Spreadsheet),
            PDF_CONTENT_TYPE => Ok(DocumentFormat::Pdf),
            _ => UnsupportedFormatSnafu { content_type }.fail(),
        }
    }

    /// The content type to declare for a local file, from its extension.
    pub fn content_type_for_path(path: &str) -> Option<&'static str> {
        let ext = std::path::Path::new(path)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" => Some(XLSX_CONTENT_TYPE),
            "xls" => Some(XLS_CONTENT_TYPE),
            "pdf" => Some(PDF_CONTENT_TYPE),
            _ => None,
        }
    }
}

/// Dispatches a document to the reader for its format.
///
/// This is the strict entry point: unsupported content types and unreadable
/// documents are reported as errors.
pub struct FormatRouter {
    pdf: PdfNormalizer,
}

impl FormatRouter {
    pub fn new(config: &IntakeConfig) -> IntakeResult<FormatRouter> {
        Ok(FormatRouter {
            pdf: PdfNormalizer::new(config.structured_pdf_extraction())?,
        })
    }

    pub fn route(&self, bytes: &[u8], content_type: &str) -> IntakeResult<CanonicalEventRecord> {
        let format = DocumentFormat::from_content_type(content_type)?;
        debug!(
            "route: {} bytes, content type {:?} -> {:?}",
            bytes.len(),
            content_type,
            format
        );
        ensure!(!bytes.is_empty(), EmptyDocumentSnafu {});
        // The workbook and PDF readers can panic on corrupted documents.
        let res = panic::catch_unwind(AssertUnwindSafe(|| match format {
            DocumentFormat::Spreadsheet => io_excel::normalize_workbook(bytes),
            DocumentFormat::Pdf => self.pdf.normalize(bytes),
        }));
        match res {
            Ok(record) => record,
            Err(_) => ReaderPanickedSnafu {
                format: format!("{:?}", format),
            }
            .fail(),
        }
    }
}

// ******** Upload envelope *********

/// An upload as sent by the clients: the file travels as base64 text.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub file_content: String,
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl UploadRequest {
    pub fn from_json(contents: &str) -> IntakeResult<UploadRequest> {
        serde_json::from_str(contents).context(ParsingRequestSnafu {})
    }

    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Decodes the file content. Whitespace and a `data:...;base64,` prefix are accepted.
    pub fn decode(&self) -> IntakeResult<Vec<u8>> {
        let payload = self.file_content.trim();
        let payload = match payload.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => payload,
        };
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD.decode(cleaned).context(DecodingPayloadSnafu {})
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(rename = "storageKey")]
    pub storage_key: Option<String>,
    pub data: CanonicalEventRecord,
}

// ******** Upload cascade *********

/// Where the record of an upload came from.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum IngestTier {
    /// Parsed from the copy kept in the object store.
    Stored,
    /// Parsed from the uploaded bytes directly.
    Direct,
    /// Nothing usable: the sample event.
    Sample,
}

#[derive(PartialEq, Debug, Clone)]
pub struct IngestOutcome {
    pub record: CanonicalEventRecord,
    pub message: String,
    pub storage_key: Option<String>,
    pub tier: IngestTier,
}

impl From<IngestOutcome> for UploadResponse {
    fn from(outcome: IngestOutcome) -> UploadResponse {
        UploadResponse {
            message: outcome.message,
            storage_key: outcome.storage_key,
            data: outcome.record,
        }
    }
}

/// Storage key for an upload: UTC timestamp prefix, then the bare file name.
pub fn storage_key(file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}",
        now.format("%Y%m%d%H%M%S%3f"),
        simplify_file_name(file_name)
    )
}

/// Identifier under which a record is announced.
pub fn event_id(event_name: &str, now: DateTime<Utc>) -> String {
    let base: String = event_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}", base, now.format("%Y%m%d%H%M%S"))
}

fn sample_outcome(file_name: &str, err: &IntakeError) -> IngestOutcome {
    let reason = match err.kind() {
        ErrorKind::Decode => "could not decode the upload".to_string(),
        ErrorKind::UnsupportedFormat => err.to_string(),
        _ => format!("could not parse {}: {}", file_name, err),
    };
    IngestOutcome {
        record: sample_event(),
        message: format!("Fallback to sample event: {}.", reason),
        storage_key: None,
        tier: IngestTier::Sample,
    }
}

/// Entry point for uploads: always produces a record.
///
/// Tiers, each tried once: the copy persisted in the object store, the
/// uploaded bytes, the sample event.
pub struct UploadOrchestrator {
    router: FormatRouter,
    object_store: Box<dyn ObjectStore>,
    record_store: Box<dyn RecordStore>,
    alerts: Box<dyn AlertChannel>,
}

impl UploadOrchestrator {
    pub fn new(
        router: FormatRouter,
        object_store: Box<dyn ObjectStore>,
        record_store: Box<dyn RecordStore>,
        alerts: Box<dyn AlertChannel>,
    ) -> UploadOrchestrator {
        UploadOrchestrator {
            router,
            object_store,
            record_store,
            alerts,
        }
    }

    pub fn from_config(config: &IntakeConfig) -> IntakeResult<UploadOrchestrator> {
        let object_store: Box<dyn ObjectStore> = match config.object_directory() {
            Some(dir) => Box::new(FsObjectStore::new(dir)),
            None => Box::new(DisabledStore {}),
        };
        let record_store: Box<dyn RecordStore> = match config.record_directory() {
            Some(dir) => Box::new(FsRecordStore::new(dir)),
            None => Box::new(DisabledStore {}),
        };
        let alerts = LogAlertChannel::new(config.alert_topic(), config.alert_subject());
        Ok(UploadOrchestrator::new(
            FormatRouter::new(config)?,
            object_store,
            record_store,
            Box::new(alerts),
        ))
    }

    pub fn router(&self) -> &FormatRouter {
        &self.router
    }

    /// Runs the cascade on raw document bytes.
    pub fn ingest(&self, bytes: &[u8], file_name: &str, content_type: &str) -> IngestOutcome {
        let key = storage_key(file_name, Utc::now());
        let stored_key = match self.object_store.put(bytes, &key, content_type) {
            Ok(()) => {
                info!("ingest: stored {} ({} bytes)", key, bytes.len());
                Some(key)
            }
            Err(e) => {
                warn!("ingest: could not store {}: {} ({:?})", key, e, e.kind());
                None
            }
        };

        if let Some(key) = &stored_key {
            match self.parse_stored(key, content_type) {
                Ok(record) => {
                    return IngestOutcome {
                        record,
                        message: format!(
                            "File {} uploaded and parsed successfully as {}.",
                            file_name, key
                        ),
                        storage_key: Some(key.clone()),
                        tier: IngestTier::Stored,
                    };
                }
                Err(e) => warn!(
                    "ingest: stored copy {} not usable: {} ({:?})",
                    key,
                    e,
                    e.kind()
                ),
            }
        }

        match self.router.route(bytes, content_type) {
            Ok(record) => {
                info!("ingest: parsed {} from the uploaded bytes", file_name);
                let message = match &stored_key {
                    Some(key) => format!(
                        "File {} uploaded as {} and parsed from the upload.",
                        file_name, key
                    ),
                    None => format!("File {} parsed; it could not be stored.", file_name),
                };
                IngestOutcome {
                    record,
                    message,
                    storage_key: stored_key,
                    tier: IngestTier::Direct,
                }
            }
            Err(e) => {
                warn!(
                    "ingest: falling back to the sample event for {}: {} ({:?})",
                    file_name,
                    e,
                    e.kind()
                );
                sample_outcome(file_name, &e)
            }
        }
    }

    fn parse_stored(&self, key: &str, content_type: &str) -> IntakeResult<CanonicalEventRecord> {
        let bytes = self
            .object_store
            .get(key)?
            .context(MissingObjectSnafu { key })?;
        self.router.route(&bytes, content_type)
    }

    /// Handles an upload envelope: decode, ingest, announce.
    pub fn handle_upload(&self, request: &UploadRequest) -> UploadResponse {
        match request.decode() {
            Ok(bytes) => self.handle_bytes(&bytes, &request.file_name, request.content_type()),
            Err(e) => {
                warn!("handle_upload: {}: {} ({:?})", request.file_name, e, e.kind());
                sample_outcome(&request.file_name, &e).into()
            }
        }
    }

    /// Ingests already decoded bytes, then announces the result.
    pub fn handle_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> UploadResponse {
        let outcome = self.ingest(bytes, file_name, content_type);
        self.announce(&outcome);
        outcome.into()
    }

    /// Best-effort: records the event and publishes a notification. Failures are only logged.
    fn announce(&self, outcome: &IngestOutcome) {
        if outcome.tier == IngestTier::Sample {
            debug!("announce: sample event, nothing to announce");
            return;
        }
        let record = &outcome.record;
        let id = event_id(&record.event_name, Utc::now());
        if let Err(e) = self.record_store.put_record(record, &id) {
            warn!("announce: record {} not stored: {} ({:?})", id, e, e.kind());
        }
        let published = serde_json::to_string(&json!({
            "type": "INGESTION_COMPLETE",
            "event_id": id,
            "event_name": record.event_name,
            "expected_attendance": record.expected_attendance,
        }))
        .context(SerializingAlertSnafu {})
        .and_then(|message| self.alerts.publish(&message));
        if let Err(e) = published {
            warn!("announce: alert for {} not published: {} ({:?})", id, e, e.kind());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const FULL_WORKBOOK: &[u8] = include_bytes!("../testdata/event_full.xlsx");
    const REPORT_PDF: &[u8] = include_bytes!("../testdata/event_report.pdf");
    const LEGACY_WORKBOOK: &[u8] = include_bytes!("../testdata/event_legacy.xls");

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        records: Mutex<Vec<(String, CanonicalEventRecord)>>,
        alerts: Mutex<Vec<String>>,
        lose_objects: bool,
    }

    impl ObjectStore for Arc<MemoryStore> {
        fn put(&self, bytes: &[u8], key: &str, _content_type: &str) -> IntakeResult<()> {
            if !self.lose_objects {
                self.objects
                    .lock()
                    .unwrap()
                    .insert(key.to_string(), bytes.to_vec());
            }
            Ok(())
        }

        fn get(&self, key: &str) -> IntakeResult<Option<Vec<u8>>> {
            Ok(self.objects.lock().unwrap().get(key).cloned())
        }
    }

    impl RecordStore for Arc<MemoryStore> {
        fn put_record(&self, record: &CanonicalEventRecord, event_id: &str) -> IntakeResult<()> {
            self.records
                .lock()
                .unwrap()
                .push((event_id.to_string(), record.clone()));
            Ok(())
        }
    }

    impl AlertChannel for Arc<MemoryStore> {
        fn publish(&self, message: &str) -> IntakeResult<()> {
            self.alerts.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn router() -> FormatRouter {
        FormatRouter::new(&IntakeConfig::default()).unwrap()
    }

    fn memory_orchestrator(store: &Arc<MemoryStore>) -> UploadOrchestrator {
        UploadOrchestrator::new(
            router(),
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(store.clone()),
        )
    }

    fn offline_orchestrator() -> UploadOrchestrator {
        UploadOrchestrator::new(
            router(),
            Box::new(DisabledStore {}),
            Box::new(DisabledStore {}),
            Box::new(LogAlertChannel::new(None, "test".to_string())),
        )
    }

    #[test]
    fn router_is_strict() {
        let r = router();
        let err = r.route(b"a,b,c", "text/csv").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        let err = r.route(b"definitely not a workbook", XLSX_CONTENT_TYPE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        let err = r.route(b"", PDF_CONTENT_TYPE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn content_types() {
        assert_eq!(
            DocumentFormat::from_content_type(XLS_CONTENT_TYPE).unwrap(),
            DocumentFormat::Spreadsheet
        );
        assert_eq!(
            DocumentFormat::from_content_type("Application/PDF; charset=binary").unwrap(),
            DocumentFormat::Pdf
        );
        assert!(DocumentFormat::from_content_type(DEFAULT_CONTENT_TYPE).is_err());
        assert_eq!(
            DocumentFormat::content_type_for_path("/tmp/Event Plan.XLSX"),
            Some(XLSX_CONTENT_TYPE)
        );
        assert_eq!(DocumentFormat::content_type_for_path("notes.txt"), None);
    }

    #[test]
    fn unreadable_workbook_yields_sample() {
        let outcome =
            offline_orchestrator().ingest(b"PK\x03\x04 truncated", "plan.xlsx", XLSX_CONTENT_TYPE);
        assert_eq!(outcome.tier, IngestTier::Sample);
        assert_eq!(outcome.record, sample_event());
        assert_eq!(outcome.storage_key, None);
        assert!(outcome.message.contains("sample"));
    }

    #[test]
    fn corrupted_documents_yield_sample() {
        let store = Arc::new(MemoryStore::default());
        let orchestrator = memory_orchestrator(&store);

        // Compound file header whose sector tables point past the end of the file.
        let mut ole = vec![0u8; 512];
        ole[..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
        ole[24..34].copy_from_slice(&[0x3E, 0, 3, 0, 0xFE, 0xFF, 9, 0, 6, 0]);
        let put = |buf: &mut Vec<u8>, at: usize, v: u32| {
            buf[at..at + 4].copy_from_slice(&v.to_le_bytes())
        };
        put(&mut ole, 44, 1);
        put(&mut ole, 48, 1000);
        put(&mut ole, 56, 4096);
        put(&mut ole, 60, 0xFFFF_FFFE);
        put(&mut ole, 68, 0xFFFF_FFFE);
        put(&mut ole, 76, 1000);
        for at in (80..512).step_by(4) {
            put(&mut ole, at, 0xFFFF_FFFF);
        }
        ole.extend((0..1024u32).map(|i| (i.wrapping_mul(7919) % 251) as u8));
        let outcome = orchestrator.ingest(&ole, "legacy.xls", XLS_CONTENT_TYPE);
        assert_eq!(outcome.tier, IngestTier::Sample);
        assert_eq!(outcome.record, sample_event());

        let truncated = &REPORT_PDF[..REPORT_PDF.len() / 2];
        let outcome = orchestrator.ingest(truncated, "report.pdf", PDF_CONTENT_TYPE);
        assert_eq!(outcome.tier, IngestTier::Sample);
        assert_eq!(outcome.record, sample_event());
        assert!(store.records.lock().unwrap().is_empty());
    }

    #[test]
    fn legacy_workbook_is_routed() {
        let record = router().route(LEGACY_WORKBOOK, XLS_CONTENT_TYPE).unwrap();
        assert_eq!(record.event_name, "Lakeside Fun Run");
        assert_eq!(record.expected_attendance, 2);
    }

    #[test]
    fn unsupported_type_yields_sample() {
        let outcome = offline_orchestrator().ingest(b"hello", "notes.txt", "text/plain");
        assert_eq!(outcome.tier, IngestTier::Sample);
        assert_eq!(outcome.record, sample_event());
        assert!(outcome.message.contains("Unsupported file type: text/plain"));
    }

    #[test]
    fn stored_copy_is_parsed() {
        let store = Arc::new(MemoryStore::default());
        let outcome =
            memory_orchestrator(&store).ingest(FULL_WORKBOOK, "event_full.xlsx", XLSX_CONTENT_TYPE);
        assert_eq!(outcome.tier, IngestTier::Stored);
        let key = outcome.storage_key.clone().unwrap();
        assert!(key.ends_with("_event_full.xlsx"));
        assert!(store.objects.lock().unwrap().contains_key(&key));
        assert_eq!(outcome.record.event_name, "Harbour Lights Festival");
        assert!(outcome.message.contains(&key));
    }

    #[test]
    fn lost_copy_falls_back_to_direct_parse() {
        let store = Arc::new(MemoryStore {
            lose_objects: true,
            ..Default::default()
        });
        let outcome =
            memory_orchestrator(&store).ingest(REPORT_PDF, "report.pdf", PDF_CONTENT_TYPE);
        assert_eq!(outcome.tier, IngestTier::Direct);
        assert!(outcome.storage_key.is_some());
        assert_eq!(outcome.record.expected_attendance, 12000);
    }

    #[test]
    fn storage_failure_falls_back_to_direct_parse() {
        let outcome =
            offline_orchestrator().ingest(FULL_WORKBOOK, "event_full.xlsx", XLS_CONTENT_TYPE);
        assert_eq!(outcome.tier, IngestTier::Direct);
        assert_eq!(outcome.storage_key, None);
        assert_eq!(outcome.record.expected_attendance, 5);
    }

    #[test]
    fn upload_is_announced() {
        let store = Arc::new(MemoryStore::default());
        let request = UploadRequest {
            file_content: STANDARD.encode(FULL_WORKBOOK),
            file_name: "event_full.xlsx".to_string(),
            content_type: Some(XLSX_CONTENT_TYPE.to_string()),
        };
        let response = memory_orchestrator(&store).handle_upload(&request);
        assert_eq!(response.data.event_name, "Harbour Lights Festival");

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].0.starts_with("Harbour_Lights_Festival_"));
        assert_eq!(records[0].1, response.data);

        let alerts = store.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        let js: serde_json::Value = serde_json::from_str(&alerts[0]).unwrap();
        assert_eq!(js["type"], "INGESTION_COMPLETE");
        assert_eq!(js["expected_attendance"], 5);
    }

    #[test]
    fn bad_payload_yields_sample_without_announcement() {
        let store = Arc::new(MemoryStore::default());
        let request = UploadRequest {
            file_content: "%%% not base64 %%%".to_string(),
            file_name: "event.xlsx".to_string(),
            content_type: Some(XLSX_CONTENT_TYPE.to_string()),
        };
        let response = memory_orchestrator(&store).handle_upload(&request);
        assert_eq!(response.data, sample_event());
        assert_eq!(response.storage_key, None);
        assert!(response.message.contains("decode"));
        assert!(store.objects.lock().unwrap().is_empty());
        assert!(store.records.lock().unwrap().is_empty());
        assert!(store.alerts.lock().unwrap().is_empty());
    }

    #[test]
    fn request_envelope() {
        let request = UploadRequest::from_json(
            r#"{"file_content": "data:application/pdf;base64,aGVs\nbG8=", "file_name": "a.pdf"}"#,
        )
        .unwrap();
        assert_eq!(request.decode().unwrap(), b"hello".to_vec());
        assert_eq!(request.content_type(), DEFAULT_CONTENT_TYPE);
        let err = UploadRequest::from_json("{\"file_name\": 3}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn response_shape() {
        let response: UploadResponse =
            sample_outcome("x.xlsx", &IntakeError::EmptyDocument {}).into();
        let js = serde_json::to_value(&response).unwrap();
        assert!(js["storageKey"].is_null());
        assert_eq!(js["data"]["event_name"], "Bukit Jalil Concert");
        assert!(js["message"].as_str().unwrap().contains("x.xlsx"));
    }

    #[test]
    fn keys_and_ids() {
        let now = Utc.with_ymd_and_hms(2025, 10, 10, 19, 30, 5).unwrap();
        assert_eq!(
            storage_key("/uploads/plan v2.xlsx", now),
            "20251010193005000_plan v2.xlsx"
        );
        assert_eq!(
            event_id("Harbour Lights / Night 1", now),
            "Harbour_Lights___Night_1_20251010193005"
        );
    }

    #[test]
    fn concurrent_uploads_do_not_mix() {
        let store = Arc::new(MemoryStore::default());
        let orchestrator = memory_orchestrator(&store);
        let (workbook, report) = std::thread::scope(|s| {
            let a = s.spawn(|| {
                orchestrator.ingest(FULL_WORKBOOK, "event_full.xlsx", XLSX_CONTENT_TYPE)
            });
            let b = s.spawn(|| {
                orchestrator.ingest(REPORT_PDF, "event_report.pdf", PDF_CONTENT_TYPE)
            });
            (a.join().unwrap(), b.join().unwrap())
        });
        assert_eq!(workbook.record.event_name, "Harbour Lights Festival");
        assert_eq!(workbook.record.expected_attendance, 5);
        assert_eq!(workbook.record.gates.len(), 2);
        assert_eq!(report.record.event_name, "Riverside Night Market");
        assert_eq!(report.record.expected_attendance, 12000);
        assert!(report.record.gates.is_empty());
        assert_ne!(workbook.storage_key, report.storage_key);
    }
}
