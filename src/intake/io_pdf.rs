use std::panic;

use event_record::builder::EventBuilder;
use regex::Regex;

use crate::intake::*;

// A value ends at the end of the line, or where the next label starts when
// the extractor joined several lines with spaces.
const STOP: &str = concat!(
    r"(?:[ \t]+(?:Event Name|Venue|Location|Attendance|Start|End)",
    r"(?: Name| Datetime| Time)?:|[ \t]*$)"
);

struct LabelPatterns {
    event_name: Regex,
    location_name: Regex,
    attendance: Regex,
    start: Regex,
    end: Regex,
}

impl LabelPatterns {
    fn compile() -> IntakeResult<LabelPatterns> {
        let labeled = |label: &str| {
            Regex::new(&format!(r"(?im)\b{}:[ \t]*(.*?){}", label, STOP))
                .context(CompilingPatternSnafu {})
        };
        Ok(LabelPatterns {
            event_name: labeled("Event Name")?,
            location_name: labeled("(?:Venue|Location)(?: Name)?")?,
            attendance: Regex::new(r"(?i)\bAttendance:[ \t]*(\d+)")
                .context(CompilingPatternSnafu {})?,
            start: labeled("Start(?: Datetime| Time)?")?,
            end: labeled("End(?: Datetime| Time)?")?,
        })
    }
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Reads the scalar fields of an event report.
///
/// Reports are free text: only the labeled lines are read, and the record
/// never has gates, transport or facilities.
pub struct PdfNormalizer {
    patterns: LabelPatterns,
    structured_extraction: bool,
}

impl PdfNormalizer {
    pub fn new(structured_extraction: bool) -> IntakeResult<PdfNormalizer> {
        Ok(PdfNormalizer {
            patterns: LabelPatterns::compile()?,
            structured_extraction,
        })
    }

    pub fn normalize(&self, bytes: &[u8]) -> IntakeResult<CanonicalEventRecord> {
        let text = self.extract_text(bytes)?;
        debug!("normalize_pdf: {} characters of text", text.len());
        let record = self.read_fields(&text);
        info!(
            "normalize_pdf: {:?} at {:?}, {} attendees",
            record.event_name, record.location_name, record.expected_attendance
        );
        Ok(record)
    }

    fn read_fields(&self, text: &str) -> CanonicalEventRecord {
        let p = &self.patterns;
        let mut builder = EventBuilder::new();
        if let Some(name) = capture(&p.event_name, text) {
            builder.event_name(name);
        }
        if let Some(location) = capture(&p.location_name, text) {
            builder.location_name(location);
        }
        if let Some(count) = capture(&p.attendance, text) {
            builder.expected_attendance(count.parse::<u64>().unwrap_or(0));
        }
        if let Some(start) = capture(&p.start, text) {
            builder.observe_start(&parse_datetime_str(start));
        }
        if let Some(end) = capture(&p.end, text) {
            builder.observe_end(&parse_datetime_str(end));
        }
        builder.build()
    }

    /// All the text of the document, from the layout-aware extractor if it
    /// works, otherwise from the page content streams.
    pub fn extract_text(&self, bytes: &[u8]) -> IntakeResult<String> {
        let primary = if self.structured_extraction {
            match structured_text(bytes) {
                Ok(text) => return Ok(text),
                Err(msg) => {
                    warn!("extract_text: structured extraction failed: {}", msg);
                    msg
                }
            }
        } else {
            "structured extraction disabled".to_string()
        };
        match plain_text(bytes) {
            Ok(text) => Ok(text),
            Err(fallback) => ExtractingPdfTextSnafu { primary, fallback }.fail(),
        }
    }
}

fn non_blank(text: String) -> Result<String, String> {
    if text.trim().is_empty() {
        Err("no text found".to_string())
    } else {
        Ok(text)
    }
}

fn structured_text(bytes: &[u8]) -> Result<String, String> {
    // The extractor panics on some malformed documents.
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => non_blank(text),
        Ok(Err(e)) => Err(format!("{:?}", e)),
        Err(_) => Err("the extractor panicked".to_string()),
    }
}

fn plain_text(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let mut res = String::new();
    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(text) => {
                res.push_str(&text);
                res.push('\n');
            }
            Err(e) => debug!("plain_text: skipping page {}: {}", page_num, e),
        }
    }
    non_blank(res)
}
