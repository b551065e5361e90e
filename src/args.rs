use clap::Parser;

/// Turns an event document (spreadsheet workbook or PDF report) into a canonical event record.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The document to ingest. Either this option or --request must be given.
    #[clap(short, long, value_parser, conflicts_with = "request")]
    pub input: Option<String>,

    /// (MIME type, optional) The declared type of the --input document. When omitted, it is
    /// inferred from the file extension (.xlsx, .xls, .pdf).
    #[clap(long, value_parser)]
    pub content_type: Option<String>,

    /// (file path) An upload request in JSON format, with the document encoded in base64 in the
    /// `file_content` field, and the `file_name` and `content_type` fields.
    #[clap(long, value_parser)]
    pub request: Option<String>,

    /// (file path, optional) The configuration file, in JSON format. Without it, nothing is stored
    /// and no alert is published.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the response in JSON format. Defaults to
    /// the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference event record in JSON format. If provided, eventintake will check
    /// that the record it produced matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, unsupported or unreadable documents are reported as errors
    /// instead of being replaced by the sample event.
    #[clap(long, takes_value = false)]
    pub strict: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
