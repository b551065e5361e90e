mod args;
mod intake;

use std::fs;

use clap::Parser;
use log::{debug, info, warn};
use snafu::{prelude::*, ErrorCompat};
use text_diff::print_diff;

use crate::args::Args;
use crate::intake::config_reader::{read_config, IntakeConfig};
use crate::intake::*;

fn read_reference(path: &str) -> IntakeResult<serde_json::Value> {
    let contents = fs::read_to_string(path).context(ReadingInputSnafu { path })?;
    serde_json::from_str(&contents)
        .with_whatever_context(|_| format!("The reference file {} is not valid JSON", path))
}

fn write_output(out: &Option<String>, contents: &str) -> IntakeResult<()> {
    match out.as_deref() {
        None | Some("") | Some("stdout") => {
            println!("{}", contents);
            Ok(())
        }
        Some(path) => {
            info!("Writing response to {}", path);
            fs::write(path, contents).context(WritingOutputSnafu { path })
        }
    }
}

// Reads the document of the --input option, with its declared content type.
fn read_input(args: &Args, path: &str) -> IntakeResult<(Vec<u8>, String)> {
    let bytes = fs::read(path).context(ReadingInputSnafu { path })?;
    let content_type = match (&args.content_type, DocumentFormat::content_type_for_path(path)) {
        (Some(ct), _) => ct.clone(),
        (None, Some(ct)) => ct.to_string(),
        (None, None) => {
            warn!(
                "Could not infer the content type of {}, using {}",
                path, DEFAULT_CONTENT_TYPE
            );
            DEFAULT_CONTENT_TYPE.to_string()
        }
    };
    Ok((bytes, content_type))
}

fn strict_response(
    orchestrator: &UploadOrchestrator,
    bytes: &[u8],
    file_name: &str,
    content_type: &str,
) -> IntakeResult<UploadResponse> {
    let record = orchestrator.router().route(bytes, content_type)?;
    Ok(UploadResponse {
        message: format!("File {} parsed successfully.", file_name),
        storage_key: None,
        data: record,
    })
}

fn run(args: &Args) -> IntakeResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => IntakeConfig::default(),
    };
    let orchestrator = UploadOrchestrator::from_config(&config)?;

    let response = match (&args.input, &args.request) {
        (Some(path), _) => {
            let (bytes, content_type) = read_input(args, path)?;
            let file_name = simplify_file_name(path);
            if args.strict {
                strict_response(&orchestrator, &bytes, &file_name, &content_type)?
            } else {
                orchestrator.handle_bytes(&bytes, &file_name, &content_type)
            }
        }
        (None, Some(path)) => {
            let contents = fs::read_to_string(path).context(ReadingInputSnafu { path })?;
            let request = UploadRequest::from_json(&contents)?;
            if args.strict {
                let bytes = request.decode()?;
                strict_response(
                    &orchestrator,
                    &bytes,
                    &request.file_name,
                    request.content_type(),
                )?
            } else {
                orchestrator.handle_upload(&request)
            }
        }
        (None, None) => return MissingInputSnafu {}.fail(),
    };
    info!("{}", response.message);

    let pretty_js = serde_json::to_string_pretty(&response).context(SerializingRecordSnafu {})?;
    write_output(&args.out, &pretty_js)?;

    // The reference record, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let reference = read_reference(reference_p)?;
        debug!("reference: {:?}", reference);
        let pretty_js_reference =
            serde_json::to_string_pretty(&reference).context(SerializingRecordSnafu {})?;
        // Both sides go through a JSON value so that keys are ordered the same way.
        let record_js = serde_json::to_value(&response.data).context(SerializingRecordSnafu {})?;
        let pretty_js_record =
            serde_json::to_string_pretty(&record_js).context(SerializingRecordSnafu {})?;
        if pretty_js_reference != pretty_js_record {
            warn!("Found differences with the reference record");
            print_diff(pretty_js_reference.as_str(), pretty_js_record.as_str(), "\n");
            whatever!("Difference detected between the event record and the reference record")
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
