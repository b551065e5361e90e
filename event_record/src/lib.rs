/*!
Canonical record for crowd events, and the helpers to build one from loosely structured sources.

Every uploaded event document (spreadsheet, report) is turned into a [CanonicalEventRecord].
This crate only deals with the data model: the readers for each document format live in
the `eventintake` program.

See the [manual] for the accepted column names and layouts.
*/

mod alias;
pub mod builder;
mod datetime;
pub mod manual;
mod record;
pub mod sample;
mod value;

pub use crate::alias::*;
pub use crate::datetime::{
    excel_serial_to_datetime, format_naive, parse_datetime, parse_datetime_str,
};
pub use crate::record::*;
pub use crate::sample::{sample_event, SAMPLE_TOTAL_GATE_CAPACITY};
pub use crate::value::*;
