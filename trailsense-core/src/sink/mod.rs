//! Alert records and the append-only event sink.

mod record;
mod writer;

pub use record::AlertRecord;
pub use writer::EventSink;
