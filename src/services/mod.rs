pub mod chat_surface;
pub mod classifier;
pub mod database_sink;
pub mod response_poller;
pub mod sink_router;
pub mod spreadsheet_sink;

pub use chat_surface::{ChatSurface, ChatSurfaceSettings};
pub use classifier::{classify, ClassificationOutcome, ResponseClassifier};
pub use database_sink::DatabaseSink;
pub use response_poller::{PollState, PollerSettings, ResponsePoller};
pub use sink_router::{ResultSink, SinkOutcome, SinkReport, SinkRouter};
pub use spreadsheet_sink::{generate_sheet_name, sheet_base_name, SpreadsheetSink};
