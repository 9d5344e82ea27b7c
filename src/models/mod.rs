pub mod fixture;
pub mod loaders;
pub mod result;

pub use fixture::{split_keywords, FixtureRow, FixtureSet, QuestionFixture};
pub use loaders::{load_fixture_file, parse_fixture_toml};
pub use result::{BatchRunSummary, Classification, PollOutcome, RunLabels, RunReport, TestResult};
