pub mod toml_loader;

pub use toml_loader::{load_fixture_file, parse_fixture_toml};
