pub mod result_store_client;
pub mod sheets_client;

pub use result_store_client::{ResultStoreClient, StoredResultPayload};
pub use sheets_client::SheetsClient;
