pub mod autosave;
pub mod fetch;
pub mod ingest;
pub mod resolver;
pub mod session;

pub use autosave::{Autosave, FileTarget, SaveReport, SaveTarget};
pub use fetch::{FetchError, Fetcher, LocatorFetcher};
pub use ingest::{DropPayload, ingest};
pub use resolver::{BackgroundResolver, FetchOutcome, FetchStatus};
pub use session::{DocumentMutation, DocumentSession, SessionConfig, SessionEvent};
