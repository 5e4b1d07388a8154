pub mod config;
pub mod errors;
pub mod model;
pub mod partition;
pub mod paths;
pub mod time;

pub use config::{CandidateOrder, DatePolicy, StorageConfig};
pub use errors::{ErrorCode, PluvioError};
pub use model::{BaseKind, Candidate, CapacityReport, Resolution, StorageBase};
pub use partition::{DATA_DIR_NAME, DatePartition};
pub use paths::install_root;
pub use time::{DateClock, today};
