//! Storage-location resolution: volume scanning, capacity gating and dated path provisioning.

pub mod events;
pub mod gate;
pub mod resolver;
pub mod scanner;

#[cfg(test)]
mod test_support;

pub use events::{EventSink, RecordingSink, Severity, StorageEvent, TracingSink, format_gb};
pub use gate::{Admission, CapacityGate};
pub use resolver::{LocationResolver, ResolvePhase, VolumeSurvey};
pub use scanner::{Candidates, VolumeScanner};
