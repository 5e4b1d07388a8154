use std::{path::PathBuf, sync::Arc};

use pluvio_core::{
    Candidate, CapacityReport, DatePartition, ErrorCode, PluvioError, Resolution, StorageBase,
    StorageConfig,
};
use pluvio_platform::VolumeOps;

use crate::{
    events::{EventSink, StorageEvent, TracingSink},
    gate::{Admission, CapacityGate},
    scanner::VolumeScanner,
};

/// Steps of a single resolution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvePhase {
    Scanning,
    Gating,
    BaseChosen,
    Provisioning,
    Resolved,
    Failed,
}

impl ResolvePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolvePhase::Scanning => "scanning",
            ResolvePhase::Gating => "gating",
            ResolvePhase::BaseChosen => "base_chosen",
            ResolvePhase::Provisioning => "provisioning",
            ResolvePhase::Resolved => "resolved",
            ResolvePhase::Failed => "failed",
        }
    }
}

/// A mount-root entry together with its free space, as reported by [`LocationResolver::survey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSurvey {
    pub candidate: Candidate,
    pub capacity: Option<CapacityReport>,
}

/// Picks the storage base for a date and provisions its dated directory.
pub struct LocationResolver {
    config: StorageConfig,
    ops: Arc<dyn VolumeOps>,
    sink: Arc<dyn EventSink>,
}

impl LocationResolver {
    /// Creates a resolver that reports decisions through `tracing`.
    pub fn new(config: StorageConfig, ops: Arc<dyn VolumeOps>) -> Result<Self, PluvioError> {
        config.validate()?;
        Ok(Self {
            config,
            ops,
            sink: Arc::new(TracingSink),
        })
    }

    /// Replaces the event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the directory to write `date`'s data into, creating it if needed.
    pub fn resolve_data_path(&self, date: &str) -> Result<PathBuf, PluvioError> {
        self.resolve(date).map(|resolution| resolution.path)
    }

    /// Like [`resolve_data_path`](Self::resolve_data_path), also reporting the chosen base.
    pub fn resolve(&self, date: &str) -> Result<Resolution, PluvioError> {
        let partition = match DatePartition::parse(date, self.config.date_policy) {
            Ok(partition) => partition,
            Err(err) => {
                self.phase(ResolvePhase::Failed);
                return Err(err);
            }
        };

        let base = self.choose_base();
        let path = base.path().join(partition.relative_path());

        self.phase(ResolvePhase::Provisioning);
        if let Err(err) = self.ops.create_dir_all(&path) {
            self.sink.emit(StorageEvent::ProvisionFailed {
                path: path.clone(),
                reason: err.to_string(),
            });
            self.phase(ResolvePhase::Failed);
            return Err(PluvioError {
                code: ErrorCode::ProvisionFailed,
                message: format!("create storage path {}", path.display()),
                detail: Some(err.to_string()),
            });
        }

        self.sink
            .emit(StorageEvent::PathProvisioned { path: path.clone() });
        self.phase(ResolvePhase::Resolved);

        Ok(Resolution {
            base,
            partition,
            path,
        })
    }

    /// Selects the first mounted, writable, admitted volume, or the backup location.
    pub fn choose_base(&self) -> StorageBase {
        self.phase(ResolvePhase::Scanning);

        let scanner = VolumeScanner::new(
            self.ops.as_ref(),
            self.sink.as_ref(),
            self.config.candidate_order,
        );
        let gate = CapacityGate::new(self.ops.as_ref(), self.sink.as_ref());

        for candidate in scanner.scan(&self.config.mount_root) {
            if !candidate.is_usable() {
                continue;
            }

            self.phase(ResolvePhase::Gating);
            let admission = gate.check(&candidate.path, self.config.min_free_mb);
            if let Admission::Admitted(report) = admission {
                self.sink.emit(StorageEvent::VolumeSelected {
                    path: candidate.path.clone(),
                    free_mb: report.free_mb(),
                    free_gb: report.free_gb(),
                });
                self.phase(ResolvePhase::BaseChosen);
                return StorageBase::Volume(candidate.path);
            }
        }

        self.sink.emit(StorageEvent::FallbackToBackup {
            backup_path: self.config.backup_path.clone(),
        });
        self.phase(ResolvePhase::BaseChosen);
        StorageBase::Backup(self.config.backup_path.clone())
    }

    /// Probes every mount-root entry without selecting or creating anything.
    pub fn survey(&self) -> Vec<VolumeSurvey> {
        let scanner = VolumeScanner::new(
            self.ops.as_ref(),
            self.sink.as_ref(),
            self.config.candidate_order,
        );
        let gate = CapacityGate::new(self.ops.as_ref(), self.sink.as_ref());

        scanner
            .scan(&self.config.mount_root)
            .map(|candidate| {
                let capacity = if candidate.mounted {
                    match gate.check(&candidate.path, self.config.min_free_mb) {
                        Admission::Admitted(report) | Admission::Insufficient(report) => {
                            Some(report)
                        }
                        Admission::Unavailable => None,
                    }
                } else {
                    None
                };
                VolumeSurvey {
                    candidate,
                    capacity,
                }
            })
            .collect()
    }

    fn phase(&self, phase: ResolvePhase) {
        self.sink.emit(StorageEvent::Phase { phase });
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::{Path, PathBuf},
        sync::Arc,
    };

    use pluvio_core::{
        BaseKind, CandidateOrder, DatePolicy, ErrorCode, StorageBase, StorageConfig,
    };

    use super::{LocationResolver, ResolvePhase};
    use crate::{
        events::{RecordingSink, Severity, StorageEvent},
        test_support::FakeVolumes,
    };

    fn config() -> StorageConfig {
        StorageConfig {
            mount_root: PathBuf::from("/media/pi"),
            min_free_mb: 50,
            backup_path: PathBuf::from("/opt/pluvio"),
            candidate_order: CandidateOrder::ByName,
            date_policy: DatePolicy::Structural,
        }
    }

    fn resolver(ops: Arc<FakeVolumes>) -> (LocationResolver, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let resolver = LocationResolver::new(config(), ops)
            .expect("config should validate")
            .with_sink(sink.clone());
        (resolver, sink)
    }

    fn phases(sink: &RecordingSink) -> Vec<ResolvePhase> {
        sink.events()
            .into_iter()
            .filter_map(|event| match event {
                StorageEvent::Phase { phase } => Some(phase),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn admitted_usb_volume_hosts_dated_path() {
        let ops = Arc::new(FakeVolumes::new().volume("/media/pi/usb1", true, true, Some(200)));
        let (resolver, sink) = resolver(ops.clone());

        let resolution = resolver.resolve("2024-03-07").expect("resolve should succeed");

        assert_eq!(
            resolution.base,
            StorageBase::Volume(PathBuf::from("/media/pi/usb1"))
        );
        assert_eq!(
            resolution.path,
            PathBuf::from("/media/pi/usb1/DTA/2024/03/07")
        );
        assert_eq!(ops.created(), vec![resolution.path.clone()]);
        assert!(sink.events().iter().any(|event| matches!(
            event,
            StorageEvent::VolumeSelected { free_mb: 200, .. }
        )));
        assert_eq!(
            phases(&sink),
            vec![
                ResolvePhase::Scanning,
                ResolvePhase::Gating,
                ResolvePhase::BaseChosen,
                ResolvePhase::Provisioning,
                ResolvePhase::Resolved,
            ]
        );
    }

    #[test]
    fn low_space_volume_falls_back_with_warning() {
        let ops = Arc::new(FakeVolumes::new().volume("/media/pi/usb1", true, true, Some(10)));
        let (resolver, sink) = resolver(ops);

        let resolution = resolver.resolve("2024-03-07").expect("resolve should succeed");

        assert_eq!(resolution.base.kind(), BaseKind::Backup);
        assert_eq!(resolution.path, PathBuf::from("/opt/pluvio/DTA/2024/03/07"));
        let warnings = sink.at_least(Severity::Warning);
        assert!(warnings.iter().any(|event| matches!(
            event,
            StorageEvent::InsufficientSpace { free_mb: 10, .. }
        )));
        assert!(
            warnings
                .iter()
                .any(|event| matches!(event, StorageEvent::FallbackToBackup { .. }))
        );
    }

    #[test]
    fn absent_mount_root_uses_backup_without_error() {
        let (resolver, sink) = resolver(Arc::new(FakeVolumes::unlistable()));

        let path = resolver
            .resolve_data_path("2024-03-07")
            .expect("missing mount root is not fatal");

        assert!(path.starts_with("/opt/pluvio"));
        assert!(
            sink.events()
                .iter()
                .any(|event| matches!(event, StorageEvent::MountRootUnavailable { .. }))
        );
    }

    #[test]
    /// Verifies no mix of non-admissible candidates ever displaces the backup.
    fn only_non_admissible_candidates_resolve_to_backup() {
        let ops = Arc::new(
            FakeVolumes::new()
                .volume("/media/pi/a-unmounted", false, true, Some(500))
                .volume("/media/pi/b-readonly", true, false, Some(500))
                .volume("/media/pi/c-small", true, true, Some(49))
                .volume("/media/pi/d-vanished", true, true, None)
                .stray_entry("/media/pi/e-stray"),
        );
        let (resolver, sink) = resolver(ops);

        assert_eq!(
            resolver.choose_base(),
            StorageBase::Backup(PathBuf::from("/opt/pluvio"))
        );
        assert!(
            sink.at_least(Severity::Error)
                .iter()
                .any(|event| matches!(event, StorageEvent::CapacityQueryFailed { .. }))
        );
    }

    #[test]
    fn first_admissible_candidate_wins_over_later_ones() {
        let ops = Arc::new(
            FakeVolumes::new()
                .volume("/media/pi/usb2", true, true, Some(900))
                .volume("/media/pi/usb0", true, true, Some(20))
                .volume("/media/pi/usb1", true, true, Some(60)),
        );
        let (resolver, _sink) = resolver(ops);

        assert_eq!(
            resolver.choose_base(),
            StorageBase::Volume(PathBuf::from("/media/pi/usb1"))
        );
    }

    #[test]
    fn listing_order_is_honoured_when_configured() {
        let ops = Arc::new(
            FakeVolumes::new()
                .volume("/media/pi/usb2", true, true, Some(900))
                .volume("/media/pi/usb1", true, true, Some(60)),
        );
        let resolver = LocationResolver::new(
            StorageConfig {
                candidate_order: CandidateOrder::Listing,
                ..config()
            },
            ops,
        )
        .expect("config should validate")
        .with_sink(Arc::new(RecordingSink::new()));

        assert_eq!(resolver.choose_base().path(), Path::new("/media/pi/usb2"));
    }

    #[test]
    fn exact_threshold_is_admitted() {
        let ops = Arc::new(FakeVolumes::new().volume("/media/pi/usb1", true, true, Some(50)));
        let (resolver, _sink) = resolver(ops);

        assert_eq!(resolver.choose_base().kind(), BaseKind::Volume);
    }

    #[test]
    fn malformed_date_fails_before_any_creation() {
        let ops = Arc::new(FakeVolumes::new().volume("/media/pi/usb1", true, true, Some(200)));
        let (resolver, sink) = resolver(ops.clone());

        for input in ["2024/03/07", "bad-date"] {
            let err = resolver
                .resolve_data_path(input)
                .expect_err("malformed date should fail");
            assert_eq!(err.code, ErrorCode::InvalidDate);
        }

        assert!(ops.created().is_empty());
        assert_eq!(phases(&sink), vec![ResolvePhase::Failed, ResolvePhase::Failed]);
    }

    #[test]
    fn calendar_policy_rejects_impossible_day() {
        let ops = Arc::new(FakeVolumes::new());
        let resolver = LocationResolver::new(
            StorageConfig {
                date_policy: DatePolicy::Calendar,
                ..config()
            },
            ops.clone(),
        )
        .expect("config should validate")
        .with_sink(Arc::new(RecordingSink::new()));

        let err = resolver
            .resolve_data_path("2023-02-29")
            .expect_err("not a calendar day");
        assert_eq!(err.code, ErrorCode::InvalidDate);
        assert!(ops.created().is_empty());
    }

    #[test]
    fn creation_failure_is_fatal_and_logged() {
        let ops = Arc::new(
            FakeVolumes::new()
                .volume("/media/pi/usb1", true, true, Some(200))
                .failing_create(),
        );
        let (resolver, sink) = resolver(ops);

        let err = resolver
            .resolve_data_path("2024-03-07")
            .expect_err("creation failure should surface");

        assert_eq!(err.code, ErrorCode::ProvisionFailed);
        assert!(err.message.contains("/media/pi/usb1/DTA/2024/03/07"));
        assert!(
            sink.at_least(Severity::Error)
                .iter()
                .any(|event| matches!(event, StorageEvent::ProvisionFailed { .. }))
        );
        assert_eq!(phases(&sink).last(), Some(&ResolvePhase::Failed));
    }

    #[test]
    fn repeated_resolution_returns_identical_path() {
        let ops = Arc::new(FakeVolumes::new().volume("/media/pi/usb1", true, true, Some(200)));
        let (resolver, _sink) = resolver(ops);

        let first = resolver.resolve_data_path("2024-03-07").expect("first call");
        let second = resolver.resolve_data_path("2024-03-07").expect("second call");
        assert_eq!(first, second);
    }

    #[test]
    fn survey_reports_capacity_for_mounted_entries_only() {
        let ops = Arc::new(
            FakeVolumes::new()
                .volume("/media/pi/usb1", true, true, Some(200))
                .volume("/media/pi/usb2", false, true, Some(200)),
        );
        let (resolver, _sink) = resolver(ops.clone());

        let survey = resolver.survey();
        assert_eq!(survey.len(), 2);
        assert_eq!(
            survey[0].capacity.map(|report| report.free_mb()),
            Some(200)
        );
        assert_eq!(survey[1].capacity, None);
        assert!(ops.created().is_empty());
    }

    #[test]
    fn survey_logs_failed_capacity_query_as_error() {
        let ops = Arc::new(FakeVolumes::new().volume("/media/pi/usb1", true, true, None));
        let (resolver, sink) = resolver(ops);

        let survey = resolver.survey();

        assert_eq!(survey.len(), 1);
        assert!(survey[0].candidate.mounted);
        assert_eq!(survey[0].capacity, None);
        assert!(matches!(
            sink.at_least(Severity::Error).as_slice(),
            [StorageEvent::CapacityQueryFailed { path, .. }]
                if path.as_path() == Path::new("/media/pi/usb1")
        ));
    }

    #[test]
    fn selected_volume_reports_free_gigabytes_to_two_decimals() {
        // 1.0093 GiB free.
        let ops = Arc::new(FakeVolumes::new().volume_bytes("/media/pi/usb1", 1_083_741_824));
        let (resolver, sink) = resolver(ops);

        assert_eq!(resolver.choose_base().kind(), BaseKind::Volume);

        let selected: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|event| match event {
                StorageEvent::VolumeSelected {
                    free_mb, free_gb, ..
                } => Some((free_mb, free_gb)),
                _ => None,
            })
            .collect();
        assert_eq!(selected, vec![(1033, 1.01)]);
    }

    #[test]
    fn relative_backup_path_is_rejected_at_construction() {
        let result = LocationResolver::new(
            StorageConfig {
                backup_path: PathBuf::from("relative"),
                ..config()
            },
            Arc::new(FakeVolumes::new()),
        );
        assert!(matches!(result, Err(err) if err.code == ErrorCode::InvalidConfig));
    }
}
