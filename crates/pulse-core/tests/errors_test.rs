use pulse_core::errors::StorageError;
use pulse_core::models::ReportStatus;
use pulse_core::{ErrorKind, PulseError};

#[test]
fn specific_reasons_map_to_taxonomy() {
    let cases = [
        (
            PulseError::AlreadyVoted {
                report_id: "r".into(),
                voter: "device:d".into(),
            },
            ErrorKind::Conflict,
        ),
        (PulseError::SelfVote { report_id: "r".into() }, ErrorKind::PermissionDenied),
        (
            PulseError::VoteWindowClosed { report_id: "r".into() },
            ErrorKind::FailedPrecondition,
        ),
        (
            PulseError::ReportTerminal {
                report_id: "r".into(),
                status: ReportStatus::Deleted,
            },
            ErrorKind::FailedPrecondition,
        ),
        (
            PulseError::DeleteCooldown { remaining_minutes: 12 },
            ErrorKind::PermissionDenied,
        ),
        (PulseError::not_found("report", "r"), ErrorKind::NotFound),
        (PulseError::invalid("bad"), ErrorKind::InvalidArgument),
        (
            PulseError::RateLimited {
                identity: "x".into(),
                retry_after_secs: 3,
            },
            ErrorKind::ResourceExhausted,
        ),
    ];
    for (err, kind) in cases {
        assert_eq!(err.kind(), kind, "{err}");
    }
}

#[test]
fn storage_errors_are_internal() {
    let err: PulseError = StorageError::SqliteError {
        message: "disk I/O error".into(),
    }
    .into();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.to_string().contains("disk I/O error"));
}

#[test]
fn cooldown_message_names_minutes() {
    let err = PulseError::DeleteCooldown { remaining_minutes: 42 };
    assert_eq!(
        err.to_string(),
        "please wait 42 minutes before deleting another report"
    );
}
