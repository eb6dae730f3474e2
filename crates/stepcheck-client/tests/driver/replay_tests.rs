//! Replaying scripts against the real validator.

use std::path::Path;

use stepcheck::ErrorCode;
use stepcheck_client::{DataSet, ScriptLoader, StepOutcome};

use crate::test_utilities::{driver_for, quick_script, spawn_validator};

#[tokio::test]
async fn test_in_order_script_all_succeed() {
    let (addr, validator) = spawn_validator(5).await;
    let driver = driver_for(addr, None);

    let summary = driver
        .run(&quick_script(&[(1, 10), (2, 10), (3, 10), (4, 10)]))
        .await;

    assert_eq!(summary.outcomes.len(), 4);
    assert_eq!(summary.succeeded(), 4);
    assert!(!summary.terminated());
    assert_eq!(validator.current_step(), 4);
}

#[tokio::test]
async fn test_mixed_script_reports_each_outcome() {
    let (addr, validator) = spawn_validator(5).await;
    let driver = driver_for(addr, None);

    let summary = driver
        .run(&quick_script(&[(1, 10), (2, 3), (2, 10), (5, 10), (5, 10)]))
        .await;

    assert_eq!(
        summary.outcomes,
        vec![
            StepOutcome::Succeeded { step_id: 1 },
            StepOutcome::Rejected {
                step_id: 2,
                error_code: ErrorCode::Timeout.as_i64(),
            },
            StepOutcome::Succeeded { step_id: 2 },
            StepOutcome::Rejected {
                step_id: 5,
                error_code: ErrorCode::OutOfOrder.as_i64(),
            },
            // The rejection moved the counter from 2 to 3, so 4 is next, not 5.
            StepOutcome::Rejected {
                step_id: 5,
                error_code: ErrorCode::OutOfOrder.as_i64(),
            },
        ]
    );
    assert_eq!(validator.current_step(), 4);
}

#[tokio::test]
async fn test_bundled_failure_data_against_validator() {
    let (addr, validator) = spawn_validator(5).await;
    let data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test_data");
    let mut script = ScriptLoader::from_path(DataSet::Failure.path_in(&data_dir)).unwrap();
    for step in &mut script.test_services {
        step.interval = 0.0;
    }

    let summary = driver_for(addr, None).run(&script).await;

    assert_eq!(summary.outcomes.len(), script.len());
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(validator.current_step(), 4);
}

#[tokio::test]
async fn test_unreachable_server_does_not_abort_run() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));

    let summary = driver_for(addr, None)
        .run(&quick_script(&[(1, 10), (2, 10)]))
        .await;

    assert_eq!(summary.outcomes.len(), 2);
    assert!(
        summary
            .outcomes
            .iter()
            .all(|o| matches!(o, StepOutcome::Failed { .. }))
    );
}
