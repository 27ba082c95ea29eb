mod helpers;

use rasterq::application::ports::{JobRepository, RepositoryError};
use rasterq::domain::{Job, JobId, JobOutcome, JobPayload, JobStatus, JobUpdate, ProcessedFile};

use helpers::TestPostgres;

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_new_job_when_creating_and_retrieving_then_job_is_persisted() {
    let test_pg = TestPostgres::new().await;
    let payload = JobPayload::parse("https://example.com/gallery", 7).unwrap();
    let job = Job::new(JobId::new(), &payload, Some("me@example.com".to_string()));

    test_pg
        .job_repository
        .create(&job)
        .await
        .expect("Failed to create job");

    let retrieved = test_pg
        .job_repository
        .get(&job.job_id)
        .await
        .expect("Failed to retrieve job")
        .expect("Job not found");

    assert_eq!(retrieved.job_id, job.job_id);
    assert_eq!(retrieved.status, JobStatus::Queued);
    assert_eq!(retrieved.url.as_deref(), Some("https://example.com/gallery"));
    assert_eq!(retrieved.limit, Some(7));
    assert_eq!(retrieved.owner.as_deref(), Some("me@example.com"));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_existing_job_when_creating_again_then_duplicate_error() {
    let test_pg = TestPostgres::new().await;
    let payload = JobPayload::convert("a.png", "/in/a.png").unwrap();
    let job = Job::new(JobId::new(), &payload, None);
    test_pg.job_repository.create(&job).await.unwrap();

    let result = test_pg.job_repository.create(&job).await;

    assert!(matches!(result, Err(RepositoryError::DuplicateJob(_))));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_partial_updates_when_applied_then_fields_merge_and_timestamp_advances() {
    let test_pg = TestPostgres::new().await;
    let payload = JobPayload::parse("https://example.com", 5).unwrap();
    let job = Job::new(JobId::new(), &payload, None);
    test_pg.job_repository.create(&job).await.unwrap();

    let first = test_pg
        .job_repository
        .update(
            &job.job_id,
            JobUpdate::status(JobStatus::Processing).with_progress(25),
        )
        .await
        .unwrap()
        .unwrap();

    let mut finish = JobOutcome::Parsed {
        parsed_data: vec!["https://example.com/a.png".to_string()],
        processed_files: vec![
            ProcessedFile::new("parsed_1.png", "/out/parsed_1.png")
                .with_source_url("https://example.com/a.png"),
        ],
    }
    .into_update();
    finish.status = Some(JobStatus::Ready);
    finish.progress = Some(100);

    let second = test_pg
        .job_repository
        .update(&job.job_id, finish)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.status, JobStatus::Processing);
    assert_eq!(second.status, JobStatus::Ready);
    assert_eq!(second.progress, 100);
    assert_eq!(second.url, job.url);
    assert_eq!(second.processed_files.unwrap()[0].filename, "parsed_1.png");
    assert!(second.updated_at > first.updated_at);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_missing_job_when_updating_or_deleting_then_reports_absent() {
    let test_pg = TestPostgres::new().await;
    let missing = JobId::from_raw("missing");

    let updated = test_pg
        .job_repository
        .update(&missing, JobUpdate::progress(10))
        .await
        .unwrap();
    let deleted = test_pg.job_repository.delete(&missing).await.unwrap();

    assert!(updated.is_none());
    assert!(!deleted);
}
