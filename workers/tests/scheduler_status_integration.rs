// Scheduler registration, run-state tracking, hub relay and the status API

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::fixtures::*;
use rstest::rstest;
use serde_json::Value;
use server::database::{AccountType, Database};
use std::sync::Arc;
use tower::ServiceExt;
use workers::jobs::fleet_notifier;
use workers::{create_status_router, run_pass, JobRegistry, StatusState, WorkerContext, WorkerKind, WorkerScheduler};

async fn get_json(state: StatusState, uri: &str) -> (StatusCode, Value) {
    let response = create_status_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn all_disabled() -> server::config::Config {
    let mut config = test_config();
    config.workers.completed_mover.enabled = false;
    config.workers.fleet_notifier.enabled = false;
    config.workers.unpaid_remover.enabled = false;
    config.workers.oil_changes.enabled = false;
    config.workers.welcome_mailer.enabled = false;
    config.workers.confirmation_notifier.enabled = false;
    config
}

#[tokio::test]
async fn disabled_workers_are_registered_but_not_scheduled() {
    let ctx = TestContext::with(all_disabled(), RecordingMailer::new())
        .await
        .unwrap();
    let registry = JobRegistry::new();
    let mut scheduler = WorkerScheduler::new(ctx.context.clone(), registry.clone())
        .await
        .unwrap();

    assert_eq!(scheduler.start().await.unwrap(), 0);

    let jobs = registry.snapshot().await;
    assert_eq!(jobs.len(), WorkerKind::ALL.len());
    assert!(jobs.iter().all(|j| !j.enabled && j.runs == 0));

    scheduler.shutdown().await.unwrap();
}

#[rstest]
#[case("*/5 * * * *")]
#[case("0 61 * * * *")]
#[case("every minute")]
#[tokio::test]
async fn invalid_cron_skips_only_that_worker(#[case] schedule: &str) {
    let mut config = all_disabled();
    config.workers.oil_changes.enabled = true;
    config.workers.oil_changes.schedule = schedule.to_string();
    config.workers.welcome_mailer.enabled = true;
    config.workers.welcome_mailer.schedule = "0 0 3 * * *".to_string();

    let ctx = TestContext::with(config, RecordingMailer::new()).await.unwrap();
    let registry = JobRegistry::new();
    let mut scheduler = WorkerScheduler::new(ctx.context.clone(), registry.clone())
        .await
        .unwrap();

    assert_eq!(scheduler.start().await.unwrap(), 1);
    scheduler.shutdown().await.unwrap();
}

#[tokio::test]
async fn run_pass_records_result_and_skips_overlap() {
    let ctx = TestContext::new().await.unwrap();
    ctx.seed_customer(AccountType::Customer).await.unwrap();

    let registry = JobRegistry::new();
    registry
        .register(WorkerKind::WelcomeMailer, &ctx.context.config.workers.welcome_mailer)
        .await;

    assert_eq!(
        run_pass(WorkerKind::WelcomeMailer, &ctx.context, &registry).await,
        Some(1)
    );

    let status = &registry.snapshot().await[0];
    assert_eq!(status.runs, 1);
    assert_eq!(status.last_processed, Some(1));
    assert!(status.last_error.is_none());

    // A pass still in flight blocks the next tick
    assert!(registry.try_start(WorkerKind::WelcomeMailer).await);
    assert_eq!(
        run_pass(WorkerKind::WelcomeMailer, &ctx.context, &registry).await,
        None
    );
}

#[tokio::test]
async fn notices_are_relayed_to_the_hub_with_the_office_key() {
    let relay = MockRelayServer::start().await;

    let mut config = test_config();
    config.realtime.hub_url = format!("{}/", relay.base_url);
    let database = Arc::new(Database::in_memory().await.unwrap());
    let context = WorkerContext::from_config(Arc::new(config), database.clone()).unwrap();

    let customer = sample_customer(AccountType::Fleet);
    database.insert_customer(&customer).await.unwrap();
    database
        .insert_schedule(&sample_schedule(&customer))
        .await
        .unwrap();

    relay.expect_relay(&customer.id, OFFICE_KEY, 1).await;

    assert_eq!(fleet_notifier::run_once(&context).await.unwrap(), 1);
    // Expectations are verified when the mock server drops
}

#[tokio::test]
async fn rejected_relay_does_not_block_notices() {
    let relay = MockRelayServer::start().await;
    relay.reject_all().await;

    let mut config = test_config();
    config.realtime.hub_url = relay.base_url.clone();
    let database = Arc::new(Database::in_memory().await.unwrap());
    let context = WorkerContext::from_config(Arc::new(config), database.clone()).unwrap();

    let customer = sample_customer(AccountType::Fleet);
    database.insert_customer(&customer).await.unwrap();
    let schedule = sample_schedule(&customer);
    database.insert_schedule(&schedule).await.unwrap();

    assert_eq!(fleet_notifier::run_once(&context).await.unwrap(), 1);
    let stored = database.get_schedule(&schedule.id).await.unwrap().unwrap();
    assert!(stored.fleet_notified);
}

#[tokio::test]
async fn status_api_reports_history_customers_and_workers() {
    let ctx = TestContext::new().await.unwrap();
    let customer = ctx.seed_customer(AccountType::Customer).await.unwrap();
    ctx.seed_schedule(AccountType::Customer, completed)
        .await
        .unwrap();
    workers::jobs::completed_mover::run_once(&ctx.context)
        .await
        .unwrap();
    workers::jobs::welcome_mailer::run_once(&ctx.context)
        .await
        .unwrap();

    let registry = JobRegistry::new();
    registry
        .register(WorkerKind::CompletedMover, &ctx.context.config.workers.completed_mover)
        .await;
    let state = StatusState {
        context: ctx.context.clone(),
        registry,
    };

    let response = create_status_router(state.clone())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, moved) = get_json(state.clone(), "/api/moved-schedules").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["data"].as_array().unwrap().len(), 1);
    assert_eq!(moved["data"][0]["serviceMilage"], 48_250);

    let (_, customers) = get_json(state.clone(), "/api/customers").await;
    let customers = customers["data"].as_array().unwrap();
    assert_eq!(customers.len(), 2);
    assert!(customers.iter().all(|c| c.get("passwordHash").is_none()));
    assert!(customers.iter().any(|c| c["id"] == customer.id.as_str()));

    let (_, notifications) = get_json(state.clone(), "/api/notifications").await;
    assert_eq!(notifications["data"].as_array().unwrap().len(), 2);

    let (_, jobs) = get_json(state, "/api/workers").await;
    assert_eq!(jobs["data"][0]["name"], "completed_mover");
    assert_eq!(jobs["data"][0]["enabled"], true);
}
