use std::env;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::NaiveDate;
use clap::Parser;
use scheduling_engine::config::SchedulingConfig;
use scheduling_engine::domain::engine::SchedulingEngine;
use scheduling_engine::infrastructure::pg_store::PgStore;
use scheduling_engine::request::RunRequest;
use scheduling_engine::telemetry::init_tracing;
use sqlx::postgres::PgPoolOptions;

/// Thin wrapper that makes the crate runnable end-to-end: wires a
/// Postgres `Store`, loads config, runs one `RunRequest`, and prints
/// the outcome. No routing, no middleware, no retry logic.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    start_date: NaiveDate,
    #[arg(long)]
    end_date: NaiveDate,
    #[arg(long)]
    period_tag: String,
    #[arg(long, default_value = "scheduling-engine")]
    created_by: String,
    #[arg(long, default_value = "")]
    description: String,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Args::parse();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to establish connection into Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("failed to run database migrations");

    let config = SchedulingConfig::load().expect("failed to load scheduling config");
    let store = Arc::new(PgStore::new(pool));
    let engine = SchedulingEngine::new(store, config);

    let request = RunRequest {
        start_date: args.start_date,
        end_date: args.end_date,
        sections_enabled: Vec::new(),
        priority_order: Default::default(),
        created_by: args.created_by,
        description: args.description,
        period_tag: args.period_tag,
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(request, cancel).await;

    match result.error_kind {
        Some(error_kind) => {
            tracing::error!(?error_kind, "scheduling run failed");
            eprintln!("run failed: {error_kind:?}");
            std::process::exit(1);
        }
        None => {
            println!("scenario created: {:?}", result.scenario_id);
            if result.is_incomplete() {
                println!(
                    "scenario incomplete: {} weekend role(s) could not be filled",
                    result.weekend_role_failures.len()
                );
            }
        }
    }
}
