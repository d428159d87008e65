//! Benchmark tests for critical operations
//!
//! Run with: cargo test --release -- --nocapture bench

use std::sync::Arc;
use std::time::Instant;

use redb::Database;
use serde_json::json;
use tempfile::NamedTempFile;

use appbuilder::database::init_db;
use appbuilder::layout::{ComponentUpdate, EditorSession, LayoutDocument, Point, Position, WidgetType};
use appbuilder::model::{CreateAppRequest, ListRecordsParams, UpdateAppRequest, User};
use appbuilder::store::{apps, records, users};

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(),
{
    let start = Instant::now();

    for _ in 0..iterations {
        f();
    }

    let duration = start.elapsed();
    let avg_ms = duration.as_millis() as f64 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.3}ms", avg_ms);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

/// A database with one user owning one app
fn fixture() -> (Database, NamedTempFile, User, String) {
    let temp_db = NamedTempFile::new().unwrap();
    let db = init_db(temp_db.path().to_str().unwrap()).unwrap();
    // hashing is not what is measured here
    let user = users::create_user(&db, "bench@example.com", "not-a-hash".to_string(), "Bench").unwrap();
    let app = apps::create_app(
        &db,
        &user.id,
        CreateAppRequest {
            name: "Bench".to_string(),
            ..CreateAppRequest::default()
        },
    )
    .unwrap();
    (db, temp_db, user, app.id)
}

#[test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
fn bench_create_records() {
    println!("\n=== Benchmark: Create Records ===\n");

    let (db, _temp_db, user, app_id) = fixture();

    benchmark("Create record", 1000, || {
        let _ = records::create_record(&db, &app_id, &user, "entries", json!({ "n": 1 }));
    });
}

#[test]
#[ignore]
fn bench_list_records() {
    println!("\n=== Benchmark: List Records ===\n");

    let (db, _temp_db, user, app_id) = fixture();

    println!("  Preparing: Creating 1000 records in 10 collections...");
    for i in 0..1000 {
        let collection = format!("collection-{}", i % 10);
        records::create_record(&db, &app_id, &user, &collection, json!({ "n": i })).unwrap();
    }
    println!("  Done!\n");

    let filtered = ListRecordsParams {
        collection: Some("collection-3".to_string()),
        page: Some(1),
        limit: Some(10),
    };
    benchmark("List one collection", 1000, || {
        let _ = records::list_records(&db, &app_id, Some(&user.id), &filtered);
    });

    let all = ListRecordsParams {
        collection: None,
        page: Some(5),
        limit: Some(10),
    };
    benchmark("List every collection", 1000, || {
        let _ = records::list_records(&db, &app_id, Some(&user.id), &all);
    });
}

#[test]
#[ignore]
fn bench_save_layout() {
    println!("\n=== Benchmark: Save Layout ===\n");

    let (db, _temp_db, user, app_id) = fixture();

    for &size in &[10usize, 100, 500] {
        let mut document = LayoutDocument::default();
        for i in 0..size {
            let y = u32::try_from(i).unwrap() * 120;
            document.add_component(appbuilder::layout::Component::new(
                format!("text-{i}"),
                WidgetType::Text,
                Position::new(0, y, 200, 100),
            ));
        }
        let layout = serde_json::to_value(&document).unwrap();

        benchmark(&format!("Save layout with {size} components"), 200, || {
            let update = UpdateAppRequest {
                layout: Some(layout.clone()),
                ..UpdateAppRequest::default()
            };
            let _ = apps::update_app(&db, &app_id, &user.id, update);
        });
    }
}

#[test]
#[ignore]
fn bench_editor_gestures() {
    println!("\n=== Benchmark: Editor Gestures ===\n");

    let mut session = EditorSession::new(LayoutDocument::default());
    for i in 0..200u32 {
        session.drop_widget(WidgetType::Button, Point::new(f64::from(i % 10) * 220.0, f64::from(i / 10) * 120.0));
    }
    let target = session.drop_widget(WidgetType::Chart, Point::new(0.0, 0.0)).unwrap();

    let mut step = 0.0;
    benchmark("Drag across 200 components", 10_000, || {
        session.pointer_down(&target, Point::new(0.0, 0.0));
        step += 1.0;
        session.pointer_move(Point::new(step % 400.0, step % 300.0));
        session.pointer_up();
    });

    benchmark("Move by update", 10_000, || {
        let _ = session.update_component(&target, ComponentUpdate::position(Position::new(40, 40, 200, 100)));
    });
}

#[tokio::test]
#[ignore]
async fn bench_concurrent_record_writes() {
    println!("\n=== Benchmark: Concurrent Record Writes ===\n");

    let (db, _temp_db, user, app_id) = fixture();
    let db = Arc::new(db);
    let user = Arc::new(user);

    let num_tasks = 100;
    let ops_per_task = 10;

    println!("  Running {} concurrent tasks with {} ops each...", num_tasks, ops_per_task);

    let start = Instant::now();

    let mut handles = vec![];

    for task_id in 0..num_tasks {
        let db = db.clone();
        let user = user.clone();
        let app_id = app_id.clone();

        let handle = tokio::task::spawn_blocking(move || {
            for op_id in 0..ops_per_task {
                let collection = format!("task-{}", task_id);
                let _ = records::create_record(&db, &app_id, &user, &collection, json!({ "op": op_id }));
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let duration = start.elapsed();
    let total_ops = num_tasks * ops_per_task;
    let ops_per_sec = total_ops as f64 / duration.as_secs_f64();

    println!("  Total operations: {}", total_ops);
    println!("  Total time: {:?}", duration);
    println!("  Throughput: {:.0} ops/sec\n", ops_per_sec);
}

#[test]
fn bench_summary() {
    println!("\n{}", "=".repeat(60));
    println!("Benchmark Test Suite");
    println!("{}", "=".repeat(60));
    println!("\nTo run benchmarks, use:");
    println!("  cargo test --release bench -- --ignored --nocapture");
    println!("\nAvailable benchmarks:");
    println!("  • bench_create_records           - record insert with index upkeep");
    println!("  • bench_list_records             - paging with and without a collection");
    println!("  • bench_save_layout              - whole-layout overwrite by size");
    println!("  • bench_editor_gestures          - drag arithmetic in a busy document");
    println!("  • bench_concurrent_record_writes - serialized writers under contention");
    println!("\n{}\n", "=".repeat(60));
}
