use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures::future::join_all;
use ulid::Ulid;

use roombook::engine::{Engine, EngineError};
use roombook::model::{HOUR_MS, Ms, ReservationRequest};

const HOUR: Ms = HOUR_MS;

fn base() -> Ms {
    // A week out, so nothing trips the past-reservation rule mid-run.
    chrono::Utc::now().timestamp_millis() + 7 * 24 * HOUR
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        percentile(latencies, 100.0).as_secs_f64() * 1000.0,
    );
}

async fn setup(engine: &Engine, n: usize) -> Vec<Ulid> {
    let mut rooms = Vec::with_capacity(n);
    for i in 0..n {
        match engine.create_room(&format!("bench-room-{i}")).await {
            Ok(room) => rooms.push(room.id),
            Err(e) => eprintln!("room setup failed: {e}"),
        }
    }
    println!("  created {} rooms", rooms.len());
    rooms
}

async fn phase1_sequential(engine: &Engine, room: Ulid) {
    let n = 5000;
    let base = base();
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();

    for i in 0..n {
        let s = base + (i as Ms) * HOUR;
        let req = ReservationRequest::from_span(room, s, s + HOUR);
        let t = Instant::now();
        if let Err(e) = engine.create_reservation(&req).await {
            eprintln!("unexpected rejection: {e}");
        }
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} reservations in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("create latency", &mut latencies);
}

async fn phase2_concurrent_rooms(engine: Arc<Engine>, rooms: &[Ulid]) {
    let n_per_task = 500;
    let base = base();
    let start = Instant::now();

    let tasks = rooms.iter().map(|&room| {
        let engine = engine.clone();
        tokio::spawn(async move {
            for j in 0..n_per_task {
                let s = base + (j as Ms) * HOUR;
                let _ = engine
                    .create_reservation(&ReservationRequest::from_span(room, s, s + HOUR))
                    .await;
            }
        })
    });
    join_all(tasks).await;

    let elapsed = start.elapsed();
    let total = rooms.len() * n_per_task;
    let ops = total as f64 / elapsed.as_secs_f64();
    println!(
        "  {} rooms x {n_per_task} reservations = {total} total in {:.2}s = {ops:.0} ops/sec",
        rooms.len(),
        elapsed.as_secs_f64()
    );
}

/// Many tasks race for the same slots on one room. Exactly one caller may
/// win each slot.
async fn phase3_contended_slot(engine: Arc<Engine>, room: Ulid) {
    let n_tasks = 64;
    let n_slots = 200;
    let base = base();
    let won = Arc::new(AtomicUsize::new(0));
    let lost = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let tasks = (0..n_tasks).map(|_| {
        let engine = engine.clone();
        let won = won.clone();
        let lost = lost.clone();
        tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(n_slots);
            for slot in 0..n_slots {
                let s = base + (slot as Ms) * HOUR;
                let t = Instant::now();
                match engine
                    .create_reservation(&ReservationRequest::from_span(room, s, s + HOUR))
                    .await
                {
                    Ok(_) => won.fetch_add(1, Ordering::Relaxed),
                    Err(EngineError::RoomAlreadyReserved(_)) => lost.fetch_add(1, Ordering::Relaxed),
                    Err(e) => {
                        eprintln!("unexpected rejection: {e}");
                        0
                    }
                };
                latencies.push(t.elapsed());
            }
            latencies
        })
    });

    let mut all_latencies = Vec::new();
    for latencies in join_all(tasks).await.into_iter().flatten() {
        all_latencies.extend(latencies);
    }

    let won = won.load(Ordering::Relaxed);
    let lost = lost.load(Ordering::Relaxed);
    println!(
        "  {n_tasks} tasks x {n_slots} slots: {won} won, {lost} rejected in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    if won != n_slots {
        println!("  !! expected exactly {n_slots} winners, got {won}");
    }
    print_latency("contended create latency", &mut all_latencies);
}

async fn phase4_read_under_load(engine: Arc<Engine>, room: Ulid) {
    let base = base();
    for i in 0..200 {
        let s = base + (i as Ms) * HOUR;
        let _ = engine
            .create_reservation(&ReservationRequest::from_span(room, s, s + HOUR))
            .await;
    }

    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let engine = engine.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                let mut i: Ms = 0;
                while !stop.load(Ordering::Relaxed) {
                    let s = base + (10_000 + w * 100_000 + i) * HOUR;
                    let created = engine
                        .create_reservation(&ReservationRequest::from_span(room, s, s + HOUR))
                        .await;
                    if let Ok(r) = created {
                        let _ = engine.cancel_reservation(r.id).await;
                    }
                    i += 1;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let n_readers = 8;
    let reads_per_reader = 500;
    let room_key = room.to_string();
    let readers = (0..n_readers).map(|_| {
        let engine = engine.clone();
        let room_key = room_key.clone();
        tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(reads_per_reader);
            for _ in 0..reads_per_reader {
                let t = Instant::now();
                let listed = engine.list_reservations(&room_key).await;
                std::hint::black_box(listed);
                latencies.push(t.elapsed());
            }
            latencies
        })
    });

    let mut all_latencies = Vec::new();
    for latencies in join_all(readers).await.into_iter().flatten() {
        all_latencies.extend(latencies);
    }
    stop.store(true, Ordering::Relaxed);
    join_all(writers).await;

    print_latency("list latency", &mut all_latencies);
}

#[tokio::main]
async fn main() {
    println!("=== roombook stress benchmark ===\n");

    let engine = Arc::new(Engine::default());

    println!("[setup]");
    let rooms = setup(&engine, 12).await;
    let [solo, contended, read, rest @ ..] = rooms.as_slice() else {
        eprintln!("not enough rooms");
        return;
    };

    println!("\n[phase 1] sequential create throughput");
    phase1_sequential(&engine, *solo).await;

    println!("\n[phase 2] concurrent creates across rooms");
    phase2_concurrent_rooms(engine.clone(), rest).await;

    println!("\n[phase 3] contended creates on one room");
    phase3_contended_slot(engine.clone(), *contended).await;

    println!("\n[phase 4] list latency under write load");
    phase4_read_under_load(engine.clone(), *read).await;

    println!(
        "\n=== done: {} rooms, {} live reservations ===",
        engine.room_count(),
        engine.reservation_count()
    );
}
