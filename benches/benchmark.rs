//! Session server benchmark suite.
//!
//! Measures the hot paths that run inside the session critical section:
//! outcome evaluation over board snapshots and the wire codec.

use criterion::{criterion_group, criterion_main, Criterion};
use threerow::game::{evaluate_outcome, Board, Seat, SessionState};
use threerow::server::message::{self, ServerMessage};

fn bench_rules(c: &mut Criterion) {
    let empty = Board::new();
    let drawn = Board::from_symbols(["X", "O", "X", "X", "O", "O", "O", "X", "X"]).unwrap();
    let mut won = Board::new();
    for cell in [0, 1, 2] {
        won.mark(cell, Seat::First);
    }

    let mut group = c.benchmark_group("rules");
    group.bench_function("evaluate_empty", |b| b.iter(|| evaluate_outcome(&empty)));
    group.bench_function("evaluate_draw", |b| b.iter(|| evaluate_outcome(&drawn)));
    group.bench_function("evaluate_win", |b| b.iter(|| evaluate_outcome(&won)));

    group.bench_function("full_game", |b| {
        b.iter(|| {
            let mut state = SessionState::new();
            state.begin_game();
            for (seat, cell) in [
                (Seat::First, 0),
                (Seat::Second, 3),
                (Seat::First, 1),
                (Seat::Second, 4),
                (Seat::First, 2),
            ] {
                state.apply_move(seat, cell, true).unwrap();
            }
            state
        });
    });
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let board = Board::from_symbols(["X", "O", "X", " ", "O", " ", " ", " ", " "]).unwrap();
    let update = ServerMessage::update(&board, Seat::First);

    let mut group = c.benchmark_group("codec");
    group.bench_function("encode_update", |b| {
        b.iter(|| message::encode(&update).unwrap())
    });
    group.bench_function("decode_move", |b| {
        b.iter(|| message::decode(r#"{"type":"move","data":4}"#).unwrap())
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .significance_level(0.05)
        .noise_threshold(0.05);
    targets = bench_rules, bench_codec
);
criterion_main!(benches);
