use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use parchment::{Config, Editor};
use std::hint::black_box;

fn history_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_operations");

    group.bench_function("push_action", |b| {
        b.iter_batched(
            || Editor::empty(Config::default()),
            |mut editor| {
                for i in 0..100 {
                    editor.insert(i, b"a").unwrap();
                    editor.snapshot();
                }
                editor
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("undo_redo_small", |b| {
        b.iter_batched(
            || {
                let mut editor = Editor::empty(Config::default());
                for i in 0..100 {
                    editor.insert(i, b"a").unwrap();
                    editor.snapshot();
                }
                editor
            },
            |mut editor| {
                for _ in 0..50 {
                    black_box(editor.undo());
                }
                for _ in 0..50 {
                    black_box(editor.redo());
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("redo_truncation_deep", |b| {
        b.iter_batched(
            || {
                let mut editor = Editor::empty(Config::default());
                for i in 0..1000 {
                    editor.insert(i, b"a").unwrap();
                    editor.snapshot();
                }
                for _ in 0..500 {
                    editor.undo();
                }
                editor
            },
            |mut editor| {
                // Opening a fresh edit here discards the entire redo stack,
                // freeing every piece those 500 undone Actions had linked in.
                editor.insert(0, black_box(b"x")).unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, history_operations);
criterion_main!(benches);
