//! # Evaluation Benchmarks
//!
//! Performance benchmarks for kubel-core scoring, reconciliation and the
//! auto-completion rule.
//!
//! Run with: `cargo bench -p kubel-core`

use chrono::{DateTime, NaiveDate, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kubel_core::{
    CategoryData, CategoryDefinition, EntryDefinition, Phase, PhaseDefinition, Selection,
    apply_auto_completion, calculate_result, chart_points, empty_person,
    sync_person_with_category_definition,
};
use std::hint::black_box;

/// Schema with `categories` categories of 18 phases with `entries` entries each.
fn create_schema(categories: usize, entries: usize) -> CategoryData {
    (0..categories)
        .map(|c| {
            let phases = (1..=18)
                .map(|p| {
                    (
                        p.to_string(),
                        PhaseDefinition {
                            name: Some(format!("Phase {p}")),
                            entries: (0..entries)
                                .map(|e| EntryDefinition::new(format!("entry {e}")))
                                .collect(),
                        },
                    )
                })
                .collect();
            (
                format!("category-{c}"),
                CategoryDefinition {
                    name: format!("Category {c}"),
                    phases,
                },
            )
        })
        .collect()
}

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(0, 0).expect("timestamp")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_calculate_result(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate_result");

    for size in [10, 100, 1000].iter() {
        let phase = Phase::with_entries(
            (0..*size)
                .map(|i| Selection::CHOICES[i % Selection::CHOICES.len()])
                .collect(),
        );
        group.bench_with_input(BenchmarkId::from_parameter(size), &phase, |b, phase| {
            b.iter(|| black_box(calculate_result(black_box(phase))));
        });
    }

    group.finish();
}

fn bench_reconciliation(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciliation");

    for categories in [5, 20, 50].iter() {
        let old = create_schema(*categories, 8);
        let new = create_schema(*categories + 1, 10);
        let person = empty_person("Bench", &old, epoch());

        group.bench_with_input(
            BenchmarkId::from_parameter(categories),
            &person,
            |b, person| {
                b.iter(|| {
                    let mut person = person.clone();
                    black_box(sync_person_with_category_definition(&mut person, &new))
                });
            },
        );
    }

    group.finish();
}

fn bench_auto_completion(c: &mut Criterion) {
    let schema = create_schema(1, 12);
    let person = empty_person("Bench", &schema, epoch());
    let (id, definition) = schema.first().expect("schema");
    let order = definition.phase_ids();

    c.bench_function("auto_completion_last_phase", |b| {
        b.iter(|| {
            let mut category = person.categories[id].clone();
            if let Some(phase) = category.phases.get_mut("18") {
                phase.entries.fill(Selection::Do);
            }
            black_box(apply_auto_completion(&mut category, &order, "18", Selection::Do))
        });
    });
}

fn bench_chart(c: &mut Criterion) {
    let schema = create_schema(10, 10);
    let mut person = empty_person("Bench", &schema, epoch());
    person.birthday = Some("01.01.2020".to_string());
    let today = NaiveDate::from_ymd_opt(2025, 1, 1).expect("date");

    c.bench_function("chart_points", |b| {
        b.iter(|| black_box(chart_points(&person, &schema, today)));
    });
}

criterion_group!(
    benches,
    bench_calculate_result,
    bench_reconciliation,
    bench_auto_completion,
    bench_chart
);
criterion_main!(benches);
