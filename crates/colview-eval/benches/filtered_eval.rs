use colview_columnar::{apply_predicate, Column, ColumnStore, FilterExpr};
use colview_eval::FilteredView;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

fn bench_rows() -> usize {
    std::env::var("COLVIEW_BENCH_ROWS")
        .ok()
        .and_then(|v| v.replace('_', "").parse::<usize>().ok())
        .filter(|&v| (10_000..=10_000_000).contains(&v))
        .unwrap_or(1_000_000)
}

fn build_store(rows: usize) -> Arc<ColumnStore> {
    let x: Vec<i64> = (0..rows as i64).collect();
    let w: Vec<f64> = (0..rows).map(|i| (i % 100) as f64 / 100.0).collect();
    Arc::new(
        ColumnStore::from_columns([("x", Column::from_i64(x)), ("w", Column::from_f64(w))])
            .expect("bench store"),
    )
}

fn bench_filtered_virtual_column(c: &mut Criterion) {
    let rows = bench_rows();
    let store = build_store(rows);

    let mut group = c.benchmark_group("filtered_virtual_column");
    group.throughput(Throughput::Elements(rows as u64));
    group.measurement_time(Duration::from_secs(10));

    // Keep roughly 1%, 50% and 100% of the rows.
    for modulus in [100i64, 2, 1] {
        let predicate = FilterExpr::eq("bucket", 0);
        let bucket = Column::from_i64((0..rows as i64).map(|v| v % modulus).collect());
        let with_bucket = ColumnStore::from_columns(
            store
                .column_names()
                .map(|name| (name.to_owned(), store.get(name).cloned().expect("column")))
                .chain([("bucket".to_owned(), bucket)]),
        )
        .expect("bench store");
        let mask = apply_predicate(&with_bucket, &predicate).expect("bench mask");

        let mut view = FilteredView::with_mask(with_bucket, mask).expect("bench view");
        view.register_function("scale", |args: &[Column]| {
            let x = args[0].as_i64().ok_or("x must be int")?;
            let w = args[1].as_f64().ok_or("w must be float")?;
            Ok(Column::from_f64(
                x.iter().zip(w).map(|(&x, &w)| x as f64 * w).collect(),
            ))
        })
        .expect("register");
        view.define_virtual_column("scaled", "scale", ["x", "w"])
            .expect("define");

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("keep_1_in_{modulus}")),
            &view,
            |b, view| b.iter(|| black_box(view.evaluate("scaled").expect("evaluate"))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_filtered_virtual_column);
criterion_main!(benches);
