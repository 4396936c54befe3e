use criterion::{black_box, criterion_group, criterion_main, Criterion};
use map2_reconcile::loader::{AllocationTable, LoadOptions};
use map2_reconcile::reconciler::compute_variant_total;

const COLUMN: &str = "Dollars_Per_Location";

/// A table roughly the size of the Chicago Map2 exports.
fn allocation_csv(rows: usize) -> String {
    let mut data = format!("Location_ID,Organization,{}\n", COLUMN);
    for id in 0..rows {
        data.push_str(&format!(
            "{},Organization {},{}.{:02}\n",
            id,
            id % 977,
            id * 37 % 100_000,
            id % 100
        ));
    }
    data
}

fn criterion_benchmark(c: &mut Criterion) {
    let options = LoadOptions::default();
    let hq_csv = allocation_csv(250_000);
    let satellite_csv = allocation_csv(100_000);

    c.bench_function("load_allocation_table", |b| {
        b.iter(|| {
            AllocationTable::from_reader(black_box(hq_csv.as_bytes()), "hq", &[COLUMN], &options)
        })
    });

    let hq = AllocationTable::from_reader(hq_csv.as_bytes(), "hq", &[COLUMN], &options).unwrap();
    let satellites =
        AllocationTable::from_reader(satellite_csv.as_bytes(), "satellites", &[COLUMN], &options)
            .unwrap();

    c.bench_function("compute_variant_total", |b| {
        b.iter(|| compute_variant_total("Map2", black_box(&hq), black_box(&satellites), COLUMN))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
