use asd_screen::dataset::{DatasetSchema, CANONICAL_FEATURES};
use asd_screen::inference::{InferenceConfig, InferenceEngine};
use asd_screen::preprocessing::RawStudentInput;
use asd_screen::training::{GradientBoostingConfig, Trainer};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn create_screening_data(n_rows: usize) -> (DataFrame, DatasetSchema) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

    let answers: Vec<Vec<f64>> = (0..10)
        .map(|_| (0..n_rows).map(|_| f64::from(rng.gen_range(0..2u8))).collect())
        .collect();

    let mut columns: Vec<Column> = answers
        .iter()
        .zip(CANONICAL_FEATURES.iter())
        .map(|(values, name)| Series::new((*name).into(), values.clone()).into())
        .collect();

    let age: Vec<f64> = (0..n_rows).map(|_| f64::from(rng.gen_range(12..37u32))).collect();
    let sex: Vec<&str> = (0..n_rows).map(|_| if rng.gen_bool(0.5) { "m" } else { "f" }).collect();
    let jaundice: Vec<&str> = (0..n_rows).map(|_| if rng.gen_bool(0.3) { "yes" } else { "no" }).collect();
    let family: Vec<&str> = (0..n_rows).map(|_| if rng.gen_bool(0.2) { "yes" } else { "no" }).collect();
    let target: Vec<&str> = (0..n_rows)
        .map(|i| {
            let score: f64 = answers.iter().map(|col| col[i]).sum();
            if score >= 5.0 { "Yes" } else { "No" }
        })
        .collect();

    columns.push(Series::new("Age_Mons".into(), age).into());
    columns.push(Series::new("Sex".into(), sex).into());
    columns.push(Series::new("Jaundice".into(), jaundice).into());
    columns.push(Series::new("Family_mem_with_ASD".into(), family).into());
    columns.push(Series::new("Class/ASD Traits".into(), target).into());

    let schema = DatasetSchema {
        target_column: "Class/ASD Traits".to_string(),
        feature_columns: CANONICAL_FEATURES.iter().map(|c| c.to_string()).collect(),
    };
    (DataFrame::new(columns).unwrap(), schema)
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    for n_rows in [500, 1000, 5000].iter() {
        let (df, schema) = create_screening_data(*n_rows);
        let trainer = Trainer::new(GradientBoostingConfig::default(), 0.2, 42);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &df, |b, df| {
            b.iter(|| trainer.train(black_box(df), &schema).unwrap())
        });
    }

    group.finish();
}

fn bench_inference(c: &mut Criterion) {
    let (df, schema) = create_screening_data(1000);
    let output = Trainer::new(GradientBoostingConfig::default(), 0.2, 42)
        .train(&df, &schema)
        .unwrap();
    let engine = InferenceEngine::new(output.model, output.encoders, InferenceConfig::default()).unwrap();
    let raw = RawStudentInput::new(24, "m", "no", "no").with_answers([1, 0, 1, 1, 0, 1, 0, 1, 1, 0]);

    c.bench_function("predict_single", |b| {
        b.iter(|| engine.predict(black_box(&raw)).unwrap())
    });
}

criterion_group!(benches, bench_training, bench_inference);
criterion_main!(benches);
