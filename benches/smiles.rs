use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fragcrab::{parse, tokenize, Linear, Ring, RingSpec};

const ETHANOL: &str = "CCO";
const IBUPROFEN: &str = "CC(C)Cc1ccc(cc1)C(C)C(=O)O";
const CANNABIDIOL: &str = "CCCCCC1=CC(=C(C(=C1)O)C2C=C(CCC2C(=C)C)C)O";
const TRICYCLE: &str = "C1CC2CCCCC2C3CCCC31";

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    group.bench_function("ibuprofen", |b| {
        b.iter(|| black_box(tokenize(black_box(IBUPROFEN)).unwrap()))
    });
    group.bench_function("cannabidiol", |b| {
        b.iter(|| black_box(tokenize(black_box(CANNABIDIOL)).unwrap()))
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("ethanol", |b| {
        b.iter(|| black_box(parse(black_box(ETHANOL)).unwrap()))
    });
    group.bench_function("ibuprofen", |b| {
        b.iter(|| black_box(parse(black_box(IBUPROFEN)).unwrap()))
    });
    group.bench_function("cannabidiol", |b| {
        b.iter(|| black_box(parse(black_box(CANNABIDIOL)).unwrap()))
    });
    group.bench_function("tricycle", |b| {
        b.iter(|| black_box(parse(black_box(TRICYCLE)).unwrap()))
    });

    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let ibuprofen = parse(IBUPROFEN).unwrap();
    let cannabidiol = parse(CANNABIDIOL).unwrap();
    let tricycle = parse(TRICYCLE).unwrap();

    let mut group = c.benchmark_group("write");

    group.bench_function("ibuprofen", |b| {
        b.iter(|| black_box(black_box(&ibuprofen).smiles()))
    });
    group.bench_function("cannabidiol", |b| {
        b.iter(|| black_box(black_box(&cannabidiol).smiles()))
    });
    group.bench_function("tricycle", |b| {
        b.iter(|| black_box(black_box(&tricycle).smiles()))
    });

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    group.bench_function("toluene", |b| {
        b.iter(|| {
            let ring = Ring::new(RingSpec::new("c", 6)).unwrap();
            let methyl = Linear::new(&["C"]).unwrap();
            black_box(ring.attach(methyl, 4).unwrap().smiles())
        })
    });
    group.bench_function("naphthalene", |b| {
        b.iter(|| {
            let ring = Ring::new(RingSpec::new("c", 6)).unwrap();
            black_box(ring.fuse(&ring, 3).unwrap().smiles())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_write, bench_build);
criterion_main!(benches);
