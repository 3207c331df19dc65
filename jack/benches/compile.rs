use criterion::{black_box, criterion_group, criterion_main, Criterion};

use jack::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    {
        let source = include_str!("../tests/Counter.jack");

        c.bench_function("compile counter", |b| {
            b.iter(|| black_box(jack::compile_with(black_box(source), CompileConf::default())))
        });
    }

    {
        let source = include_str!("../tests/Counter.jack");

        c.bench_function("tokenize counter", |b| {
            b.iter(|| black_box(jack::xml::write_tokens(black_box(source), Vec::new())))
        });
    }

    {
        let source = include_str!("../tests/Counter.jack");

        c.bench_function("analyze counter", |b| {
            b.iter(|| black_box(jack::xml::write_parse_tree(black_box(source), Vec::new())))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
