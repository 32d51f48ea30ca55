use criterion::{black_box, criterion_group, criterion_main, Criterion};
extern crate gobr;
use gobr::bindings::*;

fn object_new_property(c: &mut Criterion) {
    c.bench_function("Object_new_ref_count", |b| b.iter(|| {
        let instance = Object::new();
        let clone = instance.clone();
        black_box(clone.ref_count())
    }));
}

fn value_round_trip(c: &mut Criterion) {
    c.bench_function("Value_string_get", |b| b.iter(|| {
        let value = black_box("a property value").to_value();
        let s: String = value.get().unwrap();
        black_box(s.len())
    }));
    c.bench_function("Value_int_to_dynamic", |b| b.iter(|| {
        let value = black_box(42i32).to_value();
        black_box(value.to_dynamic().unwrap())
    }));
}

criterion_group!(benches, object_new_property, value_round_trip);
criterion_main!(benches);
