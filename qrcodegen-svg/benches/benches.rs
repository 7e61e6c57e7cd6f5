use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qrcodegen_svg::SvgOptions;

const PAYLOAD: &str = "WIFI:T:WPA;S:MyNetwork;P:MyPassword;;https://example.com/some/longer/path?with=query";

fn draw_benchmark(c: &mut Criterion) {
    let input = qrcodegen_svg::encode(PAYLOAD, &SvgOptions::default()).unwrap();
    c.bench_with_input(
        BenchmarkId::new("qrcodegen-svg", "draw_svg"),
        black_box(&input),
        |b, i| {
            b.iter(|| {
                let _svg = qrcodegen_svg::draw_svg(i, 4, "#000000", "#FFFFFF");
            })
        },
    );
}

fn encode_benchmark(c: &mut Criterion) {
    let options = SvgOptions::default();
    c.bench_with_input(
        BenchmarkId::new("qrcodegen-svg", "encode_svg"),
        black_box(&PAYLOAD),
        |b, i| {
            b.iter(|| {
                let _svg = qrcodegen_svg::encode_svg(i, &options);
            })
        },
    );
}

criterion_group!(benches, draw_benchmark, encode_benchmark);
criterion_main!(benches);
