use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shape_raster::{
    CoverageMask, PointD, Quality, RenderDesc, Rgba, Rgba8, Rgba8Surface, Shape, WindingStyle,
};

fn star_and_circle() -> Shape {
    let mut s = Shape::new();
    let (cx, cy, r) = (256.0, 256.0, 220.0);
    for i in 0..5 {
        let a = std::f64::consts::PI * (0.5 + 0.8 * i as f64);
        let (x, y) = (cx + r * a.cos(), cy - r * a.sin());
        if i == 0 {
            s.move_to(x, y);
        } else {
            s.line_to(x, y);
        }
    }
    s.close();

    let r = 120.0;
    let k = 0.552_284_749_831 * r;
    s.move_to(cx + r, cy);
    s.curve_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
    s.curve_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
    s.curve_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
    s.curve_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
    s.close();
    s
}

fn bench_render(c: &mut Criterion) {
    let mut shape = star_and_circle();
    shape
        .set_param("winding_style", WindingStyle::EvenOdd.into())
        .unwrap();
    shape
        .set_param("color", Rgba::new(0.1, 0.4, 0.8, 1.0).into())
        .unwrap();
    let desc = RenderDesc::unit(512, 512);
    let mut surface = Rgba8Surface::filled(512, 512, Rgba8::new_opaque(255, 255, 255));

    c.bench_function("render_aa_512", |b| {
        b.iter(|| shape.render(black_box(&mut surface), &desc, Quality::BEST))
    });

    c.bench_function("render_point_sampled_512", |b| {
        b.iter(|| shape.render(black_box(&mut surface), &desc, Quality::FASTEST))
    });

    let mut feathered = shape.clone();
    feathered.set_param("feather", 4.0.into()).unwrap();
    let mut mask = CoverageMask::new(512, 512);
    c.bench_function("render_feather_512", |b| {
        b.iter(|| feathered.render_coverage(black_box(&mut mask), &desc, Quality::default()))
    });
}

fn bench_rebuild(c: &mut Criterion) {
    let shape = star_and_circle();
    c.bench_function("intersector_build", |b| {
        b.iter(|| {
            // A new origin forces a rebuild each iteration
            let mut s = shape.clone();
            s.set_param("origin", PointD::new(0.5, 0.5).into()).unwrap();
            black_box(s.intersector(4.0))
        })
    });

    c.bench_function("hit_test", |b| {
        let p = PointD::new(256.0, 200.0);
        b.iter(|| black_box(shape.hit_test(black_box(p))))
    });
}

criterion_group!(benches, bench_render, bench_rebuild);
criterion_main!(benches);
