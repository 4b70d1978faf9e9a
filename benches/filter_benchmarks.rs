use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{imageops::FilterType, Rgba, RgbaImage};
use quickcut::{
    calculate_target, resize::resize_image, BackgroundFilter, Dimensions, FilterThresholds,
    ResizeRequest,
};

/// Product-shot-like frame: bright backdrop, darker subject in the middle
fn product_shot(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        let inside = x > size / 4 && x < size * 3 / 4 && y > size / 4 && y < size * 3 / 4;
        if inside {
            Rgba([(x % 200) as u8, (y % 200) as u8, 90, 255])
        } else {
            Rgba([250, 248, 252, 255])
        }
    })
}

fn bench_background_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("background_filter");
    let filter = BackgroundFilter::new(FilterThresholds::default());

    for size in [256u32, 512, 1024, 2048] {
        let image = product_shot(size);
        group.throughput(Throughput::Elements(u64::from(size) * u64::from(size)));

        group.bench_with_input(BenchmarkId::new("apply_image", size), &image, |b, image| {
            b.iter(|| filter.apply_image(black_box(image)));
        });

        group.bench_with_input(BenchmarkId::new("apply_in_place", size), &image, |b, image| {
            b.iter_batched(
                || image.as_raw().clone(),
                |mut raw| filter.apply_in_place(black_box(&mut raw)),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize");

    group.bench_function("calculate_target", |b| {
        let request = ResizeRequest::default().with_width(800.0).with_height(600.0);
        b.iter(|| calculate_target(black_box(Dimensions::new(4032.0, 3024.0)), black_box(&request)));
    });

    let image = product_shot(1024);
    let request = ResizeRequest::default().with_width(500.0);
    for filter in [FilterType::Nearest, FilterType::Triangle, FilterType::Lanczos3] {
        group.bench_with_input(
            BenchmarkId::new("resize_image", format!("{:?}", filter)),
            &filter,
            |b, &filter| {
                b.iter(|| resize_image(black_box(&image), &request, filter));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_background_filter, bench_resize);
criterion_main!(benches);
