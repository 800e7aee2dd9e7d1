use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use altum_calib_rs::calibration::alignment::{EccParams, register_pyramid};
use altum_calib_rs::calibration::output::StackEncoding;
use altum_calib_rs::calibration::{
    CalibrationMode, MotionModel, PixelRect, Raster, ReflectanceStack, StackWriter,
    StandardStackWriter, TiffCompression, Transform,
};

fn textured(width: usize, height: usize, dx: f64, dy: f64) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        let (x, y) = (x as f64 - dx, y as f64 - dy);
        ((0.31 * x + 0.07 * y).sin() + (0.23 * y - 0.05 * x).cos()) as f32
    })
}

fn benchmark_ecc_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecc_by_size");
    group.sample_size(10);

    let sizes = vec![(128, 96, "128x96"), (256, 192, "256x192"), (512, 384, "512x384")];

    for (width, height, label) in sizes {
        let template = textured(width, height, 0.0, 0.0);
        let input = textured(width, height, 1.5, -0.5);

        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &(template, input),
            |b, (template, input)| {
                let params = EccParams {
                    motion_model: MotionModel::Homography,
                    max_iterations: 5,
                    epsilon: 1e-6,
                };
                b.iter(|| {
                    let _ = register_pyramid(
                        black_box(template),
                        black_box(input),
                        Transform::identity(),
                        &params,
                        1,
                    );
                });
            },
        );
    }

    group.finish();
}

fn benchmark_motion_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("motion_models");
    group.sample_size(10);
    let template = textured(256, 192, 0.0, 0.0);
    let input = textured(256, 192, 1.5, -0.5);

    let models = vec![
        (MotionModel::Translation, "translation"),
        (MotionModel::Affine, "affine"),
        (MotionModel::Homography, "homography"),
    ];

    for (motion_model, label) in models {
        let params = EccParams {
            motion_model,
            max_iterations: 5,
            epsilon: 1e-6,
        };
        group.bench_function(label, |b| {
            b.iter(|| {
                let _ = register_pyramid(&template, &input, Transform::identity(), &params, 2);
            });
        });
    }

    group.finish();
}

fn benchmark_stack_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("stack_compression");
    let bands: Vec<Raster> = (0..5)
        .map(|i| textured(512, 384, i as f64, 0.0))
        .collect();
    let stack = ReflectanceStack {
        band_names: (1..=5).map(|i| format!("Band{}", i)).collect(),
        band_kinds: vec![Default::default(); 5],
        crop: PixelRect::new(0, 0, 512, 384),
        mode: CalibrationMode::Reflectance,
        bands,
    };

    let compressions = vec![
        (TiffCompression::None, "none"),
        (TiffCompression::Lzw, "lzw"),
        (TiffCompression::DeflateFast, "deflate_fast"),
        (TiffCompression::DeflateBest, "deflate_best"),
    ];

    for (compression, label) in compressions {
        let encoding = StackEncoding {
            compression,
            ..StackEncoding::default()
        };
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut output = Vec::new();
                let _ = StandardStackWriter.write_stack(black_box(&stack), &mut output, &encoding);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_ecc_sizes,
    benchmark_motion_models,
    benchmark_stack_compression
);
criterion_main!(benches);
