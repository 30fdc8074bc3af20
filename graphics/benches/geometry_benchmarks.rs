use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use quartz_core::mesh::generators::{generate_box, generate_sphere};
use quartz_graphics::{
    BackendType, CombinedBufferRegistry, GeometryDescriptor, GeometryRecord, GraphicsDevice,
    GraphicsInstance, InstanceParameters,
};

fn dummy_device() -> Arc<GraphicsDevice> {
    let parameters = InstanceParameters::new().with_backend(BackendType::Dummy);
    GraphicsInstance::with_parameters(parameters)
        .unwrap()
        .create_device()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Record construction
// ---------------------------------------------------------------------------

fn bench_record_private(c: &mut Criterion) {
    let device = dummy_device();
    let registry = CombinedBufferRegistry::new(device.clone());
    let mesh = generate_sphere(1.0, 64, 32);

    c.bench_function("geometry_record_private_sphere_64x32", |b| {
        b.iter(|| {
            let record =
                GeometryRecord::new(&device, &registry, GeometryDescriptor::from(mesh.clone()))
                    .unwrap();
            black_box(&record);
        });
    });
}

// ---------------------------------------------------------------------------
// Combined pools
// ---------------------------------------------------------------------------

fn bench_pool_rebuild_1000_boxes(c: &mut Criterion) {
    let device = dummy_device();
    let registry = CombinedBufferRegistry::new(device.clone());
    let mesh = generate_box([0.5, 0.5, 0.5]);
    let records: Vec<_> = (0..1000)
        .map(|_| {
            GeometryRecord::new(
                &device,
                &registry,
                GeometryDescriptor::from(mesh.clone()).with_combined(true),
            )
            .unwrap()
        })
        .collect();
    let pool = registry.pool(records[0].signature()).unwrap();

    c.bench_function("combined_pool_rebuild_1000_boxes", |b| {
        b.iter(|| {
            let mut pool = pool.lock();
            pool.rebuild().unwrap();
            black_box(pool.chunk_count());
        });
    });
}

// ---------------------------------------------------------------------------
// Derived data
// ---------------------------------------------------------------------------

fn bench_derived_data(c: &mut Criterion) {
    let device = dummy_device();
    let registry = CombinedBufferRegistry::new(device.clone());
    let mut record = GeometryRecord::new(
        &device,
        &registry,
        GeometryDescriptor::from(generate_sphere(1.0, 64, 32)),
    )
    .unwrap();

    c.bench_function("geometry_derived_edges_pick_kdtree", |b| {
        b.iter(|| {
            record.invalidate();
            black_box(record.ghost_edge_indices().edge_count());
            black_box(record.pick_triangle_colors().len());
            black_box(record.kd_tree().triangle_count());
        });
    });
}

criterion_group!(
    benches,
    bench_record_private,
    bench_pool_rebuild_1000_boxes,
    bench_derived_data
);
criterion_main!(benches);
