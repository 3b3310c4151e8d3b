//! Performance benchmarks for marker-cluster-lib
//!
//! Run with: cargo bench --package marker-cluster-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Coord;
use marker_cluster_lib::grid::bucket_markers;
use marker_cluster_lib::utils::{MercatorProjection, lat_lng};
use marker_cluster_lib::{ClusterConfig, ClusterEngine, Marker, MarkerId, StaticMap};

/// Generate markers scattered around a base position, roughly a city wide
fn generate_markers(count: usize, base_lat: f64, base_lon: f64) -> Vec<Marker> {
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64;
            let lat = base_lat + (t * 977.0).sin() * 0.05;
            let lon = base_lon + (t * 631.0).cos() * 0.08;
            Marker::new(MarkerId(i as u64), lat_lng(lat, lon), ())
        })
        .collect()
}

fn projection(zoom: f64) -> MercatorProjection {
    MercatorProjection::new(lat_lng(51.5, -0.1), zoom, Coord { x: 960.0, y: 540.0 })
}

fn bench_bucketing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucketing");

    for &count in &[100usize, 1_000, 10_000] {
        let markers = generate_markers(count, 51.5, -0.1);
        let projection = projection(12.0);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &markers, |b, markers| {
            b.iter(|| bucket_markers(markers, &projection, 60.0));
        });
    }

    group.finish();
}

fn bench_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("recluster");

    for &count in &[100usize, 1_000, 10_000] {
        for &zoom in &[8.0, 14.0] {
            let map = StaticMap::new(Some(projection(zoom)), zoom);
            let mut engine: ClusterEngine<StaticMap<MercatorProjection>, Marker> = ClusterEngine::new(
                generate_markers(count, 51.5, -0.1),
                ClusterConfig::default().with_average_center(true),
            );
            engine.set_map(Some(map));

            group.throughput(Throughput::Elements(count as u64));
            group.bench_function(format!("{count}_markers_zoom_{zoom}"), |b| {
                b.iter(|| engine.recluster());
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_bucketing, bench_full_pass);
criterion_main!(benches);
