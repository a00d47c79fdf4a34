use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use favmap::favorites::{Favorite, FavoriteCollection, Platform, PopupContent};
use favmap::geo::LatLng;
use favmap::map::{BaseMap, Lod, MarkerLayer, Viewport};

const AMSTERDAM: LatLng = LatLng::new(52.3676, 4.9041);

/// A dense spiral of coastline around the view
fn base_map() -> BaseMap {
    let mut base = BaseMap::new();
    for ring in 0..50 {
        let line = (0..=360)
            .map(|deg| {
                let angle = (deg as f64).to_radians();
                let radius = 0.01 * (ring + 1) as f64;
                (AMSTERDAM.lng + radius * angle.cos(), AMSTERDAM.lat + radius * angle.sin())
            })
            .collect();
        base.add_coastline(line, Lod::High);
    }
    base
}

fn collection(count: usize) -> FavoriteCollection {
    FavoriteCollection {
        favorites: (0..count)
            .map(|i| Favorite {
                position: (i % 10 != 0).then(|| LatLng::new(52.0 + i as f64 * 1e-4, 4.9)),
                name: Some(format!("Place {i}")),
                rating: Some((i % 6) as f64),
                tags: vec!["food".to_string(), "drinks".to_string()],
                notes: Some("Some <b>notes</b> & more".to_string()),
            })
            .collect(),
    }
}

fn bench_base_map(c: &mut Criterion) {
    let base = base_map();
    let viewport = Viewport::new(AMSTERDAM, 2000.0, 400, 200);
    c.bench_function("base_map_render", |b| {
        b.iter(|| base.render(black_box(200), black_box(50), &viewport))
    });
}

fn bench_markers(c: &mut Criterion) {
    let favorites = collection(10_000);
    let mut layer = MarkerLayer::new();
    c.bench_function("marker_layer_render", |b| {
        b.iter(|| layer.render(black_box(&favorites)))
    });
}

fn bench_popup(c: &mut Criterion) {
    let favorites = collection(1);
    let favorite = &favorites.favorites[0];
    c.bench_function("popup_html", |b| {
        b.iter(|| PopupContent::new(black_box(favorite), AMSTERDAM, Platform::Apple).to_html())
    });
}

criterion_group!(benches, bench_base_map, bench_markers, bench_popup);
criterion_main!(benches);
