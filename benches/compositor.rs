use std::collections::HashMap;

use consolewm::buffer::FlushMode;
use consolewm::color::ColorSupport;
use consolewm::compositor::Compositor;
use consolewm::geometry::{Rect, Size};
use consolewm::grid::Grid;
use consolewm::theme::Theme;
use consolewm::window::WindowRegistry;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn stacked_windows_frame(c: &mut Criterion) {
    let registry = WindowRegistry::new();
    let mut grids = HashMap::new();
    for i in 0..8 {
        let x = (i * 5) as u16;
        let bounds = Rect::new(x, x, 30, 20);
        let window = registry.create(format!("window-{i}"), bounds);
        let mut grid = Grid::new(30, 20);
        grid.fill(Rect::new(0, 0, 30, 20), char::from(b'a' + i as u8), None, None);
        grids.insert(window.id(), grid);
    }

    c.bench_function("compositor_paint_8_overlapping_windows", |b| {
        b.iter(|| {
            let mut compositor = Compositor::new(Size::new(120, 40), FlushMode::Cell, ColorSupport::TrueColor, Theme::default());
            compositor.paint(&registry, &grids, Some("menu"), Some("status"));
            black_box(compositor.flush());
        })
    });
}

criterion_group!(benches, stacked_windows_frame);
criterion_main!(benches);
