// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_repaint::{Engine, PixelRect, Region, SurfaceId};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_range_i32(&mut self, upper_exclusive: i32) -> i32 {
        if upper_exclusive <= 0 {
            return 0;
        }
        (self.next_u32() % upper_exclusive as u32) as i32
    }

    fn rect_within(&mut self, extent: i32, max_size: i32) -> PixelRect {
        let x = self.gen_range_i32(extent);
        let y = self.gen_range_i32(extent);
        let w = 1 + self.gen_range_i32(max_size);
        let h = 1 + self.gen_range_i32(max_size);
        PixelRect::from_origin_size(x, y, w, h)
    }
}

fn scattered_rects(n: usize, seed: u64) -> Vec<PixelRect> {
    let mut rng = Lcg::new(seed);
    (0..n).map(|_| rng.rect_within(2_048, 64)).collect()
}

/// A window holding a `cols x rows` grid of 40x40 cells, every other one opaque.
fn build_grid(cols: i32, rows: i32) -> (Engine, SurfaceId, Vec<SurfaceId>) {
    let mut engine = Engine::new();
    let window = engine.create_surface(None).unwrap();
    engine
        .set_bounds(window, PixelRect::from_size(cols * 40, rows * 40))
        .unwrap();
    engine.show(window).unwrap();
    let mut cells = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let cell = engine.create_surface(Some(window)).unwrap();
            engine
                .set_bounds(cell, PixelRect::from_origin_size(col * 40, row * 40, 40, 40))
                .unwrap();
            engine.set_opaque(cell, (row + col) % 2 == 0).unwrap();
            engine.show(cell).unwrap();
            cells.push(cell);
        }
    }
    engine.flush();
    (engine, window, cells)
}

fn bench_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_region");
    group.sample_size(50);

    for &n in &[64_usize, 512, 2_048] {
        let a = scattered_rects(n, 0x5EED_0000_0000_0001);
        let b = scattered_rects(n, 0x5EED_0000_0000_0002);

        group.bench_function(format!("from_rects(n={n})"), |bench| {
            bench.iter(|| black_box(Region::from_rects(a.iter().copied())));
        });

        let ra = Region::from_rects(a.iter().copied());
        let rb = Region::from_rects(b.iter().copied());
        group.bench_function(format!("union(n={n})"), |bench| {
            bench.iter(|| black_box(ra.union(&rb)));
        });
        group.bench_function(format!("subtract(n={n})"), |bench| {
            bench.iter(|| black_box(ra.subtract(&rb)));
        });
        group.bench_function(format!("intersect(n={n})"), |bench| {
            bench.iter(|| black_box(ra.intersect(&rb)));
        });
    }

    group.finish();
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_repaint");
    group.sample_size(30);

    for &(cols, rows) in &[(8_i32, 8_i32), (24, 24)] {
        let n = cols * rows;

        group.bench_function(format!("invalidate_scattered_and_flush(n={n})"), |b| {
            b.iter_batched(
                || build_grid(cols, rows),
                |(mut engine, _, cells)| {
                    let mut rng = Lcg::new(0xF1A5_0000_0000_0001);
                    for _ in 0..32 {
                        let cell = cells[rng.gen_range_i32(n) as usize];
                        let damage = Region::from(rng.rect_within(40, 20));
                        engine.invalidate_region(cell, &damage).unwrap();
                    }
                    black_box(engine.flush());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("move_cells_and_flush(n={n})"), |b| {
            b.iter_batched(
                || build_grid(cols, rows),
                |(mut engine, _, cells)| {
                    for (i, cell) in cells.iter().enumerate().step_by(7) {
                        let offset = (i % 5) as i32;
                        let bounds = engine.bounds(*cell).unwrap();
                        engine
                            .move_to(*cell, bounds.x0 + offset, bounds.y0 + offset)
                            .unwrap();
                    }
                    black_box(engine.flush());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("scroll_window_and_flush(n={n})"), |b| {
            b.iter_batched(
                || build_grid(cols, rows),
                |(mut engine, window, _)| {
                    engine.scroll_by(window, 0, 12).unwrap();
                    black_box(engine.flush());
                },
                BatchSize::LargeInput,
            );
        });
    }

    let (cols, rows) = (60, 50);
    group.bench_function(
        format!("small_invalidation_large_tree(n={})", cols * rows),
        |b| {
            b.iter_batched(
                || build_grid(cols, rows),
                |(mut engine, window, _)| {
                    let dot = Region::from(PixelRect::from_origin_size(20, 20, 1, 1));
                    engine.invalidate_region(window, &dot).unwrap();
                    black_box(engine.flush());
                },
                BatchSize::LargeInput,
            );
        },
    );

    group.finish();
}

criterion_group!(benches, bench_region, bench_flush);
criterion_main!(benches);
