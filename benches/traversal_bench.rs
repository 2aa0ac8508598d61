//! Traversal and render throughput on a wide, shallow scene.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use drawable_tui::drawable::{self, Drawable};
use drawable_tui::types::Position;
use drawable_tui::{render, tree, SceneContext, Surface, Widget};

/// A root with `panels` children, each holding `rows` tagged rows.
fn wide_scene(panels: usize, rows: usize) -> SceneContext {
    let mut ctx = SceneContext::new();
    let root = tree::create_node(&mut ctx, Widget::Rect).unwrap();
    drawable::set_size(&mut ctx, root, 200, 60).unwrap();

    for p in 0..panels {
        let panel = tree::create_node(&mut ctx, Widget::Rect).unwrap();
        drawable::set_position(&mut ctx, panel, Position::new((p % 10) as i32 * 20, (p / 10) as i32 * 6)).unwrap();
        drawable::set_size(&mut ctx, panel, 20, 6).unwrap();
        for r in 0..rows {
            let row = tree::create_node(&mut ctx, Widget::text("row")).unwrap();
            drawable::set_position(&mut ctx, row, Position::new(1, r as i32)).unwrap();
            drawable::set_size(&mut ctx, row, 18, 1).unwrap();
            if r % 3 == 0 {
                drawable::add_attribute(&mut ctx, row, "marked").unwrap();
            }
            tree::add_child(&mut ctx, panel, row).unwrap();
        }
        tree::add_child(&mut ctx, root, panel).unwrap();
    }
    ctx.set_root(root).unwrap();
    ctx
}

fn bench_traversal(c: &mut Criterion) {
    let ctx = wide_scene(100, 20);
    let root = ctx.root.unwrap();
    let marked = |d: &Drawable| d.has_attribute("marked");

    c.bench_function("find_marked", |b| {
        b.iter(|| black_box(tree::find(&ctx, root, &marked)))
    });
    c.bench_function("filter_marked", |b| {
        b.iter(|| black_box(tree::filter(&ctx, root, &marked)))
    });
    c.bench_function("find_first_missing", |b| {
        b.iter(|| black_box(drawable::find_first_with_attribute(&ctx, root, "missing")))
    });
}

fn bench_render(c: &mut Criterion) {
    let mut ctx = wide_scene(100, 20);
    let mut surface = Surface::new(200, 60);

    c.bench_function("render_wide_scene", |b| {
        b.iter(|| {
            surface.clear();
            render::render(&mut ctx, &mut surface, Position::ORIGIN).unwrap();
        })
    });

    ctx.debug_overlay = true;
    c.bench_function("render_wide_scene_debug", |b| {
        b.iter(|| {
            surface.clear();
            render::render(&mut ctx, &mut surface, Position::ORIGIN).unwrap();
        })
    });
}

criterion_group!(benches, bench_traversal, bench_render);
criterion_main!(benches);
