use super::*;
use crate::assets::codec::DefaultCodec;
use crate::document::model::CanvasFrame;
use crate::foundation::core::DEFAULT_PALETTE;

fn raster(w: u32, h: u32) -> RasterImage {
    RasterImage::new(w, h, [5u8, 6, 7, 255].repeat((w * h) as usize)).unwrap()
}

fn bench_with(n: usize) -> (Workbench, Vec<DocId>) {
    let mut wb = Workbench::default();
    let ids = (0..n)
        .map(|i| wb.add_document(format!("img{i}"), raster(100, 50)))
        .collect();
    (wb, ids)
}

#[test]
fn new_documents_get_defaults_and_round_robin_colors() {
    let mut wb = Workbench::default();
    let ids: Vec<DocId> = (0..DEFAULT_PALETTE.len() + 1)
        .map(|i| wb.add_document(format!("d{i}"), raster(4, 4)))
        .collect();
    let first = wb.document(ids[0]).unwrap();
    assert_eq!(first.position, Point::new(400.0, 300.0));
    assert_eq!(first.frame_duration, 0.5);
    assert_eq!(first.border_color, DEFAULT_PALETTE[0]);
    assert_eq!(
        wb.document(ids[DEFAULT_PALETTE.len()]).unwrap().border_color,
        DEFAULT_PALETTE[0]
    );
    assert_eq!(wb.document(ids[1]).unwrap().border_color, DEFAULT_PALETTE[1]);
    let orders: Vec<i64> = wb.documents().iter().map(|d| d.animation_order).collect();
    assert_eq!(orders, (0..=DEFAULT_PALETTE.len() as i64).collect::<Vec<_>>());
    assert_eq!(wb.focused(), Some(ids[0]));
}

#[test]
fn colors_follow_creation_order_not_live_count() {
    let (mut wb, ids) = bench_with(2);
    wb.remove(ids[0]);
    let third = wb.add_document("third", raster(4, 4));
    assert_eq!(wb.document(third).unwrap().border_color, DEFAULT_PALETTE[2]);
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = WorkbenchConfig {
        palette: vec![],
        ..WorkbenchConfig::default()
    };
    assert!(Workbench::new(cfg, ManualScheduler::new()).is_err());
}

#[test]
fn closing_focused_document_moves_focus_to_first_then_none() {
    let (mut wb, ids) = bench_with(3);
    assert!(wb.set_focus(ids[1]));
    wb.remove(ids[1]);
    assert_eq!(wb.focused(), Some(ids[0]));

    wb.remove(ids[0]);
    assert_eq!(wb.focused(), Some(ids[2]));
    wb.remove(ids[2]);
    assert_eq!(wb.focused(), None);
    assert!(wb.is_empty());
}

#[test]
fn closing_unfocused_document_keeps_focus() {
    let (mut wb, ids) = bench_with(3);
    wb.set_focus(ids[2]);
    wb.remove(ids[0]);
    assert_eq!(wb.focused(), Some(ids[2]));
    assert!(!wb.set_focus(ids[0]));
}

#[test]
fn unknown_ids_are_noops() {
    let (mut wb, _) = bench_with(1);
    let ghost = DocId(999);
    wb.resize(ghost, Some(10.0), None);
    wb.corner_resize(ghost, Corner::TopLeft, Vec2::new(5.0, 5.0));
    wb.move_by(ghost, Vec2::new(1.0, 1.0));
    wb.set_opacity(ghost, 0.2);
    assert!(wb.remove(ghost).is_none());
    assert!(!wb.is_modified(ghost));
    assert_eq!(wb.bake(ghost).unwrap(), false);
    assert!(wb.export(ghost, &DefaultCodec, ExportFormat::Png, None).is_err());
}

#[test]
fn load_skips_failures() {
    let mut png = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(6, 3))
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();
    let sources = [
        ImageSource::bytes("ok.png", png.into_inner()),
        ImageSource::bytes("bad.png", vec![1, 2, 3]),
    ];
    let mut wb = Workbench::default();
    let ids = wb.load(&sources, &DefaultCodec);
    assert_eq!(ids.len(), 1);
    let doc = wb.document(ids[0]).unwrap();
    assert_eq!(doc.name, "ok.png");
    assert_eq!(doc.original_size(), Size::new(6.0, 3.0));
    assert!(!wb.is_modified(ids[0]));
}

#[test]
fn resize_uses_workbench_aspect_flag() {
    let (mut wb, ids) = bench_with(1);
    assert!(wb.keep_aspect());
    wb.resize(ids[0], Some(50.0), None);
    assert_eq!(wb.document(ids[0]).unwrap().display_size, Size::new(50.0, 25.0));

    wb.set_keep_aspect(false);
    wb.resize(ids[0], None, Some(80.0));
    assert_eq!(wb.document(ids[0]).unwrap().display_size, Size::new(50.0, 80.0));
    assert!(wb.is_modified(ids[0]));
}

#[test]
fn corner_resize_is_free_form_in_canvas_mode() {
    let (mut wb, ids) = bench_with(1);
    wb.set_canvas_resize_mode(true);
    wb.corner_resize(ids[0], Corner::BottomRight, Vec2::new(50.0, 0.0));
    assert_eq!(wb.document(ids[0]).unwrap().display_size, Size::new(150.0, 50.0));

    let (mut wb, ids) = bench_with(1);
    wb.corner_resize(ids[0], Corner::BottomRight, Vec2::new(50.0, 50.0));
    assert_eq!(wb.document(ids[0]).unwrap().display_size, Size::new(150.0, 75.0));
}

#[test]
fn edge_resize_requires_canvas_mode_and_leaving_it_bakes() {
    let (mut wb, ids) = bench_with(2);
    assert_eq!(wb.edge_resize(ids[0], Edge::Right, Vec2::new(20.0, 0.0)), None);
    assert!(wb.document(ids[0]).unwrap().canvas_frame().is_none());

    wb.set_canvas_resize_mode(true);
    assert_eq!(
        wb.edge_resize(ids[0], Edge::Right, Vec2::new(20.0, 0.0)),
        Some(Vec2::new(20.0, 0.0))
    );
    assert!(wb.is_modified(ids[0]));

    wb.set_canvas_resize_mode(false);
    let baked = wb.document(ids[0]).unwrap();
    assert_eq!(baked.canvas_frame(), None);
    assert_eq!(baked.display_size, Size::new(120.0, 50.0));
    assert_eq!((baked.source().width, baked.source().height), (120, 50));
    assert_eq!(baked.source().pixel(119, 0), Some([0, 0, 0, 0]));
    // Untouched document is not rebaked.
    assert_eq!(wb.document(ids[1]).unwrap().source().width, 100);
}

#[test]
fn concurrent_bake_of_same_document_is_rejected() {
    let (mut wb, ids) = bench_with(1);
    wb.set_canvas_resize_mode(true);
    wb.edge_resize(ids[0], Edge::Bottom, Vec2::new(0.0, 10.0));

    let job = wb.begin_bake(ids[0]).unwrap().unwrap();
    assert!(matches!(
        wb.begin_bake(ids[0]),
        Err(BenchError::BakeInProgress(id)) if id == ids[0]
    ));
    assert!(wb.bake(ids[0]).is_err());

    let outcome = std::thread::spawn(move || job.run()).join().unwrap();
    assert!(wb.finish_bake(outcome.clone()));
    assert!(!wb.finish_bake(outcome));
    assert_eq!(wb.document(ids[0]).unwrap().source().height, 60);
    assert_eq!(wb.bake(ids[0]).unwrap(), false);
}

#[test]
fn edits_made_while_a_bake_runs_are_kept() {
    let (mut wb, ids) = bench_with(1);
    let id = ids[0];
    wb.set_canvas_resize_mode(true);
    wb.edge_resize(id, Edge::Right, Vec2::new(20.0, 0.0));
    let job = wb.begin_bake(id).unwrap().unwrap();

    wb.edge_resize(id, Edge::Right, Vec2::new(30.0, 0.0));
    assert!(!wb.finish_bake(job.run()));
    let doc = wb.document(id).unwrap();
    assert_eq!(doc.canvas_size(), Some(Size::new(150.0, 50.0)));
    assert_eq!(doc.source().width, 100);

    wb.set_canvas_resize_mode(false);
    let doc = wb.document(id).unwrap();
    assert_eq!(doc.display_size, Size::new(150.0, 50.0));
    assert_eq!((doc.source().width, doc.source().height), (150, 50));
}

#[test]
fn stale_bake_after_leaving_canvas_mode_rebakes_current_geometry() {
    let (mut wb, ids) = bench_with(1);
    let id = ids[0];
    wb.set_canvas_resize_mode(true);
    wb.edge_resize(id, Edge::Right, Vec2::new(20.0, 0.0));
    let job = wb.begin_bake(id).unwrap().unwrap();
    wb.edge_resize(id, Edge::Right, Vec2::new(30.0, 0.0));

    // The reserved document is skipped by the bake pass.
    wb.set_canvas_resize_mode(false);
    assert!(wb.document(id).unwrap().canvas_frame().is_some());

    assert!(!wb.finish_bake(job.run()));
    let doc = wb.document(id).unwrap();
    assert!(doc.canvas_frame().is_none());
    assert_eq!(doc.display_size, Size::new(150.0, 50.0));
    assert_eq!(doc.source().width, 150);
}

#[test]
fn reset_during_bake_wins_over_the_outcome() {
    let (mut wb, ids) = bench_with(1);
    let id = ids[0];
    wb.set_canvas_resize_mode(true);
    wb.edge_resize(id, Edge::Bottom, Vec2::new(0.0, 25.0));
    let job = wb.begin_bake(id).unwrap().unwrap();
    wb.reset(id);

    assert!(!wb.finish_bake(job.run()));
    let doc = wb.document(id).unwrap();
    assert_eq!(doc.frame, Frame::Normal);
    assert_eq!(doc.display_size, Size::new(100.0, 50.0));
    assert!(!wb.is_modified(id));
}

#[test]
fn bake_of_removed_document_is_discarded() {
    let (mut wb, ids) = bench_with(1);
    wb.set_canvas_resize_mode(true);
    wb.edge_resize(ids[0], Edge::Left, Vec2::new(-10.0, 0.0));
    let job = wb.begin_bake(ids[0]).unwrap().unwrap();
    wb.remove(ids[0]);
    assert!(!wb.finish_bake(job.run()));
}

#[test]
fn opacity_and_duration_are_clamped() {
    let (mut wb, ids) = bench_with(1);
    wb.set_opacity(ids[0], 1.7);
    assert_eq!(wb.document(ids[0]).unwrap().overlay_opacity, 1.0);
    wb.set_opacity(ids[0], -3.0);
    assert_eq!(wb.document(ids[0]).unwrap().overlay_opacity, 0.0);

    wb.set_frame_duration(ids[0], 0.01);
    assert_eq!(wb.document(ids[0]).unwrap().frame_duration, 0.1);
    wb.set_frame_duration(ids[0], f64::NAN);
    assert_eq!(wb.document(ids[0]).unwrap().frame_duration, 0.1);
}

#[test]
fn flips_and_reset() {
    let (mut wb, ids) = bench_with(1);
    let id = ids[0];
    wb.toggle_flip(id, Axis::Horizontal);
    assert!(wb.document(id).unwrap().flip.x);
    assert!(wb.is_modified(id));
    wb.toggle_flip(id, Axis::Horizontal);
    assert!(!wb.is_modified(id));

    wb.set_flip(id, Flip { x: true, y: true });
    wb.move_by(id, Vec2::new(30.0, 0.0));
    wb.set_opacity(id, 0.5);
    wb.resize(id, Some(10.0), None);
    wb.reset(id);
    assert!(!wb.is_modified(id));
}

#[test]
fn z_order_moves() {
    let (mut wb, ids) = bench_with(3);
    wb.bring_to_front(ids[0]);
    let order: Vec<DocId> = wb.documents().iter().map(|d| d.id()).collect();
    assert_eq!(order, vec![ids[1], ids[2], ids[0]]);
    wb.send_to_back(ids[2]);
    let order: Vec<DocId> = wb.documents().iter().map(|d| d.id()).collect();
    assert_eq!(order, vec![ids[2], ids[1], ids[0]]);
}

#[test]
fn relative_position_needs_a_distinct_base() {
    let (mut wb, ids) = bench_with(2);
    assert_eq!(wb.relative_position(ids[1], None, None), None);

    wb.set_base_image(Some(ids[0]));
    assert_eq!(wb.relative_position(ids[0], None, None), None);
    assert_eq!(wb.relative_position(ids[1], None, None), Some(Vec2::ZERO));

    wb.set_base_image(Some(DocId(77)));
    assert_eq!(wb.base_image(), None);
}

#[test]
fn relative_position_prefers_caller_then_cached_viewport() {
    let (mut wb, ids) = bench_with(2);
    wb.set_base_image(Some(ids[0]));
    wb.set_anchor_point(ids[0], AnchorPoint::TopLeft);

    // Own geometry: base top-left (350, 275).
    assert_eq!(
        wb.relative_position(ids[1], None, None),
        Some(Vec2::new(50.0, 25.0))
    );

    wb.set_placement_viewport(RenderedFrame::new(Size::new(10.0, 10.0), Point::new(0.0, 0.0)));
    assert_eq!(
        wb.relative_position(ids[1], None, None),
        Some(Vec2::new(405.0, 305.0))
    );

    assert_eq!(
        wb.relative_position(ids[1], Some(Size::new(20.0, 20.0)), Some(Point::new(400.0, 300.0))),
        Some(Vec2::new(10.0, 10.0))
    );
}

#[test]
fn place_relative_moves_overlay() {
    let (mut wb, ids) = bench_with(2);
    wb.set_base_image(Some(ids[0]));
    assert!(wb.place_relative(ids[1], Vec2::new(-12.0, 7.0), None, None));
    assert_eq!(
        wb.relative_position(ids[1], None, None),
        Some(Vec2::new(-12.0, 7.0))
    );
    assert!(!wb.place_relative(ids[0], Vec2::ZERO, None, None));
}

#[test]
fn changing_or_removing_the_base_drops_the_cached_viewport() {
    let (mut wb, ids) = bench_with(3);
    let cached = RenderedFrame::new(Size::new(10.0, 10.0), Point::new(0.0, 0.0));

    wb.set_base_image(Some(ids[0]));
    wb.set_placement_viewport(cached);
    assert_eq!(
        wb.relative_position(ids[2], None, None),
        Some(Vec2::new(400.0, 300.0))
    );

    // Re-selecting the same base keeps it.
    wb.set_base_image(Some(ids[0]));
    assert_eq!(
        wb.relative_position(ids[2], None, None),
        Some(Vec2::new(400.0, 300.0))
    );

    wb.set_base_image(Some(ids[1]));
    assert_eq!(wb.relative_position(ids[2], None, None), Some(Vec2::ZERO));

    wb.set_placement_viewport(cached);
    wb.remove(ids[1]);
    wb.set_base_image(Some(ids[0]));
    assert_eq!(wb.relative_position(ids[2], None, None), Some(Vec2::ZERO));
}

#[test]
fn removing_base_clears_it() {
    let (mut wb, ids) = bench_with(2);
    wb.set_base_image(Some(ids[0]));
    wb.remove(ids[0]);
    assert_eq!(wb.base_image(), None);
}

#[test]
fn animation_flow_through_workbench() {
    let (mut wb, ids) = bench_with(3);
    wb.set_layout_mode(LayoutMode::Animation);
    wb.set_frame_duration(ids[0], 0.2);
    wb.set_frame_duration(ids[1], 0.5);
    wb.set_frame_duration(ids[2], 0.1);
    assert!(wb.start_animation());
    assert!(wb.is_animating());

    let until = std::time::Duration::from_millis(790);
    while let Some(token) = wb.scheduler_mut().next_due(until) {
        wb.on_timer(token);
    }
    assert_eq!(wb.current_frame_index(), 2);
    assert_eq!(wb.current_frame().map(|d| d.id()), Some(ids[2]));

    // Hiding the current frame clamps the playhead.
    wb.set_visible(ids[2], false);
    assert_eq!(wb.current_frame_index(), 1);
    assert_eq!(wb.visible_frames().len(), 2);

    wb.set_layout_mode(LayoutMode::Overlay);
    assert!(!wb.is_animating());
    assert!(wb.scheduler().pending().is_empty());
}

#[test]
fn removing_last_visible_frame_stops_playback() {
    let (mut wb, ids) = bench_with(1);
    wb.start_animation();
    wb.remove(ids[0]);
    assert!(!wb.is_animating());
    assert!(wb.current_frame().is_none());
}

#[test]
fn reorder_through_workbench() {
    let (mut wb, ids) = bench_with(3);
    assert_eq!(wb.reorder_frames(2, 0), Some(-1));
    let order: Vec<DocId> = wb.visible_frames().iter().map(|d| d.id()).collect();
    assert_eq!(order, vec![ids[2], ids[0], ids[1]]);
}

#[test]
fn export_reflects_flip_and_canvas() {
    let (mut wb, ids) = bench_with(1);
    wb.set_canvas_resize_mode(true);
    wb.edge_resize(ids[0], Edge::Top, Vec2::new(0.0, -10.0));
    let bytes = wb
        .export(ids[0], &DefaultCodec, ExportFormat::Png, None)
        .unwrap();
    let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (100, 60));
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
    assert_eq!(img.get_pixel(0, 10).0, [5, 6, 7, 255]);
    // Export does not bake.
    assert!(matches!(
        wb.document(ids[0]).unwrap().frame,
        Frame::Canvas(CanvasFrame { .. })
    ));
}

#[test]
fn summary_uses_configured_thumbnail_size() {
    let (wb, ids) = bench_with(1);
    let s = wb.summary(ids[0], &DefaultCodec).unwrap();
    assert_eq!(s.name, "img0");
    let thumb = image::load_from_memory(&s.thumbnail_bytes().unwrap()).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (100, 50));
}
