// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Records a synthetic page and exercises the replay and diagnostics pipeline.
//!
//! The page is recorded with a [`PrettyPrintSink`] attached, replayed once
//! through a [`TraceDevice`], replayed again on several threads at once into
//! [`CaptureDevice`]s, and one capture is written out as JSON.
//!
//! Set `RUST_LOG=debug` to see the recorder's and player's log messages.

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use kurbo::{Affine, BezPath, Rect, Shape as _, Stroke};
use reprise_core::color::{BlendMode, ColorParams, ColorSpace};
use reprise_core::cookie::Cookie;
use reprise_core::device::{Device as _, Paint};
use reprise_core::geometry::INFINITE_RECT;
use reprise_core::image::Image;
use reprise_core::list::DisplayList;
use reprise_core::payload::{
    FillRule, Font, Glyph, Path, Shade, Shading, ShadingKind, StrokeState, Text, TextRun,
};
use reprise_core::player::RunOutcome;
use reprise_core::recorder::{Recorder, RecorderConfig};
use reprise_core::trace::Tracer;

use reprise_debug::capture::CaptureDevice;
use reprise_debug::pretty::PrettyPrintSink;
use reprise_debug::trace_device::TraceDevice;

const PAGE: Rect = Rect::new(0.0, 0.0, 612.0, 792.0);
const THREADS: usize = 4;

fn main() {
    env_logger::init();

    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));

    // -- record ------------------------------------------------------------
    let logo = record_logo();
    let config = RecorderConfig {
        initial_capacity: 16,
        ..RecorderConfig::default()
    };
    let mut rec = Recorder::with_tracer(DisplayList::new(PAGE), config, Tracer::new(&mut pretty));
    draw_page(&mut rec, &logo);
    let list = rec.finish().expect("synthetic page is well nested");
    println!(
        "recorded {} nodes in {} slots, bounds {:?}",
        list.len(),
        list.slot_count(),
        list.bounds()
    );
    for tag in list.tags() {
        println!("  tag {:?} mcid={} nodes {}..{:?}", tag.tag, tag.id, tag.start, tag.end);
    }

    // -- replay once, traced -------------------------------------------------
    println!("\n-- replay (half size, top-left quarter) --");
    let mut device = TraceDevice::stdout();
    let mut tracer = Tracer::new(&mut pretty);
    let outcome = list.run_traced(
        &mut device,
        Affine::scale(0.5),
        Rect::new(0.0, 0.0, 153.0, 198.0),
        None,
        &mut tracer,
    );
    println!("outcome: {outcome:?}");

    // -- replay concurrently -------------------------------------------------
    let transforms: Vec<Affine> = (0..THREADS)
        .map(|i| Affine::translate((100.0 * i as f64, 0.0)))
        .collect();
    let captures: Vec<CaptureDevice> = std::thread::scope(|scope| {
        let handles: Vec<_> = transforms
            .iter()
            .map(|&ctm| {
                let list = list.clone();
                scope.spawn(move || {
                    let mut capture = CaptureDevice::new();
                    list.run(&mut capture, ctm, INFINITE_RECT, None);
                    capture
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("replay thread panicked"))
            .collect()
    });
    let counts: Vec<usize> = captures.iter().map(|c| c.calls().len()).collect();
    println!("\n{THREADS} concurrent replays issued {counts:?} calls");

    // -- cancellation --------------------------------------------------------
    let cookie = Cookie::new();
    cookie.abort();
    let mut discard = CaptureDevice::new();
    let outcome = list.run(&mut discard, Affine::IDENTITY, INFINITE_RECT, Some(&cookie));
    assert_eq!(outcome, RunOutcome::Aborted);
    println!(
        "aborted replay: progress {}/{}, incomplete={}",
        cookie.progress(),
        cookie.progress_max(),
        cookie.is_incomplete()
    );

    // -- export ----------------------------------------------------------------
    let path = "replay.json";
    let file = File::create(path).expect("failed to create replay.json");
    let mut writer = BufWriter::new(file);
    captures[0]
        .write_json(&mut writer)
        .expect("failed to write replay.json");
    println!("Wrote {path} ({} calls)", captures[0].calls().len());
}

/// A small list drawn later as an image.
fn record_logo() -> DisplayList {
    let rgb = ColorSpace::DeviceRgb;
    let mut rec = Recorder::new(DisplayList::new(Rect::new(0.0, 0.0, 64.0, 64.0)));
    let mut star = BezPath::new();
    star.move_to((32.0, 2.0));
    star.line_to((50.0, 62.0));
    star.line_to((2.0, 24.0));
    star.line_to((62.0, 24.0));
    star.line_to((14.0, 62.0));
    star.close_path();
    rec.fill_path(
        &Path::new(star),
        FillRule::EvenOdd,
        Affine::IDENTITY,
        &Paint::new(&rgb, &[0.9, 0.6, 0.1]),
    );
    rec.finish().expect("logo is well nested")
}

fn draw_page(rec: &mut Recorder<'_>, logo: &DisplayList) {
    let gray = ColorSpace::DeviceGray;
    let rgb = ColorSpace::DeviceRgb;
    let spot = ColorSpace::custom("PANTONE 186 C", 1);
    let white = Paint::new(&gray, &[1.0]);
    let black = Paint::new(&gray, &[0.0]);
    let blue = Paint::new(&rgb, &[0.1, 0.2, 0.8]);

    rec.fill_path(&rect(PAGE), FillRule::NonZero, Affine::IDENTITY, &white);

    // Header band with a title.
    rec.begin_marked_content("H1", 0);
    rec.fill_path(
        &rect(Rect::new(36.0, 36.0, 576.0, 96.0)),
        FillRule::NonZero,
        Affine::IDENTITY,
        &blue,
    );
    rec.fill_text(&title(), Affine::translate((48.0, 76.0)), &white);
    rec.end_layer();

    // Body columns, each clipped to its box.
    let hairline = StrokeState::new(Stroke::new(0.5));
    for (i, x) in [36.0, 316.0].into_iter().enumerate() {
        let column = Rect::new(x, 120.0, x + 260.0, 700.0);
        rec.begin_marked_content("P", i32::try_from(i + 1).unwrap_or(i32::MAX));
        rec.clip_path(&rect(column), FillRule::NonZero, Affine::IDENTITY, INFINITE_RECT);
        for line in 0..20 {
            let y = 130.0 + 24.0 * f64::from(line);
            rec.fill_path(
                &rect(Rect::new(x + 4.0, y, x + 250.0, y + 10.0)),
                FillRule::NonZero,
                Affine::IDENTITY,
                &black.with_alpha(0.6),
            );
        }
        rec.stroke_path(&rect(column), &hairline, Affine::IDENTITY, &black);
        rec.pop_clip();
        rec.end_layer();
    }

    // A soft-masked, blended gradient.
    rec.begin_mask(
        Rect::new(36.0, 710.0, 576.0, 760.0),
        true,
        &gray,
        &[0.0],
        ColorParams::default(),
    );
    rec.fill_path(
        &rect(Rect::new(36.0, 710.0, 576.0, 760.0)),
        FillRule::NonZero,
        Affine::IDENTITY,
        &Paint::new(&gray, &[0.8]),
    );
    rec.end_mask();
    rec.begin_group(
        Rect::new(36.0, 710.0, 576.0, 760.0),
        Some(&rgb),
        true,
        false,
        BlendMode::Multiply,
        0.9,
    );
    rec.fill_shade(
        &Shade::new(Shading {
            colorspace: ColorSpace::DeviceRgb,
            bbox: Some(Rect::new(36.0, 710.0, 576.0, 760.0)),
            kind: ShadingKind::Axial {
                start: (36.0, 735.0).into(),
                end: (576.0, 735.0).into(),
                extend: [true, true],
            },
        }),
        Affine::IDENTITY,
        1.0,
        ColorParams::default(),
    );
    rec.end_group();
    rec.pop_clip();

    // A spot-colored footer rule drawn through a pattern tile.
    rec.begin_tile(
        Rect::new(36.0, 770.0, 576.0, 776.0),
        Rect::new(0.0, 0.0, 6.0, 6.0),
        6.0,
        6.0,
        Affine::translate((36.0, 770.0)),
        186,
    );
    rec.fill_path(
        &rect(Rect::new(0.0, 0.0, 3.0, 6.0)),
        FillRule::NonZero,
        Affine::translate((36.0, 770.0)),
        &Paint::new(&spot, &[1.0]),
    );
    rec.end_tile();

    // The logo, placed as an image rendered from its own list.
    let image = Image::from_display_list(64.0, 64.0, Affine::scale(1.0 / 64.0), logo.clone());
    rec.fill_image(
        &image,
        Affine::new([48.0, 0.0, 0.0, 48.0, 520.0, 42.0]),
        1.0,
        ColorParams::default(),
    );
}

fn rect(r: Rect) -> Path {
    Path::new(r.to_path(0.1))
}

fn title() -> Text {
    let font = Arc::new(Font {
        name: "Helvetica-Bold".into(),
        bbox: Rect::new(-0.17, -0.23, 1.0, 0.96),
    });
    let glyphs = "Quarterly report"
        .chars()
        .enumerate()
        .map(|(i, ch)| Glyph {
            id: u32::from(ch),
            x: 14.0 * i as f64,
            y: 0.0,
        })
        .collect();
    Text::new(vec![TextRun {
        font,
        trm: Affine::scale(24.0),
        glyphs,
    }])
}
