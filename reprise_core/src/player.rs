// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replays a display list against a device.
//!
//! The player walks the nodes forward, rebuilding absolute state with a
//! [`Decoder`], and re-issues each call with the caller's transform applied.
//! It never writes to the list, so any number of replays may share one.
//!
//! # Culling
//!
//! A scissor stack starts at the caller's scissor and narrows at every
//! replayed clip, mask, or group. A node whose rect misses the top of that
//! stack is skipped. A skipped clip, mask, or group skips everything up to
//! its matching pop. Tiles, and everything inside them, are never culled by
//! geometry: a tile's rect describes its area, not its content. Layer and
//! marked-content nodes always replay, even inside a tile the device has
//! cached, so the target sees balanced structure.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::cookie::Cookie;
use crate::device::{Device, Paint};
use crate::geometry::{intersect, is_empty, transform_rect};
use crate::image::Image;
use crate::list::DisplayList;
use crate::node::{Command, Decoded, Decoder, NodeFlags, Payload};
use crate::payload::{Path, Shade, StrokeState, Text};
#[cfg(feature = "trace-rich")]
use crate::trace::NodeCulledEvent;
use crate::trace::{RunBeginEvent, RunSummaryBuilder, Tracer};

/// How a replay ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// Every node was consumed.
    Complete,
    /// The cookie asked for an abort; output is partial.
    Aborted,
}

/// Replays `list` into `device`. See [`DisplayList::run`].
pub fn run(
    list: &DisplayList,
    device: &mut dyn Device,
    ctm: Affine,
    scissor: Rect,
    cookie: Option<&Cookie>,
    tracer: &mut Tracer<'_>,
) -> RunOutcome {
    let data = list.data();
    let slots = data.store.slots();
    let total = data.store.node_count();
    if let Some(cookie) = cookie {
        cookie.begin(total);
    }
    tracer.run_begin(&RunBeginEvent {
        nodes: total,
        ctm,
        scissor,
    });

    let mut summary = RunSummaryBuilder::new(total);
    let mut state = Decoder::new();
    let mut scissors = vec![scissor];
    let mut clipped = 0_usize;
    let mut tiled = 0_usize;
    // Open tiles inside a tile the device already has cached.
    let mut tile_skip = 0_usize;
    let mut offset = 0;
    let mut index = 0;
    let mut outcome = RunOutcome::Complete;

    while offset < slots.len() {
        if let Some(cookie) = cookie {
            if cookie.is_abort_requested() {
                cookie.mark_incomplete();
                log::debug!("replay aborted after {index} of {total} nodes");
                outcome = RunOutcome::Aborted;
                break;
            }
        }

        let node = state.decode(&slots[offset..]);
        offset += usize::from(node.header.size);
        index += 1;
        summary.visit();
        if let Some(cookie) = cookie {
            cookie.advance(index);
        }

        let command = node.header.command;
        let structural = matches!(
            command,
            Command::BeginLayer | Command::BeginMarkedContent | Command::EndLayer
        );

        if tile_skip > 0 && !structural {
            match command {
                Command::BeginTile => tile_skip += 1,
                Command::EndTile => {
                    tile_skip -= 1;
                    if tile_skip == 0 {
                        tiled = tiled.saturating_sub(1);
                        device.end_tile();
                        summary.issue();
                        continue;
                    }
                }
                _ => {}
            }
            summary.cull();
            continue;
        }

        let top = scissors.last().copied().unwrap_or(scissor);
        let trans_rect = transform_rect(ctm, state.rect);
        let geometric = tiled == 0
            && !structural
            && !matches!(
                command,
                Command::BeginTile
                    | Command::EndTile
                    | Command::RenderFlags
                    | Command::DefaultColorSpaces
                    | Command::PopClip
                    | Command::EndMask
                    | Command::EndGroup
            );
        let culled = geometric && is_empty(intersect(trans_rect, top));

        if !structural && (clipped > 0 || culled) {
            #[cfg(feature = "trace-rich")]
            let nested = clipped > 0;
            let visible = match command {
                c if c.is_clip_push() => {
                    clipped += 1;
                    false
                }
                Command::PopClip | Command::EndGroup if clipped > 0 => {
                    clipped -= 1;
                    false
                }
                Command::PopClip | Command::EndGroup | Command::EndMask => clipped == 0,
                _ => false,
            };
            if !visible {
                summary.cull();
                #[cfg(feature = "trace-rich")]
                tracer.node_culled(&NodeCulledEvent {
                    index: index - 1,
                    command,
                    rect: trans_rect,
                    nested,
                });
                continue;
            }
        }

        let trans_ctm = ctm * state.ctm;
        let clip_scissor = intersect(trans_rect, top);
        summary.issue();
        issue(
            device,
            &state,
            &node,
            trans_ctm,
            trans_rect,
            clip_scissor,
            &mut scissors,
            &mut tiled,
            &mut tile_skip,
        );
    }

    tracer.run_summary(&summary.finish(outcome));
    outcome
}

/// Re-issues one decoded node.
fn issue(
    device: &mut dyn Device,
    state: &Decoder,
    node: &Decoded<'_>,
    ctm: Affine,
    rect: Rect,
    clip_scissor: Rect,
    scissors: &mut Vec<Rect>,
    tiled: &mut usize,
    tile_skip: &mut usize,
) {
    let flags = node.header.flags;
    let paint = Paint {
        colorspace: &state.colorspace,
        color: state.color(),
        alpha: state.alpha,
        params: flags.color_params(),
    };
    match node.header.command {
        Command::FillPath => device.fill_path(path(state), flags.fill_rule(), ctm, &paint),
        Command::StrokePath => device.stroke_path(path(state), stroke(state), ctm, &paint),
        Command::ClipPath => {
            device.clip_path(path(state), flags.fill_rule(), ctm, clip_scissor);
            scissors.push(clip_scissor);
        }
        Command::ClipStrokePath => {
            device.clip_stroke_path(path(state), stroke(state), ctm, clip_scissor);
            scissors.push(clip_scissor);
        }
        Command::FillText => device.fill_text(text(node), ctm, &paint),
        Command::StrokeText => device.stroke_text(text(node), stroke(state), ctm, &paint),
        Command::ClipText => {
            device.clip_text(text(node), ctm, clip_scissor);
            scissors.push(clip_scissor);
        }
        Command::ClipStrokeText => {
            device.clip_stroke_text(text(node), stroke(state), ctm, clip_scissor);
            scissors.push(clip_scissor);
        }
        Command::IgnoreText => device.ignore_text(text(node), ctm),
        Command::FillShade => {
            device.fill_shade(shade(node), ctm, state.alpha, paint.params);
        }
        Command::FillImage => {
            device.fill_image(image(node), ctm, state.alpha, paint.params);
        }
        Command::FillImageMask => device.fill_image_mask(image(node), ctm, &paint),
        Command::ClipImageMask => {
            device.clip_image_mask(image(node), ctm, clip_scissor);
            scissors.push(clip_scissor);
        }
        Command::PopClip => {
            pop_scissor(scissors);
            device.pop_clip();
        }
        Command::BeginMask => {
            let luminosity = flags.contains(NodeFlags::LUMINOSITY);
            device.begin_mask(rect, luminosity, &state.colorspace, state.color(), paint.params);
            scissors.push(clip_scissor);
        }
        Command::EndMask => device.end_mask(),
        Command::BeginGroup => {
            let Some(Payload::Group { colorspace, blend }) = node.payload else {
                malformed(node);
            };
            device.begin_group(
                rect,
                colorspace.as_ref(),
                flags.contains(NodeFlags::ISOLATED),
                flags.contains(NodeFlags::KNOCKOUT),
                *blend,
                state.alpha,
            );
            scissors.push(clip_scissor);
        }
        Command::EndGroup => {
            pop_scissor(scissors);
            device.end_group();
        }
        Command::BeginTile => {
            let Some(&Payload::Tile {
                view,
                xstep,
                ystep,
                id,
            }) = node.payload
            else {
                malformed(node);
            };
            *tiled += 1;
            if device.begin_tile(rect, view, xstep, ystep, ctm, id) {
                *tile_skip = 1;
            }
        }
        Command::EndTile => {
            *tiled = tiled.saturating_sub(1);
            device.end_tile();
        }
        Command::RenderFlags => {
            let Some(&Payload::RenderFlags { set, clear }) = node.payload else {
                malformed(node);
            };
            device.render_flags(set, clear);
        }
        Command::DefaultColorSpaces => {
            let Some(Payload::DefaultColorSpaces(defaults)) = node.payload else {
                malformed(node);
            };
            device.set_default_colorspaces(defaults);
        }
        Command::BeginLayer => {
            let Some(Payload::Layer(name)) = node.payload else {
                malformed(node);
            };
            device.begin_layer(name);
        }
        Command::BeginMarkedContent => {
            let Some(Payload::MarkedContent { tag, mcid }) = node.payload else {
                malformed(node);
            };
            device.begin_marked_content(tag, *mcid);
        }
        Command::EndLayer => device.end_layer(),
    }
}

/// Pops a replayed scope's scissor, keeping the caller's at the bottom.
fn pop_scissor(scissors: &mut Vec<Rect>) {
    if scissors.len() > 1 {
        scissors.pop();
    }
}

fn path(state: &Decoder) -> &Path {
    match &state.path {
        Some(path) => path,
        None => panic!("malformed display list: path command before any path"),
    }
}

fn stroke(state: &Decoder) -> &StrokeState {
    match &state.stroke {
        Some(stroke) => stroke,
        None => panic!("malformed display list: stroke command before any stroke state"),
    }
}

fn text<'s>(node: &Decoded<'s>) -> &'s Text {
    match node.payload {
        Some(Payload::Text(text)) => text,
        _ => malformed(node),
    }
}

fn shade<'s>(node: &Decoded<'s>) -> &'s Shade {
    match node.payload {
        Some(Payload::Shade(shade)) => shade,
        _ => malformed(node),
    }
}

fn image<'s>(node: &Decoded<'s>) -> &'s Image {
    match node.payload {
        Some(Payload::Image(image)) => image,
        _ => malformed(node),
    }
}

#[cold]
fn malformed(node: &Decoded<'_>) -> ! {
    panic!(
        "malformed display list: {:?} node with payload {:?}",
        node.header.command, node.payload
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorParams;
    use crate::device::Device as _;
    use crate::geometry::INFINITE_RECT;
    use crate::payload::FillRule;
    use crate::recorder::Recorder;
    use crate::testing::{Call, GRAY, Log, black, rect_path, red, sample_page};

    fn fill(rec: &mut Recorder<'_>, x0: f64, y0: f64, x1: f64, y1: f64) {
        rec.fill_path(
            &rect_path(x0, y0, x1, y1),
            FillRule::NonZero,
            Affine::IDENTITY,
            &black(),
        );
    }

    fn clip(rec: &mut Recorder<'_>, x0: f64, y0: f64, x1: f64, y1: f64) {
        rec.clip_path(
            &rect_path(x0, y0, x1, y1),
            FillRule::NonZero,
            Affine::IDENTITY,
            INFINITE_RECT,
        );
    }

    fn page() -> Recorder<'static> {
        Recorder::new(DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0)))
    }

    fn replay(list: &DisplayList, ctm: Affine, scissor: Rect) -> Log<'static> {
        let mut log = Log::default();
        let outcome = list.run(&mut log, ctm, scissor, None);
        assert_eq!(outcome, RunOutcome::Complete);
        log
    }

    const SMALL: Rect = Rect::new(0.0, 0.0, 20.0, 20.0);

    #[test]
    fn empty_list_issues_nothing() {
        let list = DisplayList::new(Rect::ZERO);
        let cookie = Cookie::new();
        let mut log = Log::default();
        let outcome = list.run(&mut log, Affine::IDENTITY, INFINITE_RECT, Some(&cookie));
        assert_eq!(outcome, RunOutcome::Complete);
        assert!(log.calls.is_empty());
        assert_eq!(cookie.progress_max(), 0);
        assert!(!cookie.is_incomplete());
    }

    #[test]
    fn replay_is_repeatable() {
        let list = sample_page();
        let first = replay(&list, Affine::IDENTITY, INFINITE_RECT);
        let second = replay(&list, Affine::IDENTITY, INFINITE_RECT);
        assert_eq!(first.calls.len(), list.len(), "nothing culled without a scissor");
        assert_eq!(first.calls, second.calls);
    }

    #[test]
    fn sample_page_call_order() {
        let list = sample_page();
        let log = replay(&list, Affine::IDENTITY, INFINITE_RECT);
        assert_eq!(
            log.names(),
            [
                "fill_path",
                "clip_path",
                "fill_path",
                "stroke_path",
                "pop_clip",
                "begin_group",
                "fill_shade",
                "end_group",
                "begin_marked_content",
                "fill_text",
                "end_layer",
                "begin_tile",
                "fill_path",
                "end_tile",
            ]
        );
    }

    #[test]
    fn replay_rebuilds_paint() {
        let mut rec = page();
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        rec.fill_path(
            &rect_path(0.0, 0.0, 10.0, 10.0),
            FillRule::NonZero,
            Affine::IDENTITY,
            &red().with_alpha(0.5),
        );
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        let list = rec.finish().unwrap();

        let log = replay(&list, Affine::IDENTITY, INFINITE_RECT);
        let paints: Vec<_> = log.calls.iter().map(|c| (c.color.clone(), c.alpha)).collect();
        assert_eq!(
            paints,
            [
                (alloc::vec![0.0], 1.0),
                (alloc::vec![1.0, 0.0, 0.0], 0.5),
                (alloc::vec![0.0], 1.0),
            ]
        );
    }

    #[test]
    fn caller_transform_composes_with_recorded_one() {
        let mut rec = page();
        rec.fill_path(
            &rect_path(0.0, 0.0, 10.0, 10.0),
            FillRule::NonZero,
            Affine::scale(2.0),
            &black(),
        );
        let list = rec.finish().unwrap();

        let outer = Affine::translate((10.0, 0.0));
        let log = replay(&list, outer, INFINITE_RECT);
        assert_eq!(log.calls.len(), 1);
        assert_eq!(log.calls[0].ctm, outer * Affine::scale(2.0));
        assert_eq!(log.calls[0].rect, Rect::new(10.0, 0.0, 30.0, 20.0));
    }

    #[test]
    fn fill_outside_scissor_is_skipped() {
        let mut rec = page();
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        fill(&mut rec, 50.0, 50.0, 60.0, 60.0);
        let list = rec.finish().unwrap();

        assert_eq!(replay(&list, Affine::IDENTITY, SMALL).calls.len(), 1);
        assert_eq!(replay(&list, Affine::IDENTITY, INFINITE_RECT).calls.len(), 2);
        // Moving the page brings the second fill into view instead.
        let moved = replay(&list, Affine::translate((-45.0, -45.0)), SMALL);
        assert_eq!(moved.calls.len(), 1);
        assert_eq!(moved.calls[0].rect, Rect::new(5.0, 5.0, 15.0, 15.0));
    }

    #[test]
    fn culled_clip_skips_its_subtree() {
        let mut rec = page();
        clip(&mut rec, 50.0, 50.0, 60.0, 60.0);
        fill(&mut rec, 52.0, 52.0, 58.0, 58.0);
        rec.pop_clip();
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        let list = rec.finish().unwrap();

        let log = replay(&list, Affine::IDENTITY, SMALL);
        assert_eq!(log.names(), ["fill_path"]);
        assert_eq!(log.calls[0].rect, Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn nested_scopes_under_a_culled_clip_stay_skipped() {
        let mut rec = page();
        clip(&mut rec, 50.0, 50.0, 60.0, 60.0);
        rec.begin_group(
            Rect::new(50.0, 50.0, 60.0, 60.0),
            None,
            false,
            false,
            crate::color::BlendMode::Normal,
            1.0,
        );
        clip(&mut rec, 50.0, 50.0, 60.0, 60.0);
        fill(&mut rec, 52.0, 52.0, 58.0, 58.0);
        rec.pop_clip();
        rec.end_group();
        rec.pop_clip();
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        let list = rec.finish().unwrap();

        let log = replay(&list, Affine::IDENTITY, SMALL);
        assert_eq!(log.names(), ["fill_path"]);
    }

    #[test]
    fn culled_mask_skips_through_its_pop() {
        let mut rec = page();
        rec.begin_mask(
            Rect::new(50.0, 50.0, 60.0, 60.0),
            true,
            &GRAY,
            &[0.0],
            ColorParams::default(),
        );
        fill(&mut rec, 52.0, 52.0, 58.0, 58.0);
        rec.end_mask();
        fill(&mut rec, 52.0, 52.0, 58.0, 58.0);
        rec.pop_clip();
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        let list = rec.finish().unwrap();

        let log = replay(&list, Affine::IDENTITY, SMALL);
        assert_eq!(log.names(), ["fill_path"]);

        let all = replay(&list, Affine::IDENTITY, INFINITE_RECT);
        assert_eq!(
            all.names(),
            ["begin_mask", "fill_path", "end_mask", "fill_path", "pop_clip", "fill_path"]
        );
    }

    #[test]
    fn clip_scissor_is_the_tightened_rect() {
        let mut rec = page();
        clip(&mut rec, 10.0, 10.0, 30.0, 30.0);
        fill(&mut rec, 15.0, 15.0, 20.0, 20.0);
        rec.pop_clip();
        let list = rec.finish().unwrap();

        let log = replay(&list, Affine::IDENTITY, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(log.names(), ["clip_path", "fill_path", "pop_clip"]);
        assert_eq!(log.calls[0].rect, Rect::new(15.0, 15.0, 20.0, 20.0));
    }

    #[test]
    fn scissor_narrows_inside_a_clip() {
        let mut rec = page();
        clip(&mut rec, 0.0, 0.0, 50.0, 50.0);
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        fill(&mut rec, 40.0, 40.0, 45.0, 45.0);
        rec.pop_clip();
        let list = rec.finish().unwrap();

        // The clip's rect shrinks to the content, then the scissor (0..20)
        // narrows it further; the second fill is outside both.
        let log = replay(&list, Affine::IDENTITY, SMALL);
        assert_eq!(log.names(), ["clip_path", "fill_path", "pop_clip"]);
        assert_eq!(log.calls[0].rect, SMALL.intersect(Rect::new(0.0, 0.0, 45.0, 45.0)));
    }

    #[test]
    fn layers_replay_inside_culled_clips() {
        let mut rec = page();
        clip(&mut rec, 50.0, 50.0, 60.0, 60.0);
        rec.begin_layer("ocg");
        fill(&mut rec, 52.0, 52.0, 58.0, 58.0);
        rec.end_layer();
        rec.pop_clip();
        let list = rec.finish().unwrap();

        let log = replay(&list, Affine::IDENTITY, SMALL);
        assert_eq!(log.names(), ["begin_layer", "end_layer"]);
    }

    fn tiled_list() -> DisplayList {
        let mut rec = page();
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        let view = Rect::new(0.0, 0.0, 10.0, 10.0);
        rec.begin_tile(area, view, 10.0, 10.0, Affine::IDENTITY, 7);
        fill(&mut rec, 500.0, 500.0, 505.0, 505.0);
        rec.begin_tile(area, view, 10.0, 10.0, Affine::IDENTITY, 0);
        fill(&mut rec, 0.0, 0.0, 5.0, 5.0);
        rec.end_tile();
        rec.end_tile();
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        rec.finish().unwrap()
    }

    #[test]
    fn tile_content_is_never_culled() {
        let list = tiled_list();
        let log = replay(&list, Affine::IDENTITY, SMALL);
        assert_eq!(
            log.names(),
            [
                "begin_tile",
                "fill_path",
                "begin_tile",
                "fill_path",
                "end_tile",
                "end_tile",
                "fill_path",
            ]
        );
    }

    #[test]
    fn cached_tile_skips_content_but_still_ends() {
        let list = tiled_list();
        let mut log = Log {
            cache_tiles: true,
            ..Log::default()
        };
        list.run(&mut log, Affine::IDENTITY, INFINITE_RECT, None);
        assert_eq!(log.names(), ["begin_tile", "end_tile", "fill_path"]);
    }

    #[test]
    fn layers_straddling_a_cached_tile_stay_balanced() {
        let mut rec = page();
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        let view = Rect::new(0.0, 0.0, 10.0, 10.0);
        rec.begin_tile(area, view, 10.0, 10.0, Affine::IDENTITY, 3);
        rec.begin_layer("L");
        fill(&mut rec, 0.0, 0.0, 5.0, 5.0);
        rec.end_tile();
        rec.end_layer();
        rec.begin_marked_content("P", 1);
        rec.begin_tile(area, view, 10.0, 10.0, Affine::IDENTITY, 4);
        fill(&mut rec, 0.0, 0.0, 5.0, 5.0);
        rec.end_layer();
        rec.end_tile();
        let list = rec.finish().unwrap();

        let mut log = Log {
            cache_tiles: true,
            ..Log::default()
        };
        list.run(&mut log, Affine::IDENTITY, INFINITE_RECT, None);
        assert_eq!(
            log.names(),
            [
                "begin_tile",
                "begin_layer",
                "end_tile",
                "end_layer",
                "begin_marked_content",
                "begin_tile",
                "end_layer",
                "end_tile",
            ]
        );
        let names = log.names();
        let opens = names
            .iter()
            .filter(|n| matches!(**n, "begin_layer" | "begin_marked_content"))
            .count();
        let closes = names.iter().filter(|n| **n == "end_layer").count();
        assert_eq!(opens, closes, "structure must stay balanced");
    }

    #[test]
    fn abort_before_first_node() {
        let list = sample_page();
        let cookie = Cookie::new();
        cookie.abort();
        let mut log = Log::default();
        let outcome = list.run(&mut log, Affine::IDENTITY, INFINITE_RECT, Some(&cookie));
        assert_eq!(outcome, RunOutcome::Aborted);
        assert!(log.calls.is_empty());
        assert!(cookie.is_incomplete());
        assert_eq!(cookie.progress(), 0);
        assert_eq!(cookie.progress_max(), list.len());
    }

    #[test]
    fn abort_mid_run_stops_at_node_boundary() {
        let mut rec = page();
        for i in 0_i32..5 {
            let x = f64::from(i) * 10.0;
            fill(&mut rec, x, 0.0, x + 5.0, 5.0);
        }
        let list = rec.finish().unwrap();

        let cookie = Cookie::new();
        let mut log = Log {
            abort_after: Some((2, &cookie)),
            ..Log::default()
        };
        let outcome = list.run(&mut log, Affine::IDENTITY, INFINITE_RECT, Some(&cookie));
        assert_eq!(outcome, RunOutcome::Aborted);
        assert_eq!(log.calls.len(), 2);
        assert_eq!(cookie.progress(), 2);
        assert!(cookie.is_incomplete());
    }

    #[test]
    fn progress_reaches_node_count() {
        let list = sample_page();
        let cookie = Cookie::new();
        let outcome = list.run(
            &mut crate::device::NullDevice,
            Affine::IDENTITY,
            SMALL,
            Some(&cookie),
        );
        assert_eq!(outcome, RunOutcome::Complete);
        assert_eq!(cookie.progress(), list.len(), "culled nodes still count");
        assert_eq!(cookie.progress_max(), list.len());
        assert!(!cookie.is_incomplete());
    }

    #[test]
    fn concurrent_replays_match_sequential_ones() {
        let list = sample_page();
        let transforms: Vec<Affine> = [0.0, 100.0, 200.0, 300.0]
            .into_iter()
            .map(|dx| Affine::translate((dx, 0.0)))
            .collect();
        let expected: Vec<Vec<Call>> = transforms
            .iter()
            .map(|&ctm| replay(&list, ctm, INFINITE_RECT).calls)
            .collect();

        let list = &list;
        let results: Vec<Vec<Call>> = std::thread::scope(|s| {
            let handles: Vec<_> = transforms
                .iter()
                .map(|&ctm| s.spawn(move || replay(list, ctm, INFINITE_RECT).calls))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results, expected);
        assert_eq!(list.strong_count(), 1);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn summary_counts_issued_and_culled() {
        use crate::trace::{RunSummary, TraceSink};

        #[derive(Default)]
        struct Summaries(Vec<RunSummary>);
        impl TraceSink for Summaries {
            fn on_run_summary(&mut self, s: &RunSummary) {
                self.0.push(*s);
            }
        }

        let mut rec = page();
        fill(&mut rec, 0.0, 0.0, 10.0, 10.0);
        clip(&mut rec, 50.0, 50.0, 60.0, 60.0);
        fill(&mut rec, 52.0, 52.0, 58.0, 58.0);
        rec.pop_clip();
        let list = rec.finish().unwrap();

        let mut sink = Summaries::default();
        let mut tracer = Tracer::new(&mut sink);
        let mut log = Log::default();
        list.run_traced(&mut log, Affine::IDENTITY, SMALL, None, &mut tracer);
        drop(tracer);

        let [summary] = sink.0.as_slice() else {
            panic!("expected one summary, got {:?}", sink.0);
        };
        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.visited, 4);
        assert_eq!(summary.issued, 1);
        assert_eq!(summary.culled, 3);
        assert_eq!(summary.outcome, RunOutcome::Complete);
    }
}
