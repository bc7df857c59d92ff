// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, call tracing, and JSON capture for reprise diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: a [`TraceSink`](reprise_core::trace::TraceSink)
//!   writing one line per record or replay event.
//! - [`trace_device::TraceDevice`]: a [`Device`](reprise_core::device::Device)
//!   writing one indented line per call it receives.
//! - [`capture::CaptureDevice`]: a device storing every call as a
//!   [`Call`](capture::Call) value, exportable as JSON.

pub mod capture;
pub mod pretty;
pub mod trace_device;

/// Formats a rect as `x0,y0,x1,y1`, or `inf` when unbounded.
pub(crate) fn fmt_rect(rect: kurbo::Rect) -> String {
    if reprise_core::geometry::is_infinite(rect) {
        "inf".to_owned()
    } else {
        format!("{},{},{},{}", rect.x0, rect.y0, rect.x1, rect.y1)
    }
}

/// Formats an affine as its six coefficients.
pub(crate) fn fmt_affine(ctm: kurbo::Affine) -> String {
    let [a, b, c, d, e, f] = ctm.as_coeffs();
    format!("[{a} {b} {c} {d} {e} {f}]")
}
