// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Banded storage and the sweep that implements every boolean operation.
//!
//! A region is a y-sorted list of [`Band`]s. Each band covers the rows
//! `y0..y1` and holds x-sorted, disjoint, non-touching [`Span`]s. Two bands
//! that touch vertically never carry identical spans; the sweep merges them.
//! Together these rules make the representation a function of the covered
//! pixel set, so structural equality is set equality.

use alloc::vec::Vec;

use smallvec::SmallVec;

/// A horizontal run `x0..x1` inside a band.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Span {
    pub(crate) x0: i32,
    pub(crate) x1: i32,
}

pub(crate) type Spans = SmallVec<[Span; 4]>;

/// Rows `y0..y1` sharing one cross-section.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Band {
    pub(crate) y0: i32,
    pub(crate) y1: i32,
    pub(crate) spans: Spans,
}

/// Boolean operation applied pointwise by [`combine`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Union,
    Intersect,
    Subtract,
    Xor,
}

impl Op {
    #[inline]
    fn keep(self, in_a: bool, in_b: bool) -> bool {
        match self {
            Self::Union => in_a || in_b,
            Self::Intersect => in_a && in_b,
            Self::Subtract => in_a && !in_b,
            Self::Xor => in_a != in_b,
        }
    }
}

/// Combines two span lists, appending the canonical result to `out`.
fn combine_spans(a: &[Span], b: &[Span], op: Op, out: &mut Spans) {
    let mut xs: SmallVec<[i32; 16]> = SmallVec::new();
    for s in a.iter().chain(b) {
        xs.push(s.x0);
        xs.push(s.x1);
    }
    xs.sort_unstable();
    xs.dedup();

    let (mut ia, mut ib) = (0, 0);
    for w in xs.windows(2) {
        let (x0, x1) = (w[0], w[1]);
        while ia < a.len() && a[ia].x1 <= x0 {
            ia += 1;
        }
        while ib < b.len() && b[ib].x1 <= x0 {
            ib += 1;
        }
        // Every span edge is a breakpoint, so coverage is uniform on x0..x1.
        let in_a = ia < a.len() && a[ia].x0 <= x0;
        let in_b = ib < b.len() && b[ib].x0 <= x0;
        if !op.keep(in_a, in_b) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.x1 == x0 => last.x1 = x1,
            _ => out.push(Span { x0, x1 }),
        }
    }
}

/// Appends a band, merging it into the previous one when they touch and match.
pub(crate) fn push_band(out: &mut Vec<Band>, y0: i32, y1: i32, spans: Spans) {
    if y0 >= y1 || spans.is_empty() {
        return;
    }
    if let Some(last) = out.last_mut()
        && last.y1 == y0
        && last.spans == spans
    {
        last.y1 = y1;
        return;
    }
    out.push(Band { y0, y1, spans });
}

/// Applies `op` to two canonical band lists and returns a canonical result.
pub(crate) fn combine(a: &[Band], b: &[Band], op: Op) -> Vec<Band> {
    let mut ys: Vec<i32> = Vec::with_capacity(2 * (a.len() + b.len()));
    for band in a.iter().chain(b) {
        ys.push(band.y0);
        ys.push(band.y1);
    }
    ys.sort_unstable();
    ys.dedup();

    let mut out = Vec::new();
    let (mut ia, mut ib) = (0, 0);
    for w in ys.windows(2) {
        let (y0, y1) = (w[0], w[1]);
        while ia < a.len() && a[ia].y1 <= y0 {
            ia += 1;
        }
        while ib < b.len() && b[ib].y1 <= y0 {
            ib += 1;
        }
        let sa: &[Span] = if ia < a.len() && a[ia].y0 <= y0 {
            &a[ia].spans
        } else {
            &[]
        };
        let sb: &[Span] = if ib < b.len() && b[ib].y0 <= y0 {
            &b[ib].spans
        } else {
            &[]
        };
        if sa.is_empty() && sb.is_empty() {
            continue;
        }
        let mut spans = Spans::new();
        combine_spans(sa, sb, op, &mut spans);
        push_band(&mut out, y0, y1, spans);
    }
    out
}
