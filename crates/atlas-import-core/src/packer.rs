//! Recursive rectangle bin-packer with best-fit search and page-size
//! minimization.
//!
//! One generic packer serves every call site (graphics and font strips):
//! what happens to a rectangle after it lands is the caller's business, the
//! packer only decides where it lands.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::FitHeuristic;
use crate::model::Rect;

/// Anything with a packable size.
pub trait PackItem {
    fn pack_width(&self) -> u32;
    fn pack_height(&self) -> u32;
}

impl PackItem for crate::model::SourceImage {
    fn pack_width(&self) -> u32 {
        self.width
    }
    fn pack_height(&self) -> u32 {
        self.height
    }
}

/// Split orientation a free node inherits from its parent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitAxis {
    Horizontal,
    Vertical,
}

/// A free rectangle awaiting a placement. Lives only inside one layout pass.
#[derive(Debug, Clone, Copy)]
struct PackNode {
    bounds: Rect,
    split: SplitAxis,
}

/// One placed item and its final bounds on the page.
#[derive(Debug, Clone)]
pub struct Placement<T> {
    pub item: T,
    pub bounds: Rect,
}

/// One laid-out page: final dimensions plus placements in layout order.
#[derive(Debug, Clone)]
pub struct AtlasLayout<T> {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement<T>>,
}

impl<T> AtlasLayout<T> {
    /// Page bounds as a rect at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

/// Partitions `items` across as many `page_size` x `page_size` pages as
/// needed, then shrinks the last page to the smallest power-of-two-scaled
/// size that still holds its content. An empty input yields zero pages.
pub fn pack_all<T: PackItem>(
    items: Vec<T>,
    page_size: u32,
    padding: u32,
    heuristic: FitHeuristic,
) -> Vec<AtlasLayout<T>> {
    let mut remaining = items;
    let mut pages = Vec::new();
    while !remaining.is_empty() {
        let mut width = page_size;
        let mut height = page_size;
        let mut placed = layout_page(&remaining, width, height, padding, heuristic);
        if placed.is_empty() {
            // Nothing fit even at full page size. Oversized items are
            // rejected upstream; stop rather than loop on them.
            break;
        }
        if placed.len() == remaining.len() {
            // Last page. Halve until something no longer fits, then step
            // back once; a 0 dimension clamps to 1.
            loop {
                width /= 2;
                height /= 2;
                placed = layout_page(&remaining, width, height, padding, heuristic);
                if placed.len() != remaining.len() {
                    break;
                }
            }
            width = if width == 0 { 1 } else { width * 2 };
            height = if height == 0 { 1 } else { height * 2 };
            placed = layout_page(&remaining, width, height, padding, heuristic);
        }

        let mut slots: Vec<Option<T>> = remaining.into_iter().map(Some).collect();
        let mut placements = Vec::with_capacity(placed.len());
        for (idx, bounds) in placed {
            if let Some(item) = slots[idx].take() {
                placements.push(Placement { item, bounds });
            }
        }
        remaining = slots.into_iter().flatten().collect();

        pages.push(AtlasLayout {
            width,
            height,
            placements,
        });
    }
    pages
}

/// Lays out as many items as fit on one `width` x `height` page.
/// Returns `(item index, bounds)` pairs in placement order.
fn layout_page<T: PackItem>(
    items: &[T],
    width: u32,
    height: u32,
    padding: u32,
    heuristic: FitHeuristic,
) -> Vec<(usize, Rect)> {
    let mut free: VecDeque<PackNode> = VecDeque::new();
    free.push_back(PackNode {
        bounds: Rect::new(0, 0, width, height),
        split: SplitAxis::Horizontal,
    });

    let mut unplaced: Vec<usize> = (0..items.len()).collect();
    let mut placed: Vec<(usize, Rect)> = Vec::new();

    while let Some(node) = free.pop_front() {
        if unplaced.is_empty() {
            break;
        }
        // A node no candidate fits into is discarded, not re-queued.
        let Some(pos) = find_best_fit(&node, items, &unplaced, heuristic) else {
            continue;
        };
        let idx = unplaced.remove(pos);
        let w = items[idx].pack_width();
        let h = items[idx].pack_height();
        split_node(&node, w, h, padding, &mut free);
        placed.push((idx, Rect::new(node.bounds.x, node.bounds.y, w, h)));
    }
    placed
}

/// Best-fit search over the not-yet-placed items. Ties keep the first
/// candidate encountered, so caller iteration order is part of the contract.
fn find_best_fit<T: PackItem>(
    node: &PackNode,
    items: &[T],
    unplaced: &[usize],
    heuristic: FitHeuristic,
) -> Option<usize> {
    let node_area = (node.bounds.w * node.bounds.h) as f32;
    let mut best: Option<usize> = None;
    let mut max_criteria = 0.0f32;
    for (pos, &idx) in unplaced.iter().enumerate() {
        let w = items[idx].pack_width();
        let h = items[idx].pack_height();
        if w > node.bounds.w || h > node.bounds.h {
            continue;
        }
        let criteria = match heuristic {
            FitHeuristic::Area => (w * h) as f32 / node_area,
            FitHeuristic::MaxOneAxis => {
                let w_ratio = w as f32 / node.bounds.w as f32;
                let h_ratio = h as f32 / node.bounds.h as f32;
                w_ratio.max(h_ratio)
            }
        };
        if criteria > max_criteria {
            max_criteria = criteria;
            best = Some(pos);
        }
    }
    best
}

/// Splits a node around a placed `w` x `h` rectangle into up to two padded
/// children, enqueued at the back of the free queue. Children inherit the
/// alternating split orientation; empty children are dropped.
fn split_node(node: &PackNode, w: u32, h: u32, padding: u32, free: &mut VecDeque<PackNode>) {
    let bounds = node.bounds;
    let (right, below) = match node.split {
        SplitAxis::Horizontal => (
            child(
                bounds.x as i64 + w as i64 + padding as i64,
                bounds.y as i64,
                bounds.w as i64 - w as i64 - padding as i64,
                h as i64,
                SplitAxis::Vertical,
            ),
            child(
                bounds.x as i64,
                bounds.y as i64 + h as i64 + padding as i64,
                bounds.w as i64,
                bounds.h as i64 - h as i64 - padding as i64,
                SplitAxis::Horizontal,
            ),
        ),
        SplitAxis::Vertical => (
            child(
                bounds.x as i64 + w as i64 + padding as i64,
                bounds.y as i64,
                bounds.w as i64 - w as i64 - padding as i64,
                bounds.h as i64,
                SplitAxis::Vertical,
            ),
            child(
                bounds.x as i64,
                bounds.y as i64 + h as i64 + padding as i64,
                w as i64,
                bounds.h as i64 - h as i64 - padding as i64,
                SplitAxis::Horizontal,
            ),
        ),
    };
    if let Some(n) = right {
        free.push_back(n);
    }
    if let Some(n) = below {
        free.push_back(n);
    }
}

fn child(x: i64, y: i64, w: i64, h: i64, split: SplitAxis) -> Option<PackNode> {
    if w > 0 && h > 0 {
        Some(PackNode {
            bounds: Rect::new(x as u32, y as u32, w as u32, h as u32),
            split,
        })
    } else {
        None
    }
}
