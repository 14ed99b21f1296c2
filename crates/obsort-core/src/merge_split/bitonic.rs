//! Bitonic compare-exchange networks over tagged records.
//!
//! The network sorts on a transient tag carried beside each record, so the
//! record's own routing key survives the pass. Compare-exchange swaps when
//! the left tag is strictly greater under ascending direction; equal tags
//! never swap, so ties stay left-biased.

use crate::record::Record;

/// A record paired with the transient key the network routes it by.
#[derive(Debug, Clone)]
pub struct Tagged {
    pub key: u32,
    pub record: Record,
}

impl Tagged {
    pub fn new(key: u32, record: Record) -> Self {
        Self { key, record }
    }
}

/// Sort `a[low..low + cnt]` by tag. `cnt` must be a power of two.
pub fn bitonic_sort(a: &mut [Tagged], low: usize, cnt: usize, ascending: bool) {
    if cnt > 1 {
        let k = cnt / 2;
        bitonic_sort(a, low, k, true);
        bitonic_sort(a, low + k, k, false);
        bitonic_merge(a, low, cnt, ascending);
    }
}

/// Merge a bitonic run `a[low..low + cnt]` into sorted order.
pub fn bitonic_merge(a: &mut [Tagged], low: usize, cnt: usize, ascending: bool) {
    if cnt > 1 {
        let k = cnt / 2;
        for i in low..low + k {
            let swap = if ascending {
                a[i].key > a[i + k].key
            } else {
                a[i].key < a[i + k].key
            };
            if swap {
                a.swap(i, i + k);
            }
        }
        bitonic_merge(a, low, k, ascending);
        bitonic_merge(a, low + k, k, ascending);
    }
}

/// Sort `items` ascending by tag while keeping the working set at
/// O(`window`) records: each `window`-sized run is sorted with the
/// in-enclave bitonic network, then runs are merged streamwise, doubling
/// the run length until the whole array is one run.
///
/// `items.len()` and `window` must be powers of two with
/// `window <= items.len()`.
pub fn streaming_bitonic_sort(items: &mut [Tagged], window: usize) {
    let n = items.len();
    let mut start = 0;
    while start < n {
        bitonic_sort(items, start, window.min(n - start), true);
        start += window;
    }
    if window >= n {
        return;
    }

    // Merge passes ping-pong between the array and a staging copy; each
    // pass moves records through a window-sized buffer.
    let mut scratch = items.to_vec();
    let mut src_is_items = true;
    let mut run = window;
    while run < n {
        let mut start = 0;
        while start < n {
            let mid = (start + run).min(n);
            let end = (start + 2 * run).min(n);
            if src_is_items {
                streaming_merge(items, start, mid, end, &mut scratch, window);
            } else {
                streaming_merge(&scratch, start, mid, end, items, window);
            }
            start += 2 * run;
        }
        src_is_items = !src_is_items;
        run *= 2;
    }
    if !src_is_items {
        items.clone_from_slice(&scratch);
    }
}

/// Merge the sorted runs `src[start..mid]` and `src[mid..end]` into
/// `dst[start..end]` through a buffer of at most `window` records.
fn streaming_merge(
    src: &[Tagged],
    start: usize,
    mid: usize,
    end: usize,
    dst: &mut [Tagged],
    window: usize,
) {
    let mut left = start;
    let mut right = mid;
    let mut out = start;
    let mut buffer: Vec<Tagged> = Vec::with_capacity(window);
    while left < mid || right < end {
        buffer.clear();
        while buffer.len() < window && (left < mid || right < end) {
            let take_left =
                right >= end || (left < mid && src[left].key <= src[right].key);
            if take_left {
                buffer.push(src[left].clone());
                left += 1;
            } else {
                buffer.push(src[right].clone());
                right += 1;
            }
        }
        dst[out..out + buffer.len()].clone_from_slice(&buffer);
        out += buffer.len();
    }
}
