//! Line diff between the remote article body and the locally composed one.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLine<'a> {
    Same(&'a str),
    Removed(&'a str),
    Added(&'a str),
}

/// Longest-common-subsequence line diff.
///
/// Uses Hirschberg's divide and conquer, so memory stays linear in the
/// number of lines.
pub fn diff_lines<'a>(old: &'a str, new: &'a str) -> Vec<DiffLine<'a>> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();
    let mut out = Vec::with_capacity(a.len().max(b.len()));
    diff_into(&a, &b, &mut out);
    out
}

fn diff_into<'a>(a: &[&'a str], b: &[&'a str], out: &mut Vec<DiffLine<'a>>) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    out.extend(a[..prefix].iter().map(|l| DiffLine::Same(*l)));
    let (a, b) = (&a[prefix..], &b[prefix..]);

    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, tail) = a.split_at(a.len() - suffix);
    let b = &b[..b.len() - suffix];

    match a.len() {
        0 => out.extend(b.iter().map(|l| DiffLine::Added(*l))),
        _ if b.is_empty() => out.extend(a.iter().map(|l| DiffLine::Removed(*l))),
        1 => match b.iter().position(|l| *l == a[0]) {
            Some(k) => {
                out.extend(b[..k].iter().map(|l| DiffLine::Added(*l)));
                out.push(DiffLine::Same(a[0]));
                out.extend(b[k + 1..].iter().map(|l| DiffLine::Added(*l)));
            }
            None => {
                out.push(DiffLine::Removed(a[0]));
                out.extend(b.iter().map(|l| DiffLine::Added(*l)));
            }
        },
        _ => {
            let mid = a.len() / 2;
            let left = lcs_row(&a[..mid], b);
            let a_rev: Vec<&str> = a[mid..].iter().rev().copied().collect();
            let b_rev: Vec<&str> = b.iter().rev().copied().collect();
            let right = lcs_row(&a_rev, &b_rev);
            let mut split = 0;
            let mut best = 0;
            for j in 0..=b.len() {
                let score = left[j] + right[b.len() - j];
                if score > best {
                    best = score;
                    split = j;
                }
            }
            diff_into(&a[..mid], &b[..split], out);
            diff_into(&a[mid..], &b[split..], out);
        }
    }

    out.extend(tail.iter().map(|l| DiffLine::Same(*l)));
}

/// `row[j]` is the LCS length of all of `a` and the first `j` lines of `b`.
fn lcs_row(a: &[&str], b: &[&str]) -> Vec<usize> {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            cur[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev
}

/// Unified diff with `context` lines around each change. Empty when the
/// inputs have the same lines.
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str, context: usize) -> String {
    let lines = diff_lines(old, new);
    let changed: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| !matches!(l, DiffLine::Same(_)))
        .map(|(i, _)| i)
        .collect();
    if changed.is_empty() {
        return String::new();
    }

    // Group changes whose context windows touch into hunks.
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for &i in &changed {
        let start = i.saturating_sub(context);
        let end = (i + context + 1).min(lines.len());
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => hunks.push((start, end)),
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "--- {old_label}");
    let _ = writeln!(out, "+++ {new_label}");
    for (start, end) in hunks {
        let (old_start, new_start) = positions(&lines[..start]);
        let (old_len, new_len) = positions(&lines[start..end]);
        let _ = writeln!(
            out,
            "@@ -{},{} +{},{} @@",
            old_start + 1,
            old_len,
            new_start + 1,
            new_len
        );
        for line in &lines[start..end] {
            let _ = match line {
                DiffLine::Same(l) => writeln!(out, " {l}"),
                DiffLine::Removed(l) => writeln!(out, "-{l}"),
                DiffLine::Added(l) => writeln!(out, "+{l}"),
            };
        }
    }
    out
}

/// Number of old and new lines covered by a slice of the diff.
fn positions(lines: &[DiffLine<'_>]) -> (usize, usize) {
    lines.iter().fold((0, 0), |(old, new), l| match l {
        DiffLine::Same(_) => (old + 1, new + 1),
        DiffLine::Removed(_) => (old + 1, new),
        DiffLine::Added(_) => (old, new + 1),
    })
}
