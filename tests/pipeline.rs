mod common;

use common::synthetic::{
    flat_edges, quadrant_features, quadrant_labels, split_ensemble, trivial_ensemble,
};
use superpixel_refine::prelude::*;

/// Flood-fill pixel count of the 4-connected component containing `start`.
fn component_size(labels: &LabelImage, start: (usize, usize)) -> usize {
    let target = labels.get(start.0, start.1);
    let mut seen = vec![false; labels.w * labels.h];
    let mut stack = vec![start];
    let mut count = 0;
    while let Some((x, y)) = stack.pop() {
        let i = y * labels.w + x;
        if seen[i] || labels.data[i] != target {
            continue;
        }
        seen[i] = true;
        count += 1;
        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < labels.w {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < labels.h {
            stack.push((x, y + 1));
        }
    }
    count
}

#[test]
fn quadrant_map_is_stable_under_relaxation() {
    // Distinct per-quadrant features and symmetric costs: relaxation must
    // not move anything, and canonicalization must reproduce the input
    // numbering exactly.
    let labels = quadrant_labels(4);
    let features = quadrant_features(4, [0.0, 10.0, 20.0, 30.0]);
    let edges = flat_edges(4, 4, 0.5);
    let opts = RelaxOptions {
        max_iters: 5,
        threads: 2,
        sigx: 1.0,
        sigc: 1.0,
        sige: 0.0,
        sigs: 0.0,
    };
    let out = relax_and_canonicalize(&labels, &features, &edges, &opts).unwrap();
    assert_eq!(out, labels);
}

#[test]
fn canonical_labels_are_contiguous_and_4_connected() {
    // A map with shared labels across disconnected blobs and a wrap-around
    // region exercises both the split and the union paths.
    let labels = LabelImage::from_vec(
        6,
        4,
        vec![
            7, 7, 3, 3, 7, 7, //
            7, 2, 2, 2, 2, 7, //
            7, 2, 9, 9, 2, 7, //
            7, 2, 2, 2, 2, 7,
        ],
    );
    let out = canonicalize_labels(&labels).unwrap();

    let max = out.max_label();
    let mut counts = vec![0usize; max as usize + 1];
    for &l in &out.data {
        assert!(l >= 1, "labels must start at 1");
        counts[l as usize] += 1;
    }
    for (l, &c) in counts.iter().enumerate().skip(1) {
        assert!(c > 0, "label {l} has no pixels");
    }
    // Every region is a single 4-connected component.
    for y in 0..out.h {
        for x in 0..out.w {
            let l = out.get(x, y) as usize;
            assert_eq!(component_size(&out, (x, y)), counts[l]);
        }
    }
    // Left and right arms of label 7 connect through nothing: they split.
    assert_ne!(out.get(0, 0), out.get(4, 0));
}

#[test]
fn canonicalization_is_idempotent() {
    let labels = LabelImage::from_vec(
        5,
        3,
        vec![
            4, 4, 6, 6, 6, //
            4, 6, 6, 4, 4, //
            4, 4, 4, 4, 9,
        ],
    );
    let once = canonicalize_labels(&labels).unwrap();
    let twice = canonicalize_labels(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn boundary_pixels_separate_differing_regions() {
    let labels = quadrant_labels(8);
    let edges = flat_edges(8, 8, 0.5);
    let bounds = extract_boundaries(&labels, &edges, 2).unwrap();

    // A pixel surrounded by its own label on all four sides, two pixels
    // away from any other region, is never boundary.
    assert_ne!(bounds.get(1, 1), 0);
    assert_ne!(bounds.get(6, 6), 0);
    // The quadrant divide is marked on exactly one side.
    let mid_pair = (bounds.get(3, 1), bounds.get(4, 1));
    assert!(mid_pair.0 == 0 || mid_pair.1 == 0);
    assert!(mid_pair.0 != 0 || mid_pair.1 != 0);
}

#[test]
fn merge_with_infinite_threshold_collapses_everything() {
    let labels = quadrant_labels(8);
    let edges = flat_edges(8, 8, 0.5);
    let bounds = extract_boundaries(&labels, &edges, 2).unwrap();
    let merged = merge_weak_boundaries(&bounds, &edges, f32::INFINITY).unwrap();
    let first = merged.data[0];
    assert_ne!(first, 0);
    assert!(merged.data.iter().all(|&l| l == first));
}

#[test]
fn merge_with_zero_threshold_preserves_the_partition() {
    let labels = quadrant_labels(8);
    let mut edges = flat_edges(8, 8, 0.0);
    // Strong responses along the divide keep it intact.
    for i in 0..8 {
        edges.set(3, i, 0.9);
        edges.set(4, i, 0.9);
        edges.set(i, 3, 0.9);
        edges.set(i, 4, 0.9);
    }
    let bounds = extract_boundaries(&labels, &edges, 2).unwrap();
    let merged = merge_weak_boundaries(&bounds, &edges, 0.0).unwrap();
    let mut seen: Vec<u32> = merged.data.clone();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 4, "quadrants must survive a zero threshold");
}

#[test]
fn trivial_ensemble_gives_unit_affinity() {
    let labels = quadrant_labels(8);
    let edges = flat_edges(8, 8, 0.0);
    let ens = trivial_ensemble(8, 8, 4, 2, 3);
    let a = estimate_affinities(&labels, &edges, &ens, 2).unwrap();

    assert_eq!(a.nrows(), 4);
    for s in 0..4 {
        for t in 0..4 {
            if s == t {
                assert_eq!(a[(s, t)], 0.0, "diagonal must stay uncomputed");
            } else {
                assert_eq!(a[(s, t)], a[(t, s)]);
                if a[(s, t)] != 0.0 {
                    assert!((a[(s, t)] - 1.0).abs() < 1e-5);
                }
            }
        }
    }
    // Horizontally adjacent quadrants share sampled windows.
    assert!((a[(0, 1)] - 1.0).abs() < 1e-5);
}

#[test]
fn full_pipeline_produces_a_bounded_edge_map() {
    let size = 8usize;
    let labels = quadrant_labels(size);
    let features = quadrant_features(size, [0.0, 1.0, 2.0, 3.0]);
    let mut edges = flat_edges(size, size, 0.05);
    for i in 0..size {
        edges.set(3, i, 0.6);
        edges.set(i, 3, 0.6);
    }

    let refined = relax_and_canonicalize(&labels, &features, &edges, &RelaxOptions::default())
        .unwrap();
    let bounds = extract_boundaries(&refined, &edges, 2).unwrap();
    let ens = split_ensemble(size, size, 4, 2, 3);
    let a = estimate_affinities(&bounds, &edges, &ens, 2).unwrap();
    let synth = synthesize_edges(&bounds, &a).unwrap();

    assert_eq!((synth.w, synth.h), (size, size));
    for y in 0..size {
        for x in 0..size {
            let v = synth.get(x, y);
            assert!((0.0..=1.0).contains(&v), "edge value {v} out of range");
            if bounds.get(x, y) != 0 {
                assert_eq!(v, 0.01, "non-boundary pixels carry the floor");
            } else {
                assert!(v >= 0.01);
            }
        }
    }
}

#[test]
fn operations_do_not_mutate_their_inputs() {
    let labels = quadrant_labels(4);
    let features = quadrant_features(4, [0.0, 5.0, 10.0, 15.0]);
    let edges = flat_edges(4, 4, 0.5);
    let labels_before = labels.clone();
    let edges_before = edges.data.clone();

    let _ = relax_and_canonicalize(&labels, &features, &edges, &RelaxOptions::default()).unwrap();
    let bounds = extract_boundaries(&labels, &edges, 1).unwrap();
    let _ = merge_weak_boundaries(&bounds, &edges, 0.1).unwrap();

    assert_eq!(labels, labels_before);
    assert_eq!(edges.data, edges_before);
}
