//! Property-based tests for placement invariants.
//!
//! - Every image is placed exactly once
//! - In-text placements follow sequence order
//! - Reference placements clear their tier threshold
//! - Scanning is deterministic

use figure_oxide::config::TierThresholds;
use figure_oxide::document::ImageReinserter;
use figure_oxide::model::{ImageDescriptor, PlacementSource};
use figure_oxide::scanner::ReferenceScanner;
use proptest::prelude::*;

const VOCABULARY: &[&str] = &[
    "",
    "## 第二章 诊断",
    "本节介绍治疗方案的基本原则。",
    "如图 2-1 所示",
    "见图 3-2",
    "诊疗流程如图所示",
    "具体步骤见下图",
    "一张插图",
    "参见图",
    "示意图如下",
    "See Figure 1.4 for the workflow.",
    "As shown in the chart, treatment starts early.",
    "Plain sentence without references.",
    "——————",
    "表 4-1 列出了结果",
];

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCABULARY), 0..60).prop_map(|lines| lines.join("\n"))
}

fn images_strategy() -> impl Strategy<Value = Vec<ImageDescriptor>> {
    prop::collection::vec(prop::option::of(1u32..=12), 0..25).prop_map(|pages| {
        pages
            .into_iter()
            .enumerate()
            .map(|(i, page)| ImageDescriptor {
                sequence_index: i as u32 + 1,
                source_page: page,
                file_reference: format!("images/doc/image_{:03}.png", i + 1),
            })
            .collect()
    })
}

fn marker(image: &ImageDescriptor) -> String {
    format!("![image]({})", image.file_reference)
}

/// Property: every image gets exactly one assignment and one marker
#[test]
fn proptest_total_coverage_without_duplicates() {
    proptest!(|(text in text_strategy(), images in images_strategy(), total in prop::option::of(1u32..=10))| {
        let report = ImageReinserter::with_defaults().reinsert(&text, &images, total, &marker).unwrap();

        let seqs: Vec<u32> = report.assignments.iter().map(|a| a.image.sequence_index).collect();
        let expected: Vec<u32> = images.iter().map(|i| i.sequence_index).collect();
        prop_assert_eq!(seqs, expected);

        for image in &images {
            let count = report.text.lines().filter(|l| *l == marker(image)).count();
            prop_assert_eq!(count, 1, "image {} inserted {} times", image.sequence_index, count);
        }
    });
}

/// Property: in-text targets never decrease with sequence index; end-of-document markers trail the text
#[test]
fn proptest_order_preservation() {
    proptest!(|(text in text_strategy(), images in images_strategy(), total in prop::option::of(1u32..=10))| {
        let report = ImageReinserter::with_defaults().reinsert(&text, &images, total, &marker).unwrap();
        let line_count = if text.is_empty() { 0 } else { text.split('\n').count() };

        let in_text: Vec<usize> = report
            .assignments
            .iter()
            .filter(|a| a.source.is_in_text())
            .map(|a| a.target_line)
            .collect();
        prop_assert!(in_text.windows(2).all(|w| w[0] <= w[1]), "targets {:?}", in_text);
        prop_assert!(in_text.iter().all(|&t| t < line_count));

        for a in report.assignments.iter().filter(|a| a.source == PlacementSource::EndOfDocument) {
            prop_assert_eq!(a.target_line, line_count);
        }

        // Markers appear in the output in sequence order
        let markers: Vec<&str> = report.text.lines().filter(|l| l.starts_with("![image](")).collect();
        let mut sorted = markers.clone();
        sorted.sort();
        prop_assert_eq!(markers, sorted);
    });
}

/// Property: reference placements meet their tier's threshold
#[test]
fn proptest_threshold_respect() {
    proptest!(|(text in text_strategy(), images in images_strategy())| {
        let thresholds = TierThresholds::default();
        let report = ImageReinserter::with_defaults().reinsert(&text, &images, None, &marker).unwrap();

        for a in &report.assignments {
            if let PlacementSource::Reference { tier } = a.source {
                prop_assert!(a.confidence + 1e-6 >= thresholds.for_tier(tier));
            }
        }
    });
}

/// Property: scanning the same text twice yields the same candidates
#[test]
fn proptest_scan_idempotent() {
    proptest!(|(text in text_strategy())| {
        let lines: Vec<&str> = if text.is_empty() { Vec::new() } else { text.split('\n').collect() };
        let scanner = ReferenceScanner::with_defaults();
        prop_assert_eq!(scanner.scan(&lines), scanner.scan(&lines));
    });
}

/// Property: arbitrary Unicode input never panics
#[test]
fn proptest_arbitrary_text_no_panic() {
    proptest!(ProptestConfig::with_cases(64), |(text in "\\PC{0,400}", images in images_strategy())| {
        let report = ImageReinserter::with_defaults().reinsert(&text, &images, Some(3), &marker);
        prop_assert!(report.is_ok());
    });
}
