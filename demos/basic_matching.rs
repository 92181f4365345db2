//! Basic matching example demonstrating core functionality.
//!
//! Run with `RUST_LOG=debug` to see the pipeline's diagnostics.

use detection_overlap::{
    evaluate, load_config_from_str, KuhnMunkresSolver, LabelMap, MatchReport, ReportSummary,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Detection Overlap Example ===\n");

    // Example 1: Build label maps
    println!("1. Label Maps");
    let ground_truth = LabelMap::from_rows(vec![
        vec![1, 1, 1, 0, 0, 2, 2, 2],
        vec![1, 1, 1, 0, 0, 2, 2, 2],
        vec![1, 1, 1, 0, 0, 2, 2, 2],
        vec![0, 0, 0, 0, 0, 0, 0, 0],
        vec![3, 3, 0, 0, 0, 0, 0, 0],
        vec![3, 3, 0, 0, 0, 0, 0, 0],
    ])?;
    let reconstruction = LabelMap::from_rows(vec![
        vec![7, 7, 7, 0, 0, 8, 8, 9],
        vec![7, 7, 7, 7, 0, 8, 8, 9],
        vec![7, 7, 7, 0, 0, 8, 8, 9],
        vec![0, 0, 0, 0, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0, 0, 6, 6],
        vec![0, 0, 0, 0, 0, 0, 6, 6],
    ])?;
    println!("   Ground truth: 3 regions, reconstruction: 5 regions");
    println!();

    // Example 2: Load a configuration
    println!("2. Configuration");
    let config = load_config_from_str(r#"{ "min_distance": 0.5, "score_margin": 1.1 }"#)?;
    println!("   {:?}", config);
    println!();

    // Example 3: Match regions
    println!("3. Matching");
    let report: MatchReport = evaluate(
        &ground_truth,
        &reconstruction,
        &KuhnMunkresSolver::new(),
        Some(&config),
    )?;

    println!("   {}", MatchReport::column_names().join("\t"));
    for m in &report.matches {
        println!(
            "   {}\t{}\t{:.2}\t{:.2}\t{:.4}",
            m.gt_label, m.rec_label, m.m1, m.m2, m.dice
        );
    }
    println!("   False negatives: {:?}", report.false_negatives);
    println!("   False positives: {:?}", report.false_positives);
    println!();

    // Example 4: Summary
    println!("4. Summary");
    println!("{}", ReportSummary::from_report(&report));
    println!();
    println!("{}", report.to_json()?);

    Ok(())
}
