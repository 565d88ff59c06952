use rstest::*;
use tempfile::tempdir;

use peakrep_core::models::{Replicate, ReplicateSet, Window, WindowList};
use peakrep_stats::config::RunConfig;
use peakrep_stats::correction::CorrectionMethod;
use peakrep_stats::pipeline::run;
use peakrep_stats::scoring::ScorerType;

/// Two chromosomes, four samples (two experiment/control pairs). Both
/// experiments share an enriched block on chr1.
#[fixture]
fn windows() -> WindowList {
    let mut windows = Vec::new();
    for (chr, n) in [(0u32, 400u32), (1, 150)] {
        for i in 0..n {
            let peak = chr == 0 && (100..108).contains(&i);
            let exp1 = 3 + (i * 7) % 5 + if peak { 30 } else { 0 };
            let ctl1 = 3 + (i * 3) % 4;
            let exp2 = 2 + (i * 11) % 6 + if peak { 25 } else { 0 };
            let ctl2 = 2 + (i * 5) % 5;
            windows.push(Window::new(chr, i * 200, vec![exp1, ctl1, exp2, ctl2]));
        }
    }
    WindowList::new(vec!["chr1".to_string(), "chr2".to_string()], 200, windows).unwrap()
}

#[fixture]
fn replicates() -> ReplicateSet {
    ReplicateSet::new(
        vec![Replicate::new("rep1", 0, 0, 1), Replicate::new("rep2", 1, 2, 3)],
        4,
    )
    .unwrap()
}

fn config(scorer: ScorerType, correction: CorrectionMethod) -> RunConfig {
    RunConfig {
        workers: 3,
        scorer,
        correction,
        seed: Some(17),
        ..Default::default()
    }
}

mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[rstest]
    #[case(CorrectionMethod::BenjaminiHochberg)]
    #[case(CorrectionMethod::StoreySimple)]
    #[case(CorrectionMethod::StoreyBootstrapSpline)]
    fn test_run_values_in_unit_interval(
        windows: WindowList,
        replicates: ReplicateSet,
        #[case] correction: CorrectionMethod,
    ) {
        let cfg = config(ScorerType::LambdaTable, correction);
        let output = run(&windows, &replicates, &cfg).unwrap();

        for r in 0..replicates.len() {
            let p = output.scores.p_values(r).unwrap();
            let q = output.scores.q_values(r).unwrap();
            assert_eq!(p.len(), windows.len());
            assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(q.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert_eq!(output.pi_zero.len(), 2);
        assert_eq!(
            output.pi_zero[0].is_some(),
            correction != CorrectionMethod::BenjaminiHochberg
        );
    }

    #[rstest]
    fn test_scorers_agree_end_to_end(windows: WindowList, replicates: ReplicateSet) {
        let direct = run(
            &windows,
            &replicates,
            &config(ScorerType::Direct, CorrectionMethod::BenjaminiHochberg),
        )
        .unwrap();
        let table = run(
            &windows,
            &replicates,
            &config(ScorerType::LambdaTable, CorrectionMethod::BenjaminiHochberg),
        )
        .unwrap();

        for r in 0..2 {
            assert_eq!(
                direct.scores.p_values(r).unwrap(),
                table.scores.p_values(r).unwrap()
            );
        }
        assert_eq!(direct.correlation, table.correlation);
    }

    #[rstest]
    fn test_enriched_block_becomes_a_peak(windows: WindowList, replicates: ReplicateSet) {
        let output = run(
            &windows,
            &replicates,
            &config(ScorerType::LambdaTable, CorrectionMethod::BenjaminiHochberg),
        )
        .unwrap();

        for peaks in &output.peaks {
            let hit = peaks
                .iter()
                .find(|p| p.chr == "chr1" && p.start <= 100 * 200 && p.end > 100 * 200)
                .expect("enriched block should be called");
            assert!(hit.n_windows >= 6);
            assert!(hit.score > 5.0);
        }
    }

    #[rstest]
    fn test_correlation_matrix_shape(windows: WindowList, replicates: ReplicateSet) {
        let output = run(
            &windows,
            &replicates,
            &config(ScorerType::LambdaTable, CorrectionMethod::StoreySimple),
        )
        .unwrap();

        let matrix = &output.correlation;
        assert_eq!(matrix.n(), 2);
        assert_eq!(matrix.get(0, 0), 1.0);
        assert_eq!(matrix.get(1, 1), 1.0);
        assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
        assert!(matrix.get(0, 1).is_finite());
    }

    #[rstest]
    fn test_self_normalization_run(windows: WindowList, replicates: ReplicateSet) {
        let mut cfg = config(ScorerType::Direct, CorrectionMethod::BenjaminiHochberg);
        cfg.self_normalize = true;
        cfg.p_value_cutoff = 1e-3;

        let output = run(&windows, &replicates, &cfg).unwrap();
        let p = output.scores.p_values(0).unwrap();
        assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[rstest]
    fn test_invalid_config_fails_before_running(windows: WindowList, replicates: ReplicateSet) {
        let mut cfg = config(ScorerType::Direct, CorrectionMethod::BenjaminiHochberg);
        cfg.scales.clear();
        assert!(run(&windows, &replicates, &cfg).is_err());
    }

    #[rstest]
    fn test_replicates_must_match_windows(windows: WindowList) {
        let replicates = ReplicateSet::new(vec![Replicate::new("rep", 0, 0, 5)], 6).unwrap();
        let cfg = config(ScorerType::Direct, CorrectionMethod::BenjaminiHochberg);
        assert!(run(&windows, &replicates, &cfg).is_err());
    }

    #[rstest]
    fn test_config_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");

        let cfg = config(ScorerType::Direct, CorrectionMethod::StoreyBootstrapSpline);
        cfg.to_file(&path).unwrap();
        let loaded = RunConfig::from_file(&path).unwrap();
        assert_eq!(loaded, cfg);

        std::fs::write(&path, "workers = 0\n").unwrap();
        assert!(RunConfig::from_file(&path).is_err());
        assert!(RunConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
