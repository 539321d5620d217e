#[path = "../../d2h-root/tests/support/mod.rs"]
mod root_support;

use approx::assert_relative_eq;
use d2h_core::{BinnedSeries, ErrorGraph, HistBundle};
use root_support::{Graph1, GraphKind, Hist1, Storage, build_file, graph_payload, object, th1_payload};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_d2h"))
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn assert_success(out: &Output, what: &str) {
    assert!(
        out.status.success(),
        "{} should succeed, stderr={}",
        what,
        String::from_utf8_lossy(&out.stderr)
    );
}

fn s(p: &Path) -> &str {
    p.to_str().unwrap()
}

const EDGES: [f64; 4] = [1.0, 2.0, 4.0, 8.0];

fn fraction_bundle(path: &Path, content: [f64; 3]) {
    let mut b = HistBundle::new("fixture").unwrap();
    b.push_histogram(
        BinnedSeries::from_parts("hCorrFracNonPrompt", EDGES.to_vec(), content.to_vec(), vec![0.01; 3])
            .unwrap(),
    );
    b.write(path).unwrap();
}

#[test]
fn merge_fractions_takes_diagonal_and_blanks_following_bins() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<PathBuf> = (0..2).map(|i| dir.path().join(format!("frac_{i}.json"))).collect();
    fraction_bundle(&files[0], [0.10, 0.11, 0.12]);
    fraction_bundle(&files[1], [0.20, 0.21, 0.22]);
    let old = dir.path().join("old.json");
    fraction_bundle(&old, [0.09, 0.10, 0.11]);
    let image = dir.path().join("plots/merged.svg");

    let out = run(&["merge-fractions", s(&image), s(&old), s(&files[0]), s(&files[1])]);
    assert_success(&out, "merge-fractions");
    assert!(image.exists(), "missing plot {}", image.display());

    let b = HistBundle::read(&image.with_extension("json")).unwrap();
    let merged = b.histogram("hCorrFracNonPrompt").unwrap();
    assert_eq!(merged.content, vec![0.10, 0.21, 0.0]);
    let reference = b.histogram("hCorrFracNonPrompt_reference").unwrap();
    assert_eq!(reference.content, vec![0.09, 0.0, 0.0]);
    assert_eq!(b.plots[0].kind, "comparison");
    assert_eq!(b.meta.inputs.len(), 3);
}

#[test]
fn merge_histos_from_root_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut infiles = Vec::new();
    for i in 0..3 {
        let base = 10.0 * (i + 1) as f64;
        let h = Hist1::new("hEff", &EDGES, &[base, base + 1.0, base + 2.0])
            .with_sumw2(&[1.0, 4.0, 9.0]);
        let g = Graph1 {
            name: "gSigma".into(),
            title: String::new(),
            x: vec![1.5, 3.0, 6.0],
            y: vec![base; 3],
            ex_low: vec![0.5, 1.0, 2.0],
            ex_high: vec![0.5, 1.0, 2.0],
            ey_low: vec![0.1; 3],
            ey_high: vec![0.2; 3],
        };
        let bytes = build_file(
            &[
                object("TH1D", "hEff", th1_payload(&h, Storage::Double)),
                object("TGraphAsymmErrors", "gSigma", graph_payload(&g, GraphKind::Asymm)),
            ],
            i == 1,
        );
        let path = dir.path().join(format!("eff_{i}.root"));
        std::fs::write(&path, bytes).unwrap();
        infiles.push(path);
    }
    let outfile = dir.path().join("merged.json");

    let mut args = vec!["merge-histos", "-i"];
    args.extend(infiles.iter().map(|p| s(p)));
    args.extend(["-o", s(&outfile), "--template", "first"]);
    let out = run(&args);
    assert_success(&out, "merge-histos");

    let b = HistBundle::read(&outfile).unwrap();
    let h = b.histogram("hEff").unwrap();
    assert_eq!(h.content, vec![10.0, 21.0, 32.0]);
    assert_relative_eq!(h.errors[2], 3.0, epsilon = 1e-12);
    let g = b.graph("gSigma").unwrap();
    assert_eq!(g.y, vec![10.0, 20.0, 30.0]);
    assert_eq!(b.meta.inputs.len(), 3);
}

#[test]
fn merge_histos_named_objects_use_last_template() {
    let dir = tempfile::tempdir().unwrap();
    let mut infiles = Vec::new();
    for (i, title) in ["first", "second"].iter().enumerate() {
        let mut b = HistBundle::new("fixture").unwrap();
        let v = (i + 1) as f64;
        b.push_histogram(
            BinnedSeries::from_parts("hA", EDGES.to_vec(), vec![v; 3], vec![0.0; 3])
                .unwrap()
                .with_title(*title),
        );
        b.push_histogram(BinnedSeries::from_parts("hB", EDGES.to_vec(), vec![v; 3], vec![0.0; 3]).unwrap());
        b.push_graph(ErrorGraph::symmetric("g", vec![1.0], vec![v], vec![0.0], vec![0.0]).unwrap());
        let path = dir.path().join(format!("in_{i}.json"));
        b.write(&path).unwrap();
        infiles.push(path);
    }
    let outfile = dir.path().join("out.json");
    let out = run(&["merge-histos", "-i", s(&infiles[0]), s(&infiles[1]), "-o", s(&outfile), "-n", "hA"]);
    assert_success(&out, "merge-histos");

    let b = HistBundle::read(&outfile).unwrap();
    assert_eq!(b.names(), vec!["hA".to_string()]);
    let h = b.histogram("hA").unwrap();
    assert_eq!(h.title, "second");
    assert_eq!(h.content, vec![1.0, 2.0, 2.0]);
}

#[test]
fn merge_histomass_takes_ith_match_from_file_i() {
    let dir = tempfile::tempdir().unwrap();
    let mut infiles = Vec::new();
    for i in 0..2 {
        let mut b = HistBundle::new("fixture").unwrap();
        for pt in ["1_2", "2_4"] {
            b.push_histogram(
                BinnedSeries::from_parts(format!("hMass_{pt}"), vec![2.2, 2.3, 2.4], vec![i as f64; 2], vec![0.0; 2])
                    .unwrap(),
            );
        }
        let path = dir.path().join(format!("mass_{i}.json"));
        b.write(&path).unwrap();
        infiles.push(path);
    }
    let outfile = dir.path().join("mass.json");
    let out = run(&["merge-histomass", "-i", s(&infiles[0]), s(&infiles[1]), "-o", s(&outfile), "-n", "hMass"]);
    assert_success(&out, "merge-histomass");

    let b = HistBundle::read(&outfile).unwrap();
    assert_eq!(b.histogram("hMass_1_2").unwrap().content, vec![0.0, 0.0]);
    assert_eq!(b.histogram("hMass_2_4").unwrap().content, vec![1.0, 1.0]);

    let out = run(&["merge-histomass", "-i", s(&infiles[0]), "-o", s(&outfile), "-n", "hNone"]);
    assert!(!out.status.success());
}

#[test]
fn gather_input_copies_matching_objects() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.json");
    let mut b = HistBundle::new("fixture").unwrap();
    for name in ["hMassPt1", "hMassPt2", "hEff"] {
        b.push_histogram(BinnedSeries::new(name, vec![0.0, 1.0]).unwrap());
    }
    b.write(&input).unwrap();
    let cfg = dir.path().join("fitter.yml");
    std::fs::write(&cfg, "PtMin: [1, 2]\nPtMax: [2, 4]\nSgnFunc: [kGaus, kGaus]\n").unwrap();
    let out_path = dir.path().join("fitter_input.json");

    let out = run(&["gather-input", s(&input), "hMass", s(&out_path), "--fitter-config", s(&cfg)]);
    assert_success(&out, "gather-input");
    let b = HistBundle::read(&out_path).unwrap();
    assert_eq!(b.names(), vec!["hMassPt1".to_string(), "hMassPt2".to_string()]);
    assert_eq!(b.meta.inputs.len(), 2);

    std::fs::write(&cfg, "PtMin: [1, 2]\nPtMax: [2]\n").unwrap();
    let out = run(&["gather-input", s(&input), "hMass", s(&out_path), "--fitter-config", s(&cfg)]);
    assert!(!out.status.success());
}
