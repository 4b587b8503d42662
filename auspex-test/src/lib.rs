// Fixture builders for Auspex integration tests: synthetic codebases,
// histories, and a one-call pipeline runner.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use auspex_core::orchestrator::AnalysisInputs;
use auspex_core::types::{
    AnalysisReport, ChurnTrajectory, FileHistory, FileRecord, FileRole, GitHistorySummary,
};
use auspex_core::{AuspexConfig, AuspexPipeline, CancelFlag};

// ── File record builders ───────────────────────────────────────────

/// A small, unremarkable file.
pub fn plain_file(path: &str, imports: &[&str]) -> FileRecord {
    FileRecord {
        path: path.to_string(),
        lines: 60,
        functions: 3,
        classes: 0,
        imports: imports.iter().map(ToString::to_string).collect(),
        symbols: vec![],
        max_nesting: 2,
        completeness: 1.0,
        role: FileRole::Unknown,
        content: None,
    }
}

pub fn entry_point(path: &str, imports: &[&str]) -> FileRecord {
    FileRecord {
        role: FileRole::EntryPoint,
        ..plain_file(path, imports)
    }
}

/// A large, deeply nested file — the cognitive-load ceiling of a fixture.
pub fn dense_file(path: &str, imports: &[&str]) -> FileRecord {
    FileRecord {
        lines: 600,
        functions: 30,
        classes: 4,
        max_nesting: 7,
        ..plain_file(path, imports)
    }
}

/// A file carrying content for clone detection.
pub fn file_with_content(path: &str, content: &str) -> FileRecord {
    FileRecord {
        content: Some(content.to_string()),
        ..plain_file(path, &[])
    }
}

// ── Codebase topologies ────────────────────────────────────────────

/// A hub topology: `hub.rs` is dense and imported by 90% of the other
/// files. The importing leaves form a chain (each also imports its
/// predecessor) and grow in size with their index, so centrality and
/// cognitive load are dispersed and run in opposite directions; only the
/// hub tops both. The trailing 10% of leaves are fully isolated.
pub fn hub_codebase(n: usize) -> Vec<FileRecord> {
    assert!(n >= 10, "hub fixture needs at least 10 files");
    let mut files = vec![dense_file("src/hub.rs", &[])];
    let leaves = n - 1;
    let importers = leaves * 9 / 10;
    for i in 0..leaves {
        let path = format!("src/leaf_{i:02}.rs");
        let mut file = if i >= importers {
            plain_file(&path, &[])
        } else if i == 0 {
            plain_file(&path, &["src/hub.rs"])
        } else {
            let prev = format!("src/leaf_{:02}.rs", i - 1);
            plain_file(&path, &["src/hub.rs", &prev])
        };
        file.lines = 60 + 5 * u32::try_from(i).unwrap_or(0);
        files.push(file);
    }
    files
}

/// Two directories with dense internal wiring and a single cross link.
pub fn two_community_codebase() -> Vec<FileRecord> {
    let mut files = Vec::new();
    for group in ["alpha", "beta"] {
        for i in 0..5 {
            let mut imports: Vec<String> = (0..5)
                .filter(|&j| j != i)
                .map(|j| format!("src/{group}/n{j}.rs"))
                .collect();
            if group == "beta" && i == 0 {
                imports.push("src/alpha/n0.rs".to_string());
            }
            let import_refs: Vec<&str> = imports.iter().map(String::as_str).collect();
            files.push(plain_file(&format!("src/{group}/n{i}.rs"), &import_refs));
        }
    }
    files
}

/// A 10-file tree: below every percentile tier floor.
pub fn tiny_tree() -> Vec<FileRecord> {
    let mut files = vec![entry_point("main.rs", &["a.rs", "b.rs"])];
    files.push(plain_file("a.rs", &["c.rs"]));
    files.push(plain_file("b.rs", &["c.rs"]));
    files.push(plain_file("c.rs", &[]));
    for i in 0..6 {
        files.push(plain_file(&format!("extra_{i}.rs"), &["c.rs"]));
    }
    files
}

// ── History builders ───────────────────────────────────────────────

fn history_entry(changes: u32, bus_factor: u32, trajectory: ChurnTrajectory) -> FileHistory {
    FileHistory {
        total_changes: changes,
        trajectory,
        churn_slope: 0.1,
        churn_cv: 0.5,
        bus_factor,
        author_entropy: 1.2,
        fix_ratio: 0.2,
        refactor_ratio: 0.1,
        last_touched: None,
    }
}

/// Multi-author history where the hub is the hottest file in the tree
/// (or the coldest, when `hot_hub` is false).
pub fn hub_history(files: &[FileRecord], hot_hub: bool) -> GitHistorySummary {
    let mut summary = GitHistorySummary {
        author_count: 4,
        commit_count: 200,
        ..GitHistorySummary::default()
    };
    for (i, file) in files.iter().enumerate() {
        let is_hub = file.path.contains("hub");
        let changes = if is_hub {
            if hot_hub { 60 } else { 1 }
        } else {
            // Spread 2..=11 so the median sits well above 1
            2 + (i as u32 % 10)
        };
        let trajectory = if is_hub && hot_hub {
            ChurnTrajectory::Rising
        } else {
            ChurnTrajectory::Stable
        };
        summary
            .files
            .insert(file.path.clone(), history_entry(changes, 1, trajectory));
    }
    summary
}

/// A degenerate single-author history covering every file.
pub fn solo_history(files: &[FileRecord]) -> GitHistorySummary {
    let mut summary = GitHistorySummary {
        author_count: 1,
        commit_count: 50,
        ..GitHistorySummary::default()
    };
    for file in files {
        summary
            .files
            .insert(file.path.clone(), history_entry(10, 1, ChurnTrajectory::Stable));
    }
    summary
}

// ── Pipeline runner ────────────────────────────────────────────────

/// Run the standard pipeline with default settings.
pub fn run_analysis(
    files: Vec<FileRecord>,
    history: Option<GitHistorySummary>,
) -> anyhow::Result<AnalysisReport> {
    let pipeline = AuspexPipeline::new(AuspexConfig::default())?;
    let cancel: CancelFlag = Arc::new(AtomicBool::new(false));
    let inputs = AnalysisInputs {
        files,
        history,
        architecture: None,
    };
    Ok(pipeline.run(&inputs, &cancel)?)
}
