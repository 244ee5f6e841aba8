#![cfg(unix)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use alnbench_predict::{
    OptionSet, PredictEvent, PredictSecondaryTask, PsiBlastStructureTool, Q3Prediction, Q3Store,
    TaskStatus, DATABASE_OPT, ITERATIONS_OPT, NUM_ALIGNMENTS_OPT, NUM_DESCRIPTIONS_OPT,
    OUTPUT_FORMAT_OPT,
};
use alnbench_seq::{BioString, Grammar};

const EVENT_TIMEOUT: Duration = Duration::from_secs(20);

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    let mut permissions = fs::metadata(path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).unwrap();
}

fn write_net(path: &Path, inputs: usize, outputs: usize) {
    let mut text = String::from("# ALN-NN\n");
    text.push_str(&format!("layers: {} {}\n", inputs, outputs));
    for neuron in 0..outputs {
        let weight = 0.01 * (neuron as f32 + 1.0);
        let mut line = String::new();
        for _ in 0..inputs {
            line.push_str(&format!("{} ", weight));
        }
        line.push_str("0.0\n");
        text.push_str(&line);
    }
    fs::write(path, text).unwrap();
}

// A psiblast stand-in that reports progress and finds no hits: the PSSM file
// is left empty
const NO_HITS_SCRIPT: &str = "#!/bin/sh
cat > /dev/null
printf '# PROGRESS: 1 2 1 4\\n'
printf '# PROGRESS: 1 2 4 4\\n'
printf '# PROGRESS: 2 2 4 4\\n'
exit 0
";

// A psiblast stand-in that writes a three-row AG-PSSM to the requested file
const HITS_SCRIPT: &str = "#!/bin/sh
out=''
prev=''
for a in \"$@\"; do
  if [ \"$prev\" = '-ag_pssm_file' ]; then out=\"$a\"; fi
  prev=\"$a\"
done
cat > /dev/null
printf '# PROGRESS: 1 2 2 2\\n'
printf '# PROGRESS: 2 2 2 2\\n'
cat > \"$out\" <<'EOF'
# AG-PSSM - fake search output
# PSI_SCALE_FACTOR: 200

   A R N D C Q E G H I L K M F P S T W Y V
   1 M 1 2 3 4 5 -1 -2 -3 -4 -5 0 1 2 3 4 5 -1 -2 -3 -4
   2 S 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0
   3 T 5 4 3 2 1 0 -1 -2 -3 -4 -5 5 4 3 2 1 0 -1 -2 -3
EOF
exit 0
";

const SLEEP_SCRIPT: &str = "#!/bin/sh
sleep 5
exit 0
";

const FAILING_SCRIPT: &str = "#!/bin/sh
cat > /dev/null
echo 'BLAST Database error: no alias or index file found' 1>&2
exit 2
";

struct Fixture {
    _dir: tempfile::TempDir,
    psiblast: PathBuf,
    stage1: PathBuf,
    stage2: PathBuf,
}

fn fixture(script: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let psiblast = dir.path().join("psiblast");
    write_script(&psiblast, script);
    let stage1 = dir.path().join("nn-sec-stage1.net");
    let stage2 = dir.path().join("nn-sec-stage2.net");
    write_net(&stage1, 315, 3);
    write_net(&stage2, 60, 3);
    Fixture { _dir: dir, psiblast, stage1, stage2 }
}

fn options() -> OptionSet {
    let mut options = OptionSet::new();
    options.set(ITERATIONS_OPT, 2);
    options.set(DATABASE_OPT, "testdb");
    options
}

fn query() -> BioString {
    BioString::new("MSSIRKTYVLKLYVAGNTPNSVRALRTLNHILETEFQGVYALKVIDVLKNPQLA", Grammar::Amino)
}

fn collect_run(tool: &PsiBlastStructureTool) -> Vec<PredictEvent> {
    let mut events = Vec::new();
    loop {
        let event = tool
            .events()
            .recv_timeout(EVENT_TIMEOUT)
            .expect("the run must reach a terminal event");
        let terminal = !matches!(event, PredictEvent::ProgressChanged { .. });
        events.push(event);
        if terminal {
            return events;
        }
    }
}

#[test]
fn forced_options_reduce_report_output() {
    let fixture = fixture(NO_HITS_SCRIPT);
    let tool = PsiBlastStructureTool::new(&fixture.psiblast, options(), &fixture.stage1, &fixture.stage2);
    assert_eq!(tool.options().value(OUTPUT_FORMAT_OPT), Some("10"));
    assert_eq!(tool.options().value(NUM_ALIGNMENTS_OPT), Some("1"));
    assert_eq!(tool.options().value(NUM_DESCRIPTIONS_OPT), Some("1"));
    assert_eq!(tool.options().value(ITERATIONS_OPT), Some("2"));
}

#[test]
fn no_hits_finishes_with_an_empty_prediction() {
    let fixture = fixture(NO_HITS_SCRIPT);
    let mut tool =
        PsiBlastStructureTool::new(&fixture.psiblast, options(), &fixture.stage1, &fixture.stage2);

    tool.predict_secondary(7, &query());
    let events = collect_run(&tool);
    assert!(!tool.is_running());

    match events.last() {
        Some(PredictEvent::Finished { id, prediction }) => {
            assert_eq!(*id, 7);
            assert!(prediction.is_empty());
        }
        other => panic!("expected Finished, got {:?}", other),
    }
    // No error, no cancellation
    assert!(events
        .iter()
        .all(|e| !matches!(e, PredictEvent::Error { .. } | PredictEvent::Canceled { .. })));

    // The wrapper progress lines are collapsed into fractions; the run closes
    // with the 1/1 marker because not every iteration necessarily ran
    let progress: Vec<(u64, u64)> = events
        .iter()
        .filter_map(|e| match e {
            PredictEvent::ProgressChanged { current, total } => Some((*current, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress.first(), Some(&(1, 8)));
    assert_eq!(progress.last(), Some(&(1, 1)));
}

#[test]
fn hits_produce_a_prediction() {
    let fixture = fixture(HITS_SCRIPT);
    let mut tool =
        PsiBlastStructureTool::new(&fixture.psiblast, options(), &fixture.stage1, &fixture.stage2);

    tool.predict_secondary(3, &query());
    let events = collect_run(&tool);

    match events.last() {
        Some(PredictEvent::Finished { id, prediction }) => {
            assert_eq!(*id, 3);
            assert_eq!(prediction.len(), 3);
            assert!(prediction.q3.iter().all(|c| matches!(c, b'H' | b'E' | b'L')));
            assert!(prediction.confidence.iter().all(|&c| (0.0..=1.0).contains(&c)));
        }
        other => panic!("expected Finished, got {:?}", other),
    }

    // The tool is reusable once the run completed
    tool.predict_secondary(4, &query());
    let events = collect_run(&tool);
    match events.last() {
        Some(PredictEvent::Finished { id, .. }) => assert_eq!(*id, 4),
        other => panic!("expected Finished, got {:?}", other),
    }
}

#[test]
fn cancel_reports_canceled_not_error() {
    let fixture = fixture(SLEEP_SCRIPT);
    let mut tool =
        PsiBlastStructureTool::new(&fixture.psiblast, options(), &fixture.stage1, &fixture.stage2);

    tool.predict_secondary(9, &query());
    std::thread::sleep(Duration::from_millis(50));
    assert!(tool.is_running());
    tool.cancel();

    let events = collect_run(&tool);
    assert_eq!(events.last(), Some(&PredictEvent::Canceled { id: 9 }));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, PredictEvent::Canceled { .. }))
            .count(),
        1
    );
    assert!(events
        .iter()
        .all(|e| !matches!(e, PredictEvent::Error { .. } | PredictEvent::Finished { .. })));
    assert!(!tool.is_running());
}

#[test]
fn nonzero_exit_reports_the_stderr_text() {
    let fixture = fixture(FAILING_SCRIPT);
    let mut tool =
        PsiBlastStructureTool::new(&fixture.psiblast, options(), &fixture.stage1, &fixture.stage2);

    tool.predict_secondary(5, &query());
    let events = collect_run(&tool);
    match events.last() {
        Some(PredictEvent::Error { id, message }) => {
            assert_eq!(*id, 5);
            assert!(message.contains("BLAST Database error"));
        }
        other => panic!("expected Error, got {:?}", other),
    }
    assert!(!tool.is_running());
}

#[test]
fn unlaunchable_psiblast_reports_an_error() {
    let fixture = fixture(NO_HITS_SCRIPT);
    let mut tool = PsiBlastStructureTool::new(
        "/no/such/psiblast/binary",
        options(),
        &fixture.stage1,
        &fixture.stage2,
    );

    tool.predict_secondary(2, &query());
    let events = collect_run(&tool);
    assert!(matches!(events.last(), Some(PredictEvent::Error { id: 2, .. })));
}

#[test]
fn unloadable_network_reports_an_error() {
    let fixture = fixture(NO_HITS_SCRIPT);
    let mut tool = PsiBlastStructureTool::new(
        &fixture.psiblast,
        options(),
        fixture._dir.path().join("missing1.net"),
        fixture._dir.path().join("missing2.net"),
    );

    tool.predict_secondary(6, &query());
    let events = collect_run(&tool);
    match events.last() {
        Some(PredictEvent::Error { id, message }) => {
            assert_eq!(*id, 6);
            assert!(message.contains("neural network"));
        }
        other => panic!("expected Error, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Task-level behavior

#[derive(Default)]
struct MemoryStore {
    saved: HashMap<i32, Q3Prediction>,
}

impl Q3Store for MemoryStore {
    fn set_q3(&mut self, id: i32, prediction: &Q3Prediction) {
        self.saved.insert(id, prediction.clone());
    }
}

// Lays the fixture files out the way the task resolves them from a root
fn task_root(script: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("bin")).unwrap();
    fs::create_dir(dir.path().join("data")).unwrap();
    write_script(&dir.path().join("bin/psiblast"), script);
    write_net(&dir.path().join("data/nn-sec-stage1.net"), 315, 3);
    write_net(&dir.path().join("data/nn-sec-stage2.net"), 60, 3);
    dir
}

#[test]
fn task_persists_a_successful_prediction() {
    let root = task_root(HITS_SCRIPT);
    let store = Rc::new(RefCell::new(MemoryStore::default()));
    let mut task = PredictSecondaryTask::new(
        root.path(),
        Some(store.clone()),
        42,
        query(),
        options(),
        "predict secondary",
    );
    task.set_n_threads(2);

    task.run();
    assert_eq!(task.status(), TaskStatus::Finished);
    assert_eq!(task.note().len(), 3);
    assert!((task.progress() - 1.0).abs() < 1e-9);

    let store = store.borrow();
    let saved = store.saved.get(&42).expect("the prediction must be persisted");
    assert_eq!(saved.q3_string(), task.note());
}

#[test]
fn task_notes_a_no_hit_run_without_persisting() {
    let root = task_root(NO_HITS_SCRIPT);
    let store = Rc::new(RefCell::new(MemoryStore::default()));
    let mut task = PredictSecondaryTask::new(
        root.path(),
        Some(store.clone()),
        42,
        query(),
        options(),
        "predict secondary",
    );

    task.run();
    assert_eq!(task.status(), TaskStatus::Finished);
    assert_eq!(task.note(), "No PSI-BLAST hits to query");
    assert!(store.borrow().saved.is_empty());
}

#[test]
fn task_maps_errors_to_the_note() {
    let root = task_root(FAILING_SCRIPT);
    let mut task =
        PredictSecondaryTask::new(root.path(), None, 1, query(), options(), "predict secondary");

    task.run();
    assert_eq!(task.status(), TaskStatus::Error);
    assert!(task.note().contains("BLAST Database error"));
}

#[test]
fn killed_task_leaves_the_store_untouched() {
    let root = task_root(SLEEP_SCRIPT);
    let store = Rc::new(RefCell::new(MemoryStore::default()));
    let mut task = PredictSecondaryTask::new(
        root.path(),
        Some(store.clone()),
        42,
        query(),
        options(),
        "predict secondary",
    );

    task.start();
    std::thread::sleep(Duration::from_millis(50));
    task.kill();
    task.wait();

    assert_eq!(task.status(), TaskStatus::Killed);
    assert!(store.borrow().saved.is_empty());
}
