use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info};

use alnbench_seq::BioString;

use crate::{normalize_pssm, NnStructureTool, OptionSet, PredictError, Pssm, Q3Prediction};

/// PSI-BLAST iteration count; secondary prediction needs at least two, because a
/// PSSM is only written from the second iteration on.
pub const ITERATIONS_OPT: &str = "-num_iterations";
pub const THREADS_OPT: &str = "-num_threads";
pub const OUTPUT_FORMAT_OPT: &str = "-outfmt";
pub const NUM_ALIGNMENTS_OPT: &str = "-num_alignments";
pub const NUM_DESCRIPTIONS_OPT: &str = "-num_descriptions";
pub const EVALUE_OPT: &str = "-evalue";
pub const DATABASE_OPT: &str = "-db";
/// File the patched PSI-BLAST writes its AG-PSSM to; always forced to a fresh
/// scratch path before a run.
pub const AG_PSSM_FILE_OPT: &str = "-ag_pssm_file";

// BLAST tabular CSV; the minimal report format that still carries one alignment
const CSV_OUTPUT_FORMAT: u32 = 10;

/// Prefix of the progress lines the PSI-BLAST wrapper streams on stdout, e.g.
/// `# PROGRESS: 1 2 750 1500` for iteration 1 of 2, sequence 750 of 1500.
pub const PROGRESS_PREFIX: &str = "# PROGRESS:";

/// An event emitted by [`PsiBlastStructureTool`] during a prediction run.
#[derive(Clone, Debug, PartialEq)]
pub enum PredictEvent {
    /// Search progress collapsed into a single fraction `current / total`.
    ProgressChanged { current: u64, total: u64 },
    /// The run was canceled by [`PsiBlastStructureTool::cancel`].
    Canceled { id: i32 },
    /// The run failed; `message` is suitable for direct display.
    Error { id: i32, message: String },
    /// The run completed. An empty prediction means PSI-BLAST found no
    /// significant hits, which is not an error.
    Finished { id: i32, prediction: Q3Prediction },
}

/// Runs an external PSI-BLAST process and feeds its PSSM through the two-stage
/// neural network, reporting progress and results as [`PredictEvent`]s.
///
/// The tool owns at most one outstanding prediction. `predict_secondary` returns
/// promptly: the child process is driven from a worker thread and every outcome,
/// including configuration errors, arrives on the channel returned by
/// [`events()`](PsiBlastStructureTool::events). The PSSM is written to a unique
/// scratch file that is removed once the run is over.
pub struct PsiBlastStructureTool {
    psiblast_path: PathBuf,
    options: OptionSet,
    stage1_file: PathBuf,
    stage2_file: PathBuf,
    nn_tool: Option<Arc<NnStructureTool>>,
    running: Arc<AtomicBool>,
    canceled: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
    sender: Sender<PredictEvent>,
    receiver: Receiver<PredictEvent>,
    worker: Option<JoinHandle<()>>,
}

impl PsiBlastStructureTool {
    /// Creates a tool around the `psiblast` executable at `psiblast_path` and the
    /// two staged network files. `options` must request at least two iterations.
    pub fn new(
        psiblast_path: impl Into<PathBuf>,
        options: OptionSet,
        stage1_file: impl Into<PathBuf>,
        stage2_file: impl Into<PathBuf>,
    ) -> PsiBlastStructureTool {
        let (sender, receiver) = unbounded();
        let mut tool = PsiBlastStructureTool {
            psiblast_path: psiblast_path.into(),
            options: OptionSet::new(),
            stage1_file: stage1_file.into(),
            stage2_file: stage2_file.into(),
            nn_tool: None,
            running: Arc::new(AtomicBool::new(false)),
            canceled: Arc::new(AtomicBool::new(false)),
            child: Arc::new(Mutex::new(None)),
            sender,
            receiver,
            worker: None,
        };
        tool.set_psiblast_options(options);
        tool
    }

    /// The channel every [`PredictEvent`] of this tool is delivered on.
    pub fn events(&self) -> &Receiver<PredictEvent> {
        &self.receiver
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Adopts a PSI-BLAST configuration. Since the AG-PSSM is the only output
    /// this tool consumes, the report surface is forced down to its minimum: CSV
    /// format with a single description and alignment.
    pub fn set_psiblast_options(&mut self, options: OptionSet) {
        debug_assert!(
            options
                .value(ITERATIONS_OPT)
                .and_then(|v| v.parse::<u32>().ok())
                .map_or(false, |iterations| iterations >= 2),
            "secondary prediction requires at least 2 PSI-BLAST iterations"
        );
        self.options = options;
        self.options.set(OUTPUT_FORMAT_OPT, CSV_OUTPUT_FORMAT);
        self.options.set(NUM_ALIGNMENTS_OPT, 1);
        self.options.set(NUM_DESCRIPTIONS_OPT, 1);
        // The AG-PSSM path is injected per run, each run getting a fresh
        // scratch file.
    }

    /// Starts a prediction for `sequence`; `id` is an opaque correlation value
    /// echoed by every event of this run. Must not be called while a run is
    /// outstanding.
    pub fn predict_secondary(&mut self, id: i32, sequence: &BioString) {
        debug_assert!(!self.is_running(), "one outstanding prediction per tool");
        if self.is_running() {
            return;
        }
        self.canceled.store(false, Ordering::SeqCst);

        let iterations = self
            .options
            .value(ITERATIONS_OPT)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        if iterations < 2 {
            let _ = self.sender.send(PredictEvent::Error {
                id,
                message: "secondary prediction requires PSI-BLAST to run at least 2 iterations"
                    .to_string(),
            });
            return;
        }

        let nn_tool = match self.nn_tool.clone() {
            Some(tool) => tool,
            None => match NnStructureTool::new(&self.stage1_file, &self.stage2_file) {
                Ok(tool) => {
                    let tool = Arc::new(tool);
                    self.nn_tool = Some(tool.clone());
                    tool
                }
                Err(error) => {
                    let _ = self.sender.send(PredictEvent::Error {
                        id,
                        message: format!("unable to initialize neural network: {}", error),
                    });
                    return;
                }
            },
        };

        let pssm_file = match tempfile::Builder::new().prefix("psiblast-pssm.").tempfile() {
            Ok(file) => file.into_temp_path(),
            Err(error) => {
                let _ = self.sender.send(PredictEvent::Error {
                    id,
                    message: format!("unable to create temporary file for the psiblast pssm: {}", error),
                });
                return;
            }
        };

        let mut options = self.options.clone();
        options.set(AG_PSSM_FILE_OPT, pssm_file.display());

        // A finished worker may still be around from the previous run
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        self.running.store(true, Ordering::SeqCst);

        let psiblast_path = self.psiblast_path.clone();
        let args = options.to_args();
        let fasta = format!(">query-{}\n{}\n", id, sequence.ungapped());
        let running = self.running.clone();
        let canceled = self.canceled.clone();
        let child_slot = self.child.clone();
        let sender = self.sender.clone();

        info!("starting PSI-BLAST prediction {} ({} residues)", id, sequence.ungapped_length());
        self.worker = Some(std::thread::spawn(move || {
            run_prediction(
                id,
                psiblast_path,
                args,
                fasta,
                pssm_file,
                nn_tool,
                running,
                canceled,
                child_slot,
                sender,
            );
        }));
    }

    /// Kills a running PSI-BLAST child; the run then ends with a single
    /// [`PredictEvent::Canceled`] instead of an error. Only the search phase is
    /// cancellable; the network inference is not.
    pub fn cancel(&mut self) {
        if !self.is_running() {
            return;
        }
        self.canceled.store(true, Ordering::SeqCst);
        let mut slot = lock_child(&self.child);
        if let Some(child) = slot.as_mut() {
            let _ = child.kill();
        }
        // The worker observes the dead child and reports the cancellation
    }
}

impl Drop for PsiBlastStructureTool {
    fn drop(&mut self) {
        if self.is_running() {
            self.cancel();
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn lock_child(slot: &Mutex<Option<Child>>) -> MutexGuard<'_, Option<Child>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[allow(clippy::too_many_arguments)]
fn run_prediction(
    id: i32,
    psiblast_path: PathBuf,
    args: Vec<String>,
    fasta: String,
    pssm_file: tempfile::TempPath,
    nn_tool: Arc<NnStructureTool>,
    running: Arc<AtomicBool>,
    canceled: Arc<AtomicBool>,
    child_slot: Arc<Mutex<Option<Child>>>,
    sender: Sender<PredictEvent>,
) {
    let outcome = execute_psiblast(&psiblast_path, &args, &fasta, &canceled, &child_slot, &sender);

    let event = match outcome {
        Err(_) if canceled.load(Ordering::SeqCst) => PredictEvent::Canceled { id },
        Err(error) => PredictEvent::Error { id, message: error.to_string() },
        Ok(()) => {
            let pssm_size = std::fs::metadata(&pssm_file).map(|m| m.len()).unwrap_or(0);
            if pssm_size == 0 {
                // No significant hits, so no PSSM and nothing to predict from.
                // Not every iteration ran, so close the progress out explicitly.
                let _ = sender.send(PredictEvent::ProgressChanged { current: 1, total: 1 });
                PredictEvent::Finished { id, prediction: Q3Prediction::default() }
            } else {
                match Pssm::from_file(&pssm_file) {
                    Ok(pssm) => {
                        let normalized = normalize_pssm(&pssm);
                        let prediction = nn_tool.predict_secondary(&normalized);
                        PredictEvent::Finished { id, prediction }
                    }
                    Err(error) => PredictEvent::Error { id, message: error.to_string() },
                }
            }
        }
    };

    // Removes the scratch file
    drop(pssm_file);

    running.store(false, Ordering::SeqCst);
    let _ = sender.send(event);
}

fn execute_psiblast(
    psiblast_path: &Path,
    args: &[String],
    fasta: &str,
    canceled: &AtomicBool,
    child_slot: &Mutex<Option<Child>>,
    sender: &Sender<PredictEvent>,
) -> Result<(), PredictError> {
    debug!("spawning {} {}", psiblast_path.display(), args.join(" "));
    let mut child = Command::new(psiblast_path)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| PredictError::PsiBlastLaunch { detail: error.to_string() })?;

    // The query travels over stdin; dropping the handle closes the pipe
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(fasta.as_bytes());
    }
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    *lock_child(child_slot) = Some(child);

    // A cancel may have raced the spawn; make sure it lands
    if canceled.load(Ordering::SeqCst) {
        if let Some(child) = lock_child(child_slot).as_mut() {
            let _ = child.kill();
        }
    }

    // Drain stderr on its own thread while the progress loop reads stdout;
    // reading the pipes one after the other deadlocks once the child fills
    // the stderr buffer mid-run
    let stderr_drain = stderr.map(|mut stderr| {
        std::thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        })
    });

    if let Some(stdout) = stdout {
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if let Some((current, total)) = parse_progress_line(&line) {
                let _ = sender.send(PredictEvent::ProgressChanged { current, total });
            }
        }
    }

    let error_text = match stderr_drain {
        Some(handle) => handle.join().unwrap_or_default(),
        None => String::new(),
    };

    let status = match lock_child(child_slot).take() {
        Some(mut child) => child
            .wait()
            .map_err(|error| PredictError::PsiBlastRuntime { detail: error.to_string() })?,
        None => {
            return Err(PredictError::PsiBlastRuntime { detail: "psiblast process lost".to_string() })
        }
    };

    if !status.success() {
        let detail = if error_text.trim().is_empty() {
            format!("psiblast exited with {}", status)
        } else {
            error_text.trim().to_string()
        };
        return Err(PredictError::PsiBlastRuntime { detail });
    }
    Ok(())
}

// Collapses a wrapper progress quadruple into a single fraction: with
// `totalSteps` sequences per iteration, iteration `i` of `n` at step `s` maps to
// `(i-1)*totalSteps + s` of `n*totalSteps`.
fn parse_progress_line(line: &str) -> Option<(u64, u64)> {
    let rest = line.strip_prefix(PROGRESS_PREFIX)?;
    let fields: Vec<u64> = rest
        .split_whitespace()
        .map(|word| word.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    if fields.len() != 4 {
        return None;
    }
    let (iteration, iterations, step, steps) = (fields[0], fields[1], fields[2], fields[3]);
    if iteration == 0 {
        return None;
    }
    Some(((iteration - 1) * steps + step, iterations * steps))
}
