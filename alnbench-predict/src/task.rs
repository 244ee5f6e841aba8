use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use log::{info, warn};

use alnbench_seq::BioString;

use crate::{OptionSet, PredictEvent, PsiBlastStructureTool, Q3Prediction, THREADS_OPT};

/// Path of the psiblast executable, relative to the application root.
pub const PSI_BLAST_RELATIVE_PATH: &str = "bin/psiblast";
/// Stage-1 network weights, relative to the application root.
pub const STAGE1_NEURAL_NET_FILE: &str = "data/nn-sec-stage1.net";
/// Stage-2 network weights, relative to the application root.
pub const STAGE2_NEURAL_NET_FILE: &str = "data/nn-sec-stage2.net";

const NO_HITS_NOTE: &str = "No PSI-BLAST hits to query";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    NotStarted,
    Running,
    Finished,
    Error,
    Killed,
}

/// The persistence seam: receives a finished prediction for the record that
/// requested it. The actual store lives outside this crate.
pub trait Q3Store {
    fn set_q3(&mut self, id: i32, prediction: &Q3Prediction);
}

/// A task-graph leaf that predicts the secondary structure of one sequence.
///
/// The task wires a [`PsiBlastStructureTool`] into task-level bookkeeping:
/// progress events become a completion fraction, a tool error becomes
/// [`TaskStatus::Error`] with the message as the task note, a cancellation
/// becomes [`TaskStatus::Killed`], and a successful prediction is written to the
/// supplied [`Q3Store`] with the Q3 string as the note. An empty prediction (no
/// PSI-BLAST hits) finishes the task without touching the store.
pub struct PredictSecondaryTask {
    store: Option<Rc<RefCell<dyn Q3Store>>>,
    id: i32,
    sequence: BioString,
    options: OptionSet,
    name: String,
    n_threads: usize,
    root: PathBuf,
    status: TaskStatus,
    progress: f64,
    note: String,
    tool: Option<PsiBlastStructureTool>,
}

impl PredictSecondaryTask {
    /// Creates a task for `sequence`. `root` is the application directory the
    /// psiblast binary and the network files are resolved against; `id`
    /// correlates the finished prediction with its record in `store`.
    pub fn new(
        root: impl Into<PathBuf>,
        store: Option<Rc<RefCell<dyn Q3Store>>>,
        id: i32,
        sequence: BioString,
        options: OptionSet,
        name: impl Into<String>,
    ) -> PredictSecondaryTask {
        PredictSecondaryTask {
            store,
            id,
            sequence,
            options,
            name: name.into(),
            n_threads: 1,
            root: root.into(),
            status: TaskStatus::NotStarted,
            progress: 0.0,
            note: String::new(),
            tool: None,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Completion fraction in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Human-readable outcome: the Q3 string, an error message, or the no-hits
    /// notice.
    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    pub fn set_n_threads(&mut self, n_threads: usize) {
        debug_assert!(n_threads >= 1);
        self.n_threads = n_threads;
    }

    /// Lazily builds the tool and kicks off the prediction. Returns promptly;
    /// drive the run with [`wait()`](PredictSecondaryTask::wait) or poll the
    /// tool's events from an orchestrator loop.
    pub fn start(&mut self) {
        self.options.set(THREADS_OPT, self.n_threads);
        if self.tool.is_none() {
            self.tool = Some(PsiBlastStructureTool::new(
                self.root.join(PSI_BLAST_RELATIVE_PATH),
                self.options.clone(),
                self.root.join(STAGE1_NEURAL_NET_FILE),
                self.root.join(STAGE2_NEURAL_NET_FILE),
            ));
        }
        self.status = TaskStatus::Running;
        if let Some(tool) = self.tool.as_mut() {
            let sequence = self.sequence.clone();
            tool.predict_secondary(self.id, &sequence);
        }
    }

    /// Blocks until the prediction reaches a terminal state, folding every tool
    /// event into the task bookkeeping.
    pub fn wait(&mut self) {
        loop {
            let event = match self.tool.as_ref() {
                Some(tool) => tool.events().recv(),
                None => return,
            };
            match event {
                Ok(PredictEvent::ProgressChanged { current, total }) => {
                    if total > 0 {
                        self.progress = current as f64 / total as f64;
                    }
                }
                Ok(PredictEvent::Error { message, .. }) => {
                    warn!("prediction task {} failed: {}", self.id, message);
                    self.status = TaskStatus::Error;
                    self.note = message;
                    return;
                }
                Ok(PredictEvent::Canceled { .. }) => {
                    info!("prediction task {} canceled", self.id);
                    self.status = TaskStatus::Killed;
                    return;
                }
                Ok(PredictEvent::Finished { id, prediction }) => {
                    self.status = TaskStatus::Finished;
                    if prediction.is_empty() {
                        // No hits means no profile and nothing to store
                        self.note = NO_HITS_NOTE.to_string();
                    } else {
                        self.note = prediction.q3_string();
                        if let Some(store) = &self.store {
                            store.borrow_mut().set_q3(id, &prediction);
                        }
                    }
                    return;
                }
                Err(_) => return,
            }
        }
    }

    /// Convenience wrapper: [`start()`](PredictSecondaryTask::start) then
    /// [`wait()`](PredictSecondaryTask::wait).
    pub fn run(&mut self) {
        self.start();
        self.wait();
    }

    /// Cancels a running prediction; [`wait()`](PredictSecondaryTask::wait) then
    /// ends with [`TaskStatus::Killed`].
    pub fn kill(&mut self) {
        if let Some(tool) = self.tool.as_mut() {
            tool.cancel();
        }
    }
}
