//! Worker threads and the activation protocol.
//!
//! All workers are spawned before any of them runs. Each one logs that it is
//! waiting and then blocks on its own activation channel. The scheduler then
//! walks the cyclic order `start, start + 1, ..., start + N - 1 (mod N)`:
//! it sends one activation message to the worker, joins that worker's thread,
//! and only then moves on. At most one worker is ever past its activation
//! point and still running, no matter how the OS schedules the threads.
//!
//! Workers never signal each other; advancing the cycle is the scheduler's
//! job alone.
//!
//! ```text
//! scheduler          worker s          worker s+1
//!    |  spawn all  ->  WAITING           WAITING
//!    |-- activate -->  AWAKENED
//!    |                 dispatch
//!    |<-- joined ----  finished
//!    |-- activate ------------------->  AWAKENED
//!    |                                  ...
//! ```

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context as _, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, error, info, warn};

use crate::command::{Command, JobConfig};
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::event_log::ThreadId;
use crate::lock::LockStats;
use crate::source::CommandFile;
use crate::store::Record;

/// Lifecycle of one worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Job assigned, thread not yet running.
    Created,
    /// Blocked on the activation channel.
    Waiting,
    /// Activation received.
    Activated,
    /// Running its command against the store.
    Dispatching,
    /// Done; the thread is about to exit.
    Finished,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Created => "created",
            WorkerState::Waiting => "waiting",
            WorkerState::Activated => "activated",
            WorkerState::Dispatching => "dispatching",
            WorkerState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// One worker's command line and the receiving end of its activation signal.
struct Job {
    id: ThreadId,
    line: String,
    activation: Receiver<()>,
    state: WorkerState,
}

impl Job {
    fn enter(&mut self, next: WorkerState) {
        debug!(worker = self.id, from = %self.state, to = %next, "worker state");
        self.state = next;
    }

    /// Body of a worker thread.
    fn run(mut self, ctx: &Context) {
        self.enter(WorkerState::Waiting);
        ctx.events.log(self.id, "WAITING FOR MY TURN");

        // The only place a worker suspends outside of lock acquisition.
        if self.activation.recv().is_err() {
            warn!(worker = self.id, "scheduler went away before activation");
            return;
        }

        self.enter(WorkerState::Activated);
        ctx.events.log(self.id, "AWAKENED FOR WORK");
        let command = Command::parse(&self.line);

        self.enter(WorkerState::Dispatching);
        if let Err(err) = dispatch(ctx, self.id, &command) {
            debug!(worker = self.id, error = %err, "command skipped");
        }

        self.enter(WorkerState::Finished);
    }
}

/// The scheduler's end of one worker.
struct WorkerHandle {
    signal: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Worker ids in the order they were activated.
    pub dispatch_order: Vec<ThreadId>,
    /// Lock counters once every worker had joined.
    pub stats: LockStats,
    /// Store contents once every worker had joined.
    pub final_table: Vec<Record>,
    /// Workers whose thread panicked.
    pub panicked: Vec<ThreadId>,
}

/// Owns the shared context and the job list for one run.
pub struct Scheduler {
    ctx: Arc<Context>,
    config: JobConfig,
    lines: Vec<String>,
}

impl Scheduler {
    pub fn new(ctx: Context, file: CommandFile) -> Self {
        let CommandFile { config, mut lines } = file;
        lines.resize(config.workers, String::new());
        Self {
            ctx: Arc::new(ctx),
            config,
            lines,
        }
    }

    /// Spawns every worker, drives the activation cycle, and writes the
    /// lock statistics and final table to the event log.
    ///
    /// A worker stuck forever (on the store lock, say) stalls the run; there
    /// is no timeout.
    ///
    /// # Errors
    /// Fails if a worker thread cannot be spawned, or if the shared context
    /// is somehow still referenced after every worker has joined.
    pub fn run(self) -> Result<RunReport> {
        let Scheduler { ctx, config, lines } = self;

        let mut workers = Vec::with_capacity(config.workers);
        for (id, line) in lines.into_iter().enumerate() {
            let (signal, activation) = bounded(1);
            let job = Job {
                id,
                line,
                activation,
                state: WorkerState::Created,
            };
            let ctx = Arc::clone(&ctx);
            let thread = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || job.run(&ctx))
                .with_context(|| format!("failed to spawn worker {id}"))?;
            workers.push(WorkerHandle {
                signal,
                thread: Some(thread),
            });
        }
        info!(
            workers = config.workers,
            start = config.start_index,
            "all workers spawned"
        );

        let mut dispatch_order = Vec::with_capacity(config.workers);
        let mut panicked = Vec::new();
        for id in config.activation_order() {
            let worker = &mut workers[id];
            if worker.signal.send(()).is_err() {
                warn!(worker = id, "worker exited before activation");
            }
            dispatch_order.push(id);

            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!(worker = id, "worker panicked");
                    panicked.push(id);
                }
            }
        }
        drop(workers);

        let stats = ctx.table.stats();
        ctx.events
            .note(format!("Number of lock acquisitions: {}", stats.acquisitions));
        ctx.events
            .note(format!("Number of lock releases: {}", stats.releases));
        if !stats.is_balanced() {
            warn!(
                acquisitions = stats.acquisitions,
                releases = stats.releases,
                "lock counters disagree"
            );
        }

        let Context { events, table, .. } = Arc::try_unwrap(ctx)
            .map_err(|_| anyhow!("shared context still referenced after all workers joined"))?;
        let store = table.into_inner();
        let final_table = store.dump();
        events.note_all(
            std::iter::once("Final Table:".to_string())
                .chain(final_table.iter().map(ToString::to_string)),
        );
        let released = store.destroy();
        debug!(released, "store destroyed");

        Ok(RunReport {
            dispatch_order,
            stats,
            final_table,
            panicked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names() {
        let states = [
            WorkerState::Created,
            WorkerState::Waiting,
            WorkerState::Activated,
            WorkerState::Dispatching,
            WorkerState::Finished,
        ];
        let names: Vec<String> = states.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec!["created", "waiting", "activated", "dispatching", "finished"]
        );
    }

    #[test]
    fn missing_lines_become_unknown_jobs() {
        let file = CommandFile {
            config: JobConfig {
                workers: 2,
                start_index: 0,
            },
            lines: vec!["print".into()],
        };
        let ctx = Context::in_memory();
        let events = Arc::clone(&ctx.events);

        let report = Scheduler::new(ctx, file).run().unwrap();
        assert_eq!(report.dispatch_order, vec![0, 1]);
        assert_eq!(events.messages_from(1).last().unwrap(), "UNKNOWN COMMAND: ");
    }
}
