//! Concurrent record store driven by a fixed, ordered set of worker threads.
//!
//! A command file names a worker count and a starting worker, followed by one
//! command per worker. Every worker thread is spawned up front, but they run
//! their commands one at a time in a fixed cyclic order starting from the
//! configured worker. All workers share a single record store guarded by a
//! reader/writer lock, and every step is written to a timestamped event log.
//!
//! # Architecture
//!
//! - **Scheduler thread** (the caller of [`scheduler::Scheduler::run`]):
//!   spawns the workers, activates them one by one, joins them, then writes
//!   the lock statistics and final table to the event log.
//! - **Worker threads**: each blocks on its own activation channel, then
//!   dispatches its one command against the store.
//!
//! Activation uses crossbeam channels rather than counting semaphores: each
//! worker receives exactly one message, and only the scheduler sends them.
//!
//! # Modules
//!
//! - [`digest`]: Jenkins one-at-a-time hash used as the ordering key
//! - [`store`]: Ordered singly linked record store (index-backed)
//! - [`lock`]: Instrumented reader/writer lock handing out scoped guards
//! - [`event_log`]: Timestamped, thread-tagged event log
//! - [`sink`]: Append-only line sink shared by the event log and results
//! - [`command`]: Config line and command line parsing
//! - [`source`]: Reads the command file
//! - [`dispatch`]: Runs one command against the store and reports the outcome
//! - [`scheduler`]: Worker threads and the activation protocol
//! - [`context`]: Shared handle passed to every worker
//! - [`error`]: Domain error types
//! - [`cli`]: Command-line arguments for the binary

pub mod cli;
pub mod command;
pub mod context;
pub mod digest;
pub mod dispatch;
pub mod error;
pub mod event_log;
pub mod lock;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod store;
