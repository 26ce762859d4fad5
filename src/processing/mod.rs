//! Job queues, worker loops and the scoring pool

mod job_queue;
mod pool;
mod recovery;
mod worker;

pub use job_queue::{JobEnvelope, JobQueue, JobReceiver};
pub use pool::ScoringPool;
pub use recovery::{RecoveryLoader, RecoveryReport};
pub use worker::{CurrentJob, JobHandler, WorkerLoop};
