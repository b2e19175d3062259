pub mod cycles;
pub mod scheduler;

pub use cycles::SnapshotRunner;
pub use scheduler::SnapshotScheduler;
