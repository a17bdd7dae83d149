pub mod classifier;
pub mod config;
pub mod dupes;
pub mod engine;
pub mod error;
pub mod mover;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod tracker;

pub use crate::config::{AppConfig, CategoryConfig, CollisionPolicy};
pub use engine::Organizer;
pub use error::{Error, MoveError, PerFileError};
pub use progress::{ProgressReporter, SilentReporter};
pub use report::ScanReport;
pub use tracker::{SweepReport, UnknownTracker};
