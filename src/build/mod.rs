mod clean;
mod core;
mod feedback;
pub mod utils;
mod watcher;

pub use clean::clean;
pub use self::core::{
    BuildOptions, BuildSummary, ProcessRunner, RunOutput, Runner, build_programs, execute,
    print_plan,
};
pub use feedback::FeedbackAnalyzer;
pub use watcher::watch;
