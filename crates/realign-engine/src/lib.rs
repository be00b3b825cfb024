pub mod aligner;
pub mod apply;
pub mod context;
pub mod merge;
pub mod rules;
pub mod scope;
pub mod tracker;

pub use aligner::DependencyAligner;
pub use context::AlignmentContext;
