pub mod committer;
pub mod coordinator;
pub mod pacing;
pub mod resolver;
pub mod scoring;
pub mod settings;

pub use committer::*;
pub use coordinator::*;
pub use pacing::*;
pub use resolver::*;
pub use settings::*;
