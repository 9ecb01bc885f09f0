pub mod dashboard;
pub mod error;
pub mod procfs;
pub mod views;

pub use dashboard::{ActiveView, ControlState, Exit, RenderLoop};
pub use error::{Error, SourceError, ViewError};
pub use procfs::ProcFs;
