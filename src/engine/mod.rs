pub mod coordinator;
pub mod process;
pub mod process_list;
mod worker;

pub use coordinator::{Engine, EngineHandle};
pub use process::{Process, State};
pub use process_list::ProcessList;
