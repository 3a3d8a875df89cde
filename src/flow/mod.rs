mod app;
mod poller;

pub use app::run;
pub use poller::{ActivationPoller, PollEvent};
