pub mod dispatch;
pub mod fixtures;
pub mod status;

pub use dispatch::dispatch;
