//! Style transfer request pipeline.

mod stage;
mod stylize;

pub use stage::Stage;
pub use stylize::{Config, Pipeline};
