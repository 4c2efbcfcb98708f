mod core;


pub use self::core::{Order, RunConfig, RunError, Summary, collect, run};
