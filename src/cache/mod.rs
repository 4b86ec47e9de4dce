mod engine;
mod key;
mod statements;


pub use engine::*;
pub use key::*;
