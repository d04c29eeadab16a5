// trait definitions for ports

mod storage;

pub use storage::*;
