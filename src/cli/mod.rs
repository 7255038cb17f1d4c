mod compile;

pub use compile::{cmd_compile, CompileArgs};
