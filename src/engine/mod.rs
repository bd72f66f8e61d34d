pub mod callable;
pub mod environment;
pub mod runtime;
pub mod value;
