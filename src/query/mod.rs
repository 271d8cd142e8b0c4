// Submodules for separation of concerns
mod compile;
mod criteria;
mod exec;
mod types;

// Public API re-exports
pub use compile::{QueryCompiler, compile_query};
pub use exec::{ExecOptions, QueryBuilder, apply};
pub use types::{PopulateDirective, QueryOp, QuerySpec, RawQuery, RawValue, Sort};
