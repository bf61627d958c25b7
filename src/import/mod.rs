//! Bulk import: invoking the import tool and folding its output into a project
//!
//! The import tool writes one directory per service, each holding generated
//! `.tf` configuration and a `.tfstate` file. [`reconcile`] mirrors the
//! configuration into `<target>/imported/` and [`directives`] turns the state
//! into `import` blocks so the project can adopt the resources.

pub mod directives;
pub mod discovery;
pub mod invocation;
pub mod options;
pub mod reconcile;
pub mod state_parser;

pub use directives::{DirectiveGenerator, DirectiveReport};
pub use invocation::ImportInvocation;
pub use options::ImportOptions;
pub use reconcile::{ReconcileReport, Reconciler};
