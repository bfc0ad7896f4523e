//! tapec code generator: compiles API calls into tape-machine programs.
//!
//! # Architecture
//!
//! There is no parser. Callers build programs by invoking operations on
//! a [`Transcompiler`] directly (an embedded DSL); it emits a program in
//! the 8-instruction tape language — pointer moves, cell
//! increment/decrement, input, output, and zero-test loops — over an
//! array of wrapping byte cells with a single cursor.
//!
//! Layered bottom-up:
//!
//! - [`memory`] — flat allocator over tape addresses, nearest-fit
//!   search, per-scope ownership.
//! - [`scope`] — hierarchical symbol table enforcing variable and
//!   temporary lifetimes.
//! - [`compiler`] — the [`Transcompiler`]: arithmetic, comparison, and
//!   control-flow primitives expressed as cursor moves and loops.
//! - [`printer`] — renders the labeled instruction trace as indented,
//!   commented program text.
//! - [`snapshot`] — debug overlay naming each cell of a final raw tape.
//!
//! # Example
//!
//! ```
//! use tapec_codegen::Transcompiler;
//!
//! let mut c = Transcompiler::new();
//! c.declare_variable("x").unwrap();
//! c.assign_value("x", 65).unwrap();
//! c.print_variable("x").unwrap();
//! let text = c.code().unwrap();
//! assert!(text.contains("assign 65 to x"));
//! ```

pub mod compiler;
pub mod error;
pub mod memory;
pub mod printer;
pub mod scope;
pub mod snapshot;

pub use compiler::{Operand, Transcompiler};
pub use error::{CodegenError, CodegenResult};
pub use memory::{Memory, ScopeId};
pub use printer::CodePrinter;
pub use scope::{ScopeFrame, ScopeStack};
pub use snapshot::snapshot;
