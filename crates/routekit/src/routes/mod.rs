//! Route table model
//!
//! Descriptors are derived once from a route source and are immutable.
//! The resolver substitutes parameter bindings into a pattern using the same
//! converter rules the host router itself applies.

mod descriptor;
mod resolve;
mod table;

pub use descriptor::{ParamType, RouteDescriptor, RouteParam};
pub use resolve::resolve;
pub use table::{RouteProvider, RouteStats, RouteTable};

pub(crate) use table::{compile_excludes, is_excluded};
