//! Payment provider implementations.

pub mod stacks;

pub use stacks::StacksProvider;
