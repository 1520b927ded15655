//! CLI subcommands.

pub mod products;
