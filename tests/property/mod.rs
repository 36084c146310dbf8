//! Property-based tests for paging and step abort guarantees

mod abort;
mod pagination;
