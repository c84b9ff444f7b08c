//! Unit tests for `docsafe`.

pub(crate) mod support;
