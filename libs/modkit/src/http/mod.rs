//! HTTP utilities for modkit

pub mod sse;
