//! End-to-end tests across loading, storage and retrieval.
