//! Shared helpers for unit tests: database fixtures and canned HTML pages.
