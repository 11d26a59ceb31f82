//! Purpose: Internal JSON scanning boundary used by the selective decoder.
//! Exports: `parse` module with top-level object scanning and value classification.
//! Role: Single seam for parser implementation so the decoder avoids ad hoc byte handling.
//! Invariants: Only the top level of a payload is inspected here; nested values stay raw.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
