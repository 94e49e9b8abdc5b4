//! Pipeline stages for post generation, refinement and document output.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the model seam stays in one place.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ extract ──▶ compose ──▶ (model) ──▶ parse ──▶ session ──▶ refine
//! (validate,    (fields →   (prompt)               (JSON →              (one post,
//!  clamp, mask)  JSON)                              candidates)           in place)
//! ```
//!
//! 1. [`normalize`] — required-field checks, variation clamping, name masking
//! 2. [`extract`]   — model call normalising the loose fields into a
//!    [`StructuredPost`](crate::request::StructuredPost); strict validation
//! 3. [`compose`]   — deterministic prompt assembly
//! 4. [`parse`]     — fence stripping and JSON-array parsing; never fails
//! 5. [`refine`]    — single-post revision with the original context
//!
//! Cheatsheets go through [`render`]; resumes through [`input`] and
//! [`pdf_text`].

pub mod compose;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod parse;
pub mod pdf_text;
pub mod refine;
pub mod render;
