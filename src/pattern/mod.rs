//! # Pattern Module
//!
//! The pattern module compiles route path specifications into matchable
//! [`PathPattern`] values and performs whole-path matching with parameter
//! capture.
//!
//! ## Overview
//!
//! A route path is written in one of four forms, classified at compile time:
//!
//! - **Literal** — `/zoo/animals`: matches by exact string equality.
//! - **Parameterized** — `/zoo/animals/:id`: a `:name` segment captures one
//!   path segment's worth of characters (never crossing a `/`).
//! - **Wildcarded** — `/ab+cd`, `/files/*`: glob tokens (`+`, `*`, `?`)
//!   compile to a character-level matcher over the full path, so `/ab+cd`
//!   accepts `/abcd`, `/abbcd`, and so on.
//! - **Regex** — an expression handed to [`compile_regex`], applied to the
//!   full path `test`-style, anchored only where the expression anchors
//!   itself.
//!
//! ## Two-phase design
//!
//! 1. **Compilation**: at registration time the path specification is parsed
//!    once into a `PathPattern`. Compilation is deterministic: the same
//!    source always produces an equivalent pattern.
//! 2. **Matching**: per request, [`PathPattern::matches`] tests a
//!    query-stripped path and yields captured parameters on success.
//!
//! String patterns are matched segment-and-character wise rather than as
//! arbitrary regular expressions, keeping the accepted language narrow and
//! predictable; full regex power is opt-in through `compile_regex`.

mod core;
mod glob;

pub use self::core::{
    compile, compile_regex, InvalidPatternError, ParamVec, PathPattern, Segment, MAX_INLINE_PARAMS,
};
