#![deny(clippy::all)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::inconsistent_struct_constructor)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::similar_names)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::use_self)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::create_dir)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::default_numeric_fallback)]
#![warn(clippy::exit)]
#![warn(clippy::filetype_is_file)]
#![warn(clippy::float_cmp_const)]
#![warn(clippy::if_then_some_else_none)]
#![warn(clippy::lossy_float_literal)]
#![warn(clippy::map_err_ignore)]
#![warn(clippy::mem_forget)]
#![warn(clippy::multiple_inherent_impl)]
#![warn(clippy::pattern_type_mismatch)]
#![warn(clippy::rc_buffer)]
#![warn(clippy::rc_mutex)]
#![warn(clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::same_name_method)]
#![warn(clippy::str_to_string)]
#![warn(clippy::string_to_string)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::unneeded_field_pattern)]
#![warn(clippy::use_debug)]
#![warn(clippy::verbose_file_reads)]
#![allow(clippy::missing_errors_doc)]

//! Per-frame and per-sequence statistics from compressed video bitstreams.
//!
//! A [`ParsingSession`] walks a video stream one decoded frame at a time,
//! either from a media file or from raw elementary stream bytes fed by the
//! caller, and produces a [`FrameRecord`] per frame plus a [`SequenceInfo`]
//! that fills in whatever the container left out.

pub mod backend;
pub mod codec;
pub mod engine;
pub mod error;
pub mod frame;
pub mod options;
pub mod raw;
pub mod sequence;
pub mod session;
pub mod util;

pub use self::{
    codec::Codec,
    error::{ParseError, Result},
    frame::{AuxMetrics, FrameRecord, FrameType},
    options::{BitratePolicy, MetricsPolicy, ParserOptions},
    sequence::SequenceInfo,
    session::ParsingSession,
};

/// Switches the decoding engine's own logging between everything and
/// nothing.
pub fn set_verbose(verbose: bool) {
    backend::set_verbose(verbose);
}
