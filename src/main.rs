#![deny(clippy::all)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::struct_excessive_bools)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::exit)]
#![warn(clippy::map_err_ignore)]
#![warn(clippy::str_to_string)]
#![warn(clippy::string_to_string)]
#![warn(clippy::use_debug)]
#![warn(clippy::verbose_file_reads)]
// For binary-only crates
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod cli;

use std::env;

use anyhow::Result;
use clap::Parser;

use crate::cli::Args;

pub fn main() -> Result<()> {
    let args = Args::parse();

    let filters = env::var("RUST_LOG").unwrap_or_else(|_| {
        if args.verbose {
            "error,videoparser=debug,video_parser=debug".to_owned()
        } else {
            "error,videoparser=info,video_parser=info".to_owned()
        }
    });
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    cli::run(&args)
}
