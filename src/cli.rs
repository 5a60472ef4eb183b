use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::Serialize;
use videoparser::{BitratePolicy, MetricsPolicy, ParserOptions, ParsingSession};

#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Args {
    /// The video file to parse.
    #[clap(value_parser)]
    pub input: PathBuf,
    /// Stop after this many frames.
    #[clap(long, short = 'n')]
    pub num_frames: Option<u64>,
    /// Write the line-delimited JSON here instead of to stdout.
    #[clap(long, short, value_parser)]
    pub output: Option<PathBuf>,
    /// Read the input as a raw elementary stream of this codec, e.g. `avc1`
    /// or `hev1`.
    #[clap(long, value_name = "CODEC")]
    pub raw: Option<String>,
    /// How many bytes to feed at a time in raw mode.
    #[clap(long, default_value_t = 64 * 1024)]
    pub chunk_size: usize,
    /// Report frames the decoder produced no QP/motion metrics for, instead
    /// of skipping them.
    #[clap(long)]
    pub allow_missing_metrics: bool,
    /// Keep the bitrate the container reports instead of recomputing it
    /// from the frame sizes.
    #[clap(long)]
    pub trust_container_bitrate: bool,
    /// Show verbose output.
    #[clap(long, short)]
    pub verbose: bool,
}

impl Args {
    fn options(&self) -> ParserOptions {
        ParserOptions::default()
            .with_metrics(if self.allow_missing_metrics {
                MetricsPolicy::Optional
            } else {
                MetricsPolicy::Required
            })
            .with_bitrate(if self.trust_container_bitrate {
                BitratePolicy::PreferContainer
            } else {
                BitratePolicy::Recompute
            })
            .with_verbose(self.verbose)
    }
}

pub fn run(args: &Args) -> Result<()> {
    let mut output: Box<dyn Write> = match args.output {
        Some(ref path) => {
            if path.exists()
                && !Confirm::new()
                    .with_prompt(format!(
                        "File {} exists. Overwrite?",
                        path.to_string_lossy()
                    ))
                    .interact()?
            {
                eprintln!("Not overwriting existing file. Exiting.");
                return Ok(());
            }
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut session = match args.raw {
        Some(ref codec) => ParsingSession::create_raw_parser(codec, args.options())?,
        None => ParsingSession::open(&args.input, args.options())?,
    };
    let mut raw_input = if args.raw.is_some() {
        Some(File::open(&args.input)?)
    } else {
        None
    };

    let progress = progress_bar(session.get_sequence_info().frame_count)?;
    let limit = args.num_frames.unwrap_or(u64::MAX);
    let mut chunk = vec![0u8; args.chunk_size.max(1)];

    while session.frames_parsed() < limit {
        if let Some(record) = session.parse_frame()? {
            write_line(&mut output, "frame_info", &record)?;
            progress.inc(1);
            continue;
        }

        // Out of frames. In raw mode that only means out of fed bytes.
        let Some(ref mut file) = raw_input else {
            break;
        };
        let read = file.read(&mut chunk)?;
        if read == 0 {
            session.finish()?;
            raw_input = None;
        } else {
            session.feed(&chunk[..read])?;
        }
    }
    progress.finish_and_clear();

    let sequence_info = session.get_sequence_info();
    session.close();
    write_line(&mut output, "sequence_info", &sequence_info)?;
    output.flush()?;

    info!(
        "Parsed {} frames of {} ({:.3} s, {:.1} kbit/s)",
        sequence_info.frame_count.min(limit),
        sequence_info.codec,
        sequence_info.duration,
        sequence_info.bitrate
    );
    Ok(())
}

fn progress_bar(frame_count: u64) -> Result<ProgressBar> {
    if frame_count == 0 {
        return Ok(ProgressBar::new_spinner());
    }
    let progress = ProgressBar::new(frame_count);
    progress.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {wide_bar} {pos}/{len} frames ({per_sec})",
    )?);
    Ok(progress)
}

/// Writes one JSON object per line, tagged with its record type.
fn write_line<T: Serialize>(output: &mut dyn Write, kind: &str, value: &T) -> Result<()> {
    let mut json = serde_json::to_value(value)?;
    if let Some(object) = json.as_object_mut() {
        object.insert("type".to_owned(), kind.into());
    }
    serde_json::to_writer(&mut *output, &json)?;
    writeln!(output)?;
    Ok(())
}
