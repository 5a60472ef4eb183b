//! Support for headerless elementary streams: the byte FIFO the caller feeds
//! and the start-code scanner used to prime parameter sets.

pub mod buffer;
pub mod scanner;

pub use buffer::RawBuffer;
pub use scanner::{NalSyntax, StartCodeScanner};
