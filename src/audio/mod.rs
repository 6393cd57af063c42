//! Audio output
//!
//! - WAV file saving
//! - Chunk concatenation and artifact naming

mod output;

pub use output::{concat_chunks, output_file_name, unique_millis, AudioOutput};
