//! Destinations for planned blocks.

use crate::spec::BlockSpec;
use std::io::Write;

/// Error type returned by a [`BlockSink`]. It is passed back to the caller of the plan untouched.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Receives planned blocks, newest first, exactly once each.
///
/// The block is moved into the sink; the planner keeps no reference to it. Returning an error
/// stops the plan immediately.
pub trait BlockSink {
    fn accept(&mut self, block: BlockSpec) -> Result<(), BoxedError>;
}

impl<F> BlockSink for F
where
    F: FnMut(BlockSpec) -> Result<(), BoxedError>,
{
    fn accept(&mut self, block: BlockSpec) -> Result<(), BoxedError> {
        self(block)
    }
}

/// Writes each block as one line of JSON, for an encoder running in another process.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
    blocks: usize,
    series: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            blocks: 0,
            series: 0,
        }
    }

    /// Number of blocks written so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Number of series specs written so far, not counting target fan out.
    pub fn series(&self) -> usize {
        self.series
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> std::io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> BlockSink for JsonLinesSink<W> {
    fn accept(&mut self, block: BlockSpec) -> Result<(), BoxedError> {
        serde_json::to_writer(&mut self.writer, &block)?;
        self.writer.write_all(b"\n")?;
        self.blocks += 1;
        self.series += block.series.len();
        Ok(())
    }
}
