//! Frame assembler for the segmentation pipeline.
//!
//! Turns an arbitrary stream of byte chunks into complete, fixed-size PCM
//! frames. Incoming chunks are never aligned to frame boundaries; any
//! remainder shorter than one frame is carried forward to the next call.

/// Re-slices arbitrary byte chunks into fixed-size frames.
pub struct FrameAssembler {
    frame_size_bytes: usize,
    /// Bytes received but not yet forming a complete frame.
    pending: Vec<u8>,
}

impl FrameAssembler {
    /// Creates an assembler producing frames of the given byte size.
    pub fn new(frame_size_bytes: usize) -> Self {
        debug_assert!(frame_size_bytes > 0);
        Self {
            frame_size_bytes,
            pending: Vec::new(),
        }
    }

    /// Feeds a chunk and returns every complete frame it unlocks, in order.
    ///
    /// Leftover bytes shorter than one frame are retained and emitted once
    /// enough bytes accumulate; they are never classified or discarded here.
    /// An empty chunk is a legal no-op.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);

        let complete_frames = self.pending.len() / self.frame_size_bytes;
        if complete_frames == 0 {
            return Vec::new();
        }

        let consumed = complete_frames * self.frame_size_bytes;
        let frames = self.pending[..consumed]
            .chunks_exact(self.frame_size_bytes)
            .map(|frame| frame.to_vec())
            .collect();
        self.pending.drain(..consumed);

        frames
    }

    /// Bytes currently held back waiting for a frame boundary.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Takes the pending remainder, leaving the assembler empty.
    pub fn take_pending(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }

    /// Frame size in bytes this assembler produces.
    pub fn frame_size_bytes(&self) -> usize {
        self.frame_size_bytes
    }
}
