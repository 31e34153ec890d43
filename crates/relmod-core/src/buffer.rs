//! Two-pass buffer writer.
//!
//! Variable-length blobs (course bytecode, the stage-name string table) are
//! built with a measure-then-write discipline so the backing allocation is
//! exactly the right size: run the emit sequence once in measuring mode,
//! materialize a target of the measured size, then run the identical
//! sequence again to copy the bytes. The target is either a fresh heap
//! allocation ([`TwoPassWriter::materialize`]) or a caller-supplied region
//! ([`TwoPassWriter::materialize_into`]), so an emit sequence can land
//! directly in pre-existing host storage without an intermediate copy. The
//! two passes must enumerate the same writes; a writing pass that runs past
//! the measured size is an internal bug and asserts.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Measuring,
    Writing,
}

#[derive(Debug)]
enum Target<'a> {
    Heap(Vec<u8>),
    Region(&'a mut [u8]),
}

#[derive(Debug)]
pub struct TwoPassWriter<'a> {
    mode: Mode,
    measured: usize,
    cursor: usize,
    target: Target<'a>,
}

impl Default for TwoPassWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TwoPassWriter<'a> {
    /// A new writer starts in measuring mode; writes only count bytes.
    pub fn new() -> Self {
        Self {
            mode: Mode::Measuring,
            measured: 0,
            cursor: 0,
            target: Target::Heap(Vec::new()),
        }
    }

    /// Switch to writing mode, allocating exactly the measured size and
    /// resetting the cursor. Idempotent: a second call is a no-op, so shared
    /// call sites can materialize unconditionally after an optional
    /// [`TwoPassWriter::materialize_into`].
    pub fn materialize(&mut self) {
        if self.mode == Mode::Writing {
            return;
        }
        self.target = Target::Heap(vec![0u8; self.measured]);
        self.cursor = 0;
        self.mode = Mode::Writing;
    }

    /// Switch to writing mode targeting a caller-supplied region instead of
    /// a fresh allocation. The region must be exactly the measured size; the
    /// bytes stay in the region, so end the pass with
    /// [`TwoPassWriter::finish`] rather than [`TwoPassWriter::into_bytes`].
    pub fn materialize_into(&mut self, region: &'a mut [u8]) {
        assert!(
            self.mode == Mode::Measuring,
            "two-pass writer already materialized"
        );
        assert!(
            region.len() == self.measured,
            "caller-supplied region is {} bytes but the measuring pass counted {}",
            region.len(),
            self.measured
        );
        self.target = Target::Region(region);
        self.cursor = 0;
        self.mode = Mode::Writing;
    }

    pub fn is_materialized(&self) -> bool {
        self.mode == Mode::Writing
    }

    /// Size counted by the measuring pass so far.
    pub fn measured_len(&self) -> usize {
        self.measured
    }

    /// Bytes written so far in the current pass.
    pub fn written_len(&self) -> usize {
        self.cursor
    }

    /// Offset the next write lands at. Identical across the two passes as
    /// long as the emit sequences are, which lets callers record offsets
    /// into the blob during either pass.
    pub fn position(&self) -> usize {
        match self.mode {
            Mode::Measuring => self.measured,
            Mode::Writing => self.cursor,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) {
        match self.mode {
            Mode::Measuring => {
                self.measured += bytes.len();
            }
            Mode::Writing => {
                assert!(
                    self.cursor + bytes.len() <= self.measured,
                    "two-pass write of {} bytes at {} exceeds measured size {}",
                    bytes.len(),
                    self.cursor,
                    self.measured
                );
                let start = self.cursor;
                match &mut self.target {
                    Target::Heap(buf) => buf[start..start + bytes.len()].copy_from_slice(bytes),
                    Target::Region(region) => {
                        region[start..start + bytes.len()].copy_from_slice(bytes)
                    }
                }
                self.cursor += bytes.len();
            }
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    // The target is big-endian (PowerPC).
    pub fn write_u16_be(&mut self, value: u16) {
        self.write(&value.to_be_bytes());
    }

    pub fn write_u32_be(&mut self, value: u32) {
        self.write(&value.to_be_bytes());
    }

    /// End a writing pass whose bytes live in a caller-supplied region.
    /// Asserts the writing pass covered everything the measuring pass
    /// counted.
    pub fn finish(self) {
        assert!(
            self.mode == Mode::Writing,
            "two-pass writer finished before materialize"
        );
        assert!(
            self.cursor == self.measured,
            "writing pass produced {} bytes but measuring pass counted {}",
            self.cursor,
            self.measured
        );
    }

    /// Consume the writer after a heap-targeted writing pass. Asserts the
    /// writing pass covered everything the measuring pass counted.
    pub fn into_bytes(self) -> Vec<u8> {
        assert!(
            self.mode == Mode::Writing,
            "two-pass writer consumed before materialize"
        );
        assert!(
            self.cursor == self.measured,
            "writing pass produced {} bytes but measuring pass counted {}",
            self.cursor,
            self.measured
        );
        match self.target {
            Target::Heap(buf) => buf,
            Target::Region(_) => panic!("two-pass bytes live in a caller-supplied region"),
        }
    }
}

/// Run the same emit sequence twice through a fresh writer and return the
/// exactly-sized result.
pub fn run_two_pass(mut emit: impl FnMut(&mut TwoPassWriter<'_>)) -> Vec<u8> {
    let mut writer = TwoPassWriter::new();
    emit(&mut writer);
    writer.materialize();
    emit(&mut writer);
    writer.into_bytes()
}
