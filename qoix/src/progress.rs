use core::ops::ControlFlow;

/// Observes encoding and decoding one row at a time, and may abort it.
///
/// Abort requests are only honored at row boundaries. An aborted call returns normally with an
/// aborted status. Whatever was written to the output up to that point is left there for the
/// caller to discard.
pub trait Progress {
    /// Called before the first pixel of `row` is processed, `rows` being the image height.
    fn row_started(&mut self, row: u32, rows: u32) -> ControlFlow<()>;
}

/// Never aborts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    #[inline]
    fn row_started(&mut self, _row: u32, _rows: u32) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<F> Progress for F
where
    F: FnMut(u32, u32) -> ControlFlow<()>,
{
    #[inline]
    fn row_started(&mut self, row: u32, rows: u32) -> ControlFlow<()> {
        self(row, rows)
    }
}
