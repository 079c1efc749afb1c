//! OSW sliding window

use arraydeque::{ArrayDeque, Wrapping};

#[cfg(not(test))]
use log::trace;

#[cfg(test)]
use std::println as trace;

use crate::osw::Osw;

/// Sliding window length, in OSWs
///
/// The longest message is three OSWs. One more slot holds a
/// resynchronization sentinel, and the last is margin.
pub const OSW_QUEUE_SIZE: usize = 5;

/// Fixed-capacity window of the most recent OSWs
///
/// New OSWs are pushed onto the back. When the window is full,
/// the oldest OSW is silently dropped.
///
/// The pattern matcher reads the window through a [`Cursor`].
/// Reading never modifies the window. Once a pattern is fully
/// matched, the caller [commits](OswWindow::commit) the cursor to
/// remove the OSWs it consumed. To roll back a partial match,
/// just discard the cursor: every OSW stays where it was.
#[derive(Clone, Debug)]
pub struct OswWindow {
    words: ArrayDeque<Osw, OSW_QUEUE_SIZE, Wrapping>,
}

/// Read position within an [`OswWindow`]
///
/// A cursor is a plain index and is cheap to copy. Save a copy
/// to mark a position you may need to return to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(usize);

impl OswWindow {
    /// New, empty window
    pub fn new() -> Self {
        Self {
            words: ArrayDeque::new(),
        }
    }

    /// Append an OSW, dropping the oldest if full
    pub fn push(&mut self, osw: Osw) {
        if let Some(dropped) = self.words.push_back(osw) {
            trace!("window: dropped cmd={:#05x} at {:.3}", dropped.cmd(), dropped.ts());
        }
    }

    /// Discard every OSW
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Number of OSWs in the window
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if the window is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// True if the window holds [`OSW_QUEUE_SIZE`] OSWs
    pub fn is_full(&self) -> bool {
        self.words.is_full()
    }

    /// Cursor positioned at the oldest OSW
    pub fn cursor(&self) -> Cursor {
        Cursor(0)
    }

    /// Read the OSW at `cursor` and advance it
    ///
    /// Returns `None`, leaving the cursor unchanged, if the cursor
    /// is past the end of the window.
    pub fn next(&self, cursor: &mut Cursor) -> Option<Osw> {
        let osw = self.words.get(cursor.0).copied()?;
        cursor.0 += 1;
        Some(osw)
    }

    /// Remove every OSW before `cursor`
    pub fn commit(&mut self, cursor: Cursor) {
        for _ in 0..cursor.0 {
            let _ = self.words.pop_front();
        }
    }

    /// Iterator over the OSWs, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Osw> {
        self.words.iter()
    }
}

impl Default for OswWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl Cursor {
    /// Number of OSWs read through this cursor
    pub fn consumed(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bandplan::BandPlan;

    fn osw(cmd: u16) -> Osw {
        Osw::new(0x1000, false, cmd, cmd as f64, &BandPlan::Domestic800)
    }

    fn cmds(window: &OswWindow) -> Vec<u16> {
        window.iter().map(|o| o.cmd()).collect()
    }

    #[test]
    fn test_push_drops_oldest() {
        let mut window = OswWindow::new();
        for cmd in 0..OSW_QUEUE_SIZE as u16 {
            assert!(!window.is_full());
            window.push(osw(cmd));
        }
        assert!(window.is_full());
        assert_eq!(vec![0, 1, 2, 3, 4], cmds(&window));

        window.push(osw(5));
        assert_eq!(OSW_QUEUE_SIZE, window.len());
        assert_eq!(vec![1, 2, 3, 4, 5], cmds(&window));

        window.clear();
        assert!(window.is_empty());
    }

    #[test]
    fn test_cursor_commit_and_rollback() {
        let mut window = OswWindow::new();
        for cmd in 10..15 {
            window.push(osw(cmd));
        }

        let mut cur = window.cursor();
        assert_eq!(Some(10), window.next(&mut cur).map(|o| o.cmd()));
        let saved = cur;
        assert_eq!(Some(11), window.next(&mut cur).map(|o| o.cmd()));
        assert_eq!(Some(12), window.next(&mut cur).map(|o| o.cmd()));
        assert_eq!(3, cur.consumed());

        // reading never changes the window
        assert_eq!(vec![10, 11, 12, 13, 14], cmds(&window));

        // roll back to the saved position and commit only the first
        window.commit(saved);
        assert_eq!(vec![11, 12, 13, 14], cmds(&window));

        // reads past the end stop without advancing
        let mut cur = window.cursor();
        while window.next(&mut cur).is_some() {}
        assert_eq!(4, cur.consumed());
        assert_eq!(None, window.next(&mut cur));
        assert_eq!(4, cur.consumed());

        window.commit(cur);
        assert!(window.is_empty());
    }
}
