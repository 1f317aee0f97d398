use std::iter::FusedIterator;

use super::layout::{Marker, MARKER_LEN};

/// Left-to-right search for every non-overlapping occurrence of a marker.
///
/// This is a plain byte search; nothing around the marker is interpreted.
pub struct MarkerScan<'a> {
    buffer: &'a [u8],
    marker: Marker,
    cursor: usize,
}

impl Iterator for MarkerScan<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let rest = self.buffer.get(self.cursor..)?;
        match rest.windows(MARKER_LEN).position(|w| w == self.marker) {
            Some(pos) => {
                let offset = self.cursor + pos;
                self.cursor = offset + MARKER_LEN;
                Some(offset)
            }
            None => {
                self.cursor = self.buffer.len() + 1;
                None
            }
        }
    }
}

impl FusedIterator for MarkerScan<'_> {}

pub fn find_marker(buffer: &[u8], marker: Marker, from_offset: usize) -> MarkerScan<'_> {
    MarkerScan {
        buffer,
        marker,
        cursor: from_offset,
    }
}
