//! Tag/length/value walking over a bounded byte window.
//!
//! Used at two nesting levels: information elements inside a management
//! frame, and fields inside one recognized vendor element. Each step reads a
//! 1-byte tag and a 1-byte length, then advances by `2 + length`.
//!
//! The walker stops at the first triplet whose value would extend past the
//! end bound. Everything yielded before that point is intact.

/// One tag/length/value triplet borrowed from the underlying buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: u8,
    /// Offset of the tag byte within the walked buffer.
    pub offset: usize,
    pub value: &'a [u8],
}

impl Tlv<'_> {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Lazy, finite iterator of [`Tlv`] triplets.
#[derive(Debug, Clone)]
pub struct TlvIter<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
    truncated: bool,
}

impl<'a> TlvIter<'a> {
    /// Walk `buf[start..end]`. `end` is clamped to the buffer length.
    pub fn new(buf: &'a [u8], start: usize, end: usize) -> Self {
        let end = end.min(buf.len());
        TlvIter {
            buf,
            pos: start,
            end,
            truncated: false,
        }
    }

    /// Walk the whole of `buf`.
    pub fn over(buf: &'a [u8]) -> Self {
        Self::new(buf, 0, buf.len())
    }

    /// True if the walk stopped on a triplet that overran the end bound
    /// (as opposed to consuming the window exactly).
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Tlv<'a>;

    fn next(&mut self) -> Option<Tlv<'a>> {
        if self.pos >= self.end {
            return None;
        }
        if self.end - self.pos < 2 {
            self.truncated = true;
            self.pos = self.end;
            return None;
        }

        let tag = self.buf[self.pos];
        let len = self.buf[self.pos + 1] as usize;
        let value_start = self.pos + 2;
        let value_end = value_start + len;
        if value_end > self.end {
            log::debug!(
                "TLV tag {tag:#04x} at {} declares {len} bytes, only {} remain",
                self.pos,
                self.end - value_start
            );
            self.truncated = true;
            self.pos = self.end;
            return None;
        }

        let item = Tlv {
            tag,
            offset: self.pos,
            value: &self.buf[value_start..value_end],
        };
        self.pos = value_end;
        Some(item)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_sequence() {
        let buf = [0x01, 0x01, 0xAA, 0x02, 0x00, 0x03, 0x02, 0xBB, 0xCC];
        let items: Vec<_> = TlvIter::over(&buf).collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].tag, 1);
        assert_eq!(items[0].value, &[0xAA]);
        assert!(items[1].is_empty());
        assert_eq!(items[2].offset, 5);
        assert_eq!(items[2].value, &[0xBB, 0xCC]);
    }

    #[test]
    fn test_start_offset() {
        let buf = [0xFF, 0xFF, 0x07, 0x01, 0x09];
        let items: Vec<_> = TlvIter::new(&buf, 2, buf.len()).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tag, 7);
    }

    #[test]
    fn test_overrun_halts() {
        // Second element claims 10 bytes, only 2 remain.
        let buf = [0x01, 0x01, 0xAA, 0xDD, 0x0A, 0x01, 0x02];
        let mut iter = TlvIter::over(&buf);
        assert_eq!(iter.next().map(|t| t.tag), Some(0x01));
        assert!(iter.next().is_none());
        assert!(iter.truncated());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_dangling_tag_byte() {
        let buf = [0x01, 0x00, 0x05];
        let mut iter = TlvIter::over(&buf);
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.truncated());
    }

    #[test]
    fn test_end_bound_respected() {
        // Element fits in the buffer but not inside the declared end.
        let buf = [0x01, 0x03, 0xAA, 0xBB, 0xCC];
        assert_eq!(TlvIter::new(&buf, 0, 4).count(), 0);
        // End beyond the buffer is clamped.
        assert_eq!(TlvIter::new(&buf, 0, 100).count(), 1);
    }

    #[test]
    fn test_never_exceeds_bound_on_arbitrary_input() {
        // Pseudo-random buffers: every yielded value must lie inside the window.
        let mut seed: u32 = 0x1234_5678;
        for _ in 0..500 {
            let mut buf = [0u8; 48];
            for b in buf.iter_mut() {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                *b = (seed >> 16) as u8;
            }
            let end = (seed as usize) % buf.len();
            for tlv in TlvIter::new(&buf, 0, end) {
                assert!(tlv.offset + 2 + tlv.len() <= end);
            }
        }
    }

    #[test]
    fn test_exact_fit_not_truncated() {
        let buf = [0x01, 0x01, 0xAA];
        let mut iter = TlvIter::over(&buf);
        assert_eq!(iter.by_ref().count(), 1);
        assert!(!iter.truncated());
    }
}
