//! Caller-supplied scratch memory.
//!
//! Operations never allocate in their hot path; instead the caller hands in
//! a `&mut [Digit]` at least as long as the operation's sizing function
//! (`scratch_len`) demands. An [`Arena`] carves disjoint, zeroed pieces
//! out of it for the duration of one call.

use crate::{Digit, Error, Result};

/// Bump allocator over a borrowed digit buffer.
pub struct Arena<'a> {
    rest: &'a mut [Digit],
}

impl<'a> Arena<'a> {
    pub fn new(buffer: &'a mut [Digit]) -> Self {
        Self { rest: buffer }
    }

    /// Take `len` zeroed digits off the front.
    ///
    /// Fails with `SizeError` if the buffer is exhausted.
    pub fn alloc(&mut self, len: usize) -> Result<&'a mut [Digit]> {
        if len > self.rest.len() {
            return Err(Error::SizeError);
        }
        let rest = core::mem::take(&mut self.rest);
        let (head, tail) = rest.split_at_mut(len);
        self.rest = tail;
        head.iter_mut().for_each(|digit| *digit = 0);
        Ok(head)
    }

    /// Everything that is left, for callees that carve their own arena.
    pub fn rest(self) -> &'a mut [Digit] {
        self.rest
    }
}

/// Checks a scratch buffer against its sizing function before any work is done.
pub(crate) fn check(scratch: &[Digit], required: usize) -> Result<()> {
    if scratch.len() < required {
        log::trace!("scratch of {} digits, {} required", scratch.len(), required);
        return Err(Error::SizeError);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn carves_disjoint_zeroed_pieces() {
        let mut buffer = [7 as Digit; 10];
        let mut arena = Arena::new(&mut buffer);

        let a = arena.alloc(3).unwrap();
        let b = arena.alloc(4).unwrap();
        assert_eq!(a, &[0, 0, 0]);
        assert_eq!(b, &[0, 0, 0, 0]);
        a[0] = 1;
        b[0] = 2;

        assert_eq!(arena.alloc(4).err(), Some(Error::SizeError));
        assert_eq!(arena.rest().len(), 3);
        assert_eq!(buffer[0], 1);
        assert_eq!(buffer[3], 2);
    }

    #[test]
    fn check_rejects_short_buffers() {
        assert_eq!(check(&[0; 3], 4), Err(Error::SizeError));
        assert!(check(&[0; 4], 4).is_ok());
    }
}
