//! Ready list: intrusive doubly linked list of TCBs at one priority
//!
//! Tasks join at the tail and are scheduled from the head, which gives FIFO
//! order and lets round-robin rotate by moving the head to the tail.

use core::ptr::NonNull;

use crate::task::Tcb;

#[derive(Debug, Clone, Copy)]
pub struct ReadyList {
    head: Option<NonNull<Tcb>>,
    tail: Option<NonNull<Tcb>>,
}

impl ReadyList {
    pub const fn new() -> Self {
        ReadyList { head: None, tail: None }
    }

    #[inline]
    pub fn head(&self) -> Option<NonNull<Tcb>> {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> Option<NonNull<Tcb>> {
        self.tail
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Append `tcb`.
    ///
    /// # Safety
    /// `tcb` must be valid and linked into no other ready list.
    pub unsafe fn insert_tail(&mut self, tcb: NonNull<Tcb>) {
        let tcb_ref = unsafe { &mut *tcb.as_ptr() };
        tcb_ref.next_ptr = None;
        tcb_ref.prev_ptr = self.tail;

        match self.tail {
            Some(tail) => unsafe { (*tail.as_ptr()).next_ptr = Some(tcb) },
            None => self.head = Some(tcb),
        }
        self.tail = Some(tcb);
    }

    /// Unlink `tcb`.
    ///
    /// # Safety
    /// `tcb` must be valid and currently linked into this list.
    pub unsafe fn remove(&mut self, tcb: NonNull<Tcb>) {
        let tcb_ref = unsafe { &mut *tcb.as_ptr() };

        match tcb_ref.prev_ptr {
            Some(prev) => unsafe { (*prev.as_ptr()).next_ptr = tcb_ref.next_ptr },
            None => self.head = tcb_ref.next_ptr,
        }
        match tcb_ref.next_ptr {
            Some(next) => unsafe { (*next.as_ptr()).prev_ptr = tcb_ref.prev_ptr },
            None => self.tail = tcb_ref.prev_ptr,
        }

        tcb_ref.prev_ptr = None;
        tcb_ref.next_ptr = None;
    }
}

impl Default for ReadyList {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: only touched inside critical sections
unsafe impl Send for ReadyList {}
unsafe impl Sync for ReadyList {}
