//! Critical section protected cell

use core::cell::UnsafeCell;
use crate::critical::CriticalSection;

/// Storage that hands out `&mut` only to holders of a [`CriticalSection`].
pub struct CsCell<T>(UnsafeCell<T>);

unsafe impl<T> Sync for CsCell<T> {}

impl<T> CsCell<T> {
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// Borrow the contents; the guard proves interrupts are masked.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub fn get(&self, _cs: &CriticalSection) -> &mut T {
        unsafe { &mut *self.0.get() }
    }

    /// Borrow the contents without a guard.
    ///
    /// # Safety
    /// Caller must already exclude every other accessor (exception context
    /// or a guard held further up the stack).
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_unchecked(&self) -> &mut T {
        unsafe { &mut *self.0.get() }
    }
}
