//! Constant-time operations on digit slices.
//!
//! These avoid data-dependent branching and memory access, so secret
//! limb values do not leak through timing. Choices are [`subtle::Choice`]s;
//! selections go through masks, never through `if`.

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use crate::Digit;

/// All ones if `choice` is set, else zero.
#[inline]
pub(crate) fn mask(choice: Choice) -> Digit {
    (choice.unwrap_u8() as Digit).wrapping_neg()
}

/// The lowest bit of `digit`, as a choice.
#[inline]
pub(crate) fn lowest_bit(digit: Digit) -> Choice {
    Choice::from((digit & 1) as u8)
}

#[cfg(test)]
thread_local! {
    /// Secret-dependent selections made on this thread.
    pub(crate) static SELECTIONS: core::cell::Cell<usize> = core::cell::Cell::new(0);
}

#[inline]
pub(crate) fn count_selection() {
    #[cfg(test)]
    SELECTIONS.with(|count| count.set(count.get() + 1));
}

/// `r = if choice { b } else { a }`, all slices of equal length.
pub(crate) fn select(r: &mut [Digit], a: &[Digit], b: &[Digit], choice: Choice) {
    count_selection();
    debug_assert_eq!(r.len(), a.len());
    debug_assert_eq!(r.len(), b.len());
    for ((r, a), b) in r.iter_mut().zip(a).zip(b) {
        *r = Digit::conditional_select(a, b, choice);
    }
}

/// `if choice { r = a }`
pub(crate) fn conditional_assign(r: &mut [Digit], a: &[Digit], choice: Choice) {
    debug_assert_eq!(r.len(), a.len());
    for (r, a) in r.iter_mut().zip(a) {
        r.conditional_assign(a, choice);
    }
}

/// Is every digit zero?
pub(crate) fn is_zero(a: &[Digit]) -> Choice {
    a.iter().fold(0, |acc, digit| acc | digit).ct_eq(&0)
}

/// Final step of Montgomery reduction and of modular addition:
/// given `t + carry·B^n < 2m`, write `t mod m` into `r`.
///
/// `r` and `t` are `m.len()` long; `t` is clobbered.
pub(crate) fn reduce_once(r: &mut [Digit], t: &mut [Digit], carry: Digit, m: &[Digit]) {
    debug_assert_eq!(r.len(), m.len());
    debug_assert_eq!(t.len(), m.len());

    let borrow = crate::arithmetic::subtract::sub_into(r, t, m);
    // keep t only if there was no carry, and t - m borrowed
    let keep_t = !lowest_bit(carry) & lowest_bit(borrow);
    conditional_assign(r, t, keep_t);
}
