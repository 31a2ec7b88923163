//! Termination predicates for blocking motion primitives.
//!
//! A predicate is polled once per tick with a shared borrow of the
//! transducer layer and answers "stop now?". Constructors capture their
//! baseline (start time, start tacho) when called, so a predicate must be
//! built right before the primitive that consumes it.
//!
//! Side validation is eager: a predicate on an unconfigured auxiliary
//! sensor fails at construction, not mid-motion.
//!
//! [`until_both`] chains two predicates sequentially; [`either`] is the OR
//! used to fold timeouts or an external abort flag into any condition.

use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pivot_common::consts::DEGREES_PER_REVOLUTION;
use pivot_common::side::Side;

use crate::error::KernelResult;
use crate::transducer::Transducers;

/// Stop condition of a motion primitive.
pub trait Predicate {
    /// Evaluate once. `Ok(true)` ends the motion.
    fn poll(&mut self, io: &Transducers) -> KernelResult<bool>;
}

impl<P: Predicate + ?Sized> Predicate for Box<P> {
    fn poll(&mut self, io: &Transducers) -> KernelResult<bool> {
        (**self).poll(io)
    }
}

/// Predicate backed by a closure.
#[derive(Clone)]
pub struct FnPredicate<F>(F);

impl<F> Predicate for FnPredicate<F>
where
    F: FnMut(&Transducers) -> KernelResult<bool>,
{
    fn poll(&mut self, io: &Transducers) -> KernelResult<bool> {
        (self.0)(io)
    }
}

/// Wrap a closure as a predicate.
pub fn from_fn<F>(f: F) -> FnPredicate<F>
where
    F: FnMut(&Transducers) -> KernelResult<bool>,
{
    FnPredicate(f)
}

/// True once more than `ms` milliseconds have elapsed since construction.
pub fn until_time(io: &Transducers, ms: f64) -> impl Predicate + use<> {
    let start = io.now_millis();
    from_fn(move |io: &Transducers| Ok(io.now_millis() - start > ms))
}

/// True when the calibrated reflectance drops below the black threshold.
///
/// `Both` requires Left and Right to be below at the same time.
pub fn until_black(io: &Transducers, side: Side) -> KernelResult<impl Predicate + use<>> {
    let black = io.settings().line.black;
    threshold(io, side, move |value| value < black)
}

/// True when the calibrated reflectance rises above the white threshold.
///
/// `Both` requires Left and Right to be above at the same time.
pub fn until_white(io: &Transducers, side: Side) -> KernelResult<impl Predicate + use<>> {
    let white = io.settings().line.white;
    threshold(io, side, move |value| value > white)
}

fn threshold<C>(io: &Transducers, side: Side, hit: C) -> KernelResult<impl Predicate + use<C>>
where
    C: Fn(f64) -> bool,
{
    let sides: &'static [Side] = match side {
        Side::Both => &Side::PRIMARY,
        Side::Left => &[Side::Left],
        Side::Right => &[Side::Right],
        Side::Alfa => &[Side::Alfa],
        Side::Beta => &[Side::Beta],
    };
    for &s in sides {
        io.read_sensor(s)?;
    }
    Ok(from_fn(move |io: &Transducers| {
        for &s in sides {
            if !hit(io.read_sensor(s)?) {
                return Ok(false);
            }
        }
        Ok(true)
    }))
}

/// True once the calibrated tacho of `side` has moved more than
/// `|degrees| − tacho_err` from its value at construction, in either
/// direction.
pub fn until_degrees(
    io: &Transducers,
    side: Side,
    degrees: f64,
) -> KernelResult<impl Predicate + use<>> {
    let baseline = io.read_tacho(side)?;
    let target = degrees.abs() - io.settings().error.tacho_err;
    Ok(from_fn(move |io: &Transducers| {
        Ok((io.read_tacho(side)? - baseline).abs() > target)
    }))
}

/// Linear wheel travel converted to tacho degrees.
#[inline]
pub fn cm_to_degrees(cm: f64, wheel_diameter: f64) -> f64 {
    cm / (PI * wheel_diameter) * DEGREES_PER_REVOLUTION
}

/// [`until_degrees`] for a linear distance of the wheel contact point.
pub fn until_cm(io: &Transducers, side: Side, cm: f64) -> KernelResult<impl Predicate + use<>> {
    let degrees = cm_to_degrees(cm, io.settings().construction.wheel_diameter);
    until_degrees(io, side, degrees)
}

/// True while `flag` is set. Lets a caller abort a blocking primitive.
pub fn until_flag(flag: Arc<AtomicBool>) -> impl Predicate + use<> {
    from_fn(move |_: &Transducers| Ok(flag.load(Ordering::SeqCst)))
}

/// Never true. The neutral element of [`either`].
pub fn never() -> impl Predicate + use<> {
    from_fn(|_: &Transducers| Ok(false))
}

/// OR of two predicates. Both are evaluated on every poll.
pub fn either<A: Predicate, B: Predicate>(first: A, second: B) -> Either<A, B> {
    Either { first, second }
}

/// See [`either`].
pub struct Either<A, B> {
    first: A,
    second: B,
}

impl<A: Predicate, B: Predicate> Predicate for Either<A, B> {
    fn poll(&mut self, io: &Transducers) -> KernelResult<bool> {
        let a = self.first.poll(io)?;
        let b = self.second.poll(io)?;
        Ok(a || b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    First,
    Second,
}

/// Sequential combinator, see [`until_both`].
pub struct UntilBoth<A, B> {
    first: A,
    second: B,
    phase: Phase,
}

/// Run `first` to completion, then hand over to `second`.
///
/// Never true while `first` is pending. On the poll where `first` turns
/// true it switches phase and returns `second`'s current value; from then
/// on only `second` is polled.
pub fn until_both<A: Predicate, B: Predicate>(first: A, second: B) -> UntilBoth<A, B> {
    UntilBoth {
        first,
        second,
        phase: Phase::First,
    }
}

impl<A: Predicate, B: Predicate> Predicate for UntilBoth<A, B> {
    fn poll(&mut self, io: &Transducers) -> KernelResult<bool> {
        if self.phase == Phase::First {
            if !self.first.poll(io)? {
                return Ok(false);
            }
            self.phase = Phase::Second;
        }
        self.second.poll(io)
    }
}
