//! Property-based testing utilities using proptest.

use proptest::prelude::*;

/// One step in a generated booking workload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingOp {
    /// User `n` books the class
    Book(usize),
    /// Cancel the `n`-th booking made so far (modulo the count)
    Cancel(usize),
}

/// Strategy for a single [`BookingOp`] drawn from `users` distinct users.
pub fn booking_op(users: usize) -> impl Strategy<Value = BookingOp> {
    let users = users.max(1);
    prop_oneof![
        3 => (0..users).prop_map(BookingOp::Book),
        2 => any::<usize>().prop_map(BookingOp::Cancel),
    ]
}

/// Strategy for a workload of up to `max_len` operations.
pub fn booking_ops(users: usize, max_len: usize) -> impl Strategy<Value = Vec<BookingOp>> {
    prop::collection::vec(booking_op(users), 0..=max_len)
}
