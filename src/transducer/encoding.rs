//! Label encoding for witness tuples.
//!
//! A witness tuple over `V_order` is read as a base-3 number with
//! coordinate 0 least significant, then shifted by one so that label 0
//! stays reserved for epsilon:
//!
//! ```text
//! label(t₀,…,t_{k-1}) = 1 + Σᵢ tᵢ · 3ⁱ
//! ```
//!
//! Everything here is integer arithmetic on pre-sized buffers; the
//! projection helpers are the hot path of the builder and must not
//! allocate.

use crate::bundle::TernaryTuple;
use crate::features::Ternary;

/// An input/output label. 0 is epsilon and never denotes a tuple.
pub type Label = u64;

/// A machine state id. `qF` is 0; true-states follow in base-3 order.
pub type StateId = u64;

/// The reserved epsilon label.
pub const EPSILON: Label = 0;

/// `3^n` in `u64`, `None` on overflow.
pub fn pow3(n: usize) -> Option<u64> {
    3u64.checked_pow(u32::try_from(n).ok()?)
}

/// The base-3 code of a tuple (label minus one).
pub fn code_of(tuple: &[Ternary]) -> u64 {
    let mut code = 0;
    let mut base = 1;
    for value in tuple {
        code += value.digit() * base;
        base *= 3;
    }
    code
}

/// Encode a tuple as a label.
pub fn encode(tuple: &[Ternary]) -> Label {
    1 + code_of(tuple)
}

/// Decode a base-3 code into a pre-sized buffer.
pub fn decode_into(code: u64, out: &mut [Ternary]) {
    let mut rest = code;
    for slot in out.iter_mut() {
        *slot = Ternary::from_digit(rest % 3);
        rest /= 3;
    }
    debug_assert_eq!(rest, 0, "code out of range for tuple width");
}

/// Decode a label into a fresh tuple of width `len`.
///
/// Returns `None` for epsilon or a label outside `1..=3^len`.
pub fn decode(label: Label, len: usize) -> Option<TernaryTuple> {
    if label == EPSILON {
        return None;
    }
    let code = label - 1;
    if pow3(len).is_some_and(|size| code >= size) {
        return None;
    }
    let mut tuple = TernaryTuple::from_elem(Ternary::Unspec, len);
    decode_into(code, &mut tuple);
    Some(tuple)
}

/// The base-3 code of the coordinates at `positions`, without materialising
/// the projected tuple.
pub fn project_code(tuple: &[Ternary], positions: &[usize]) -> u64 {
    let mut code = 0;
    let mut base = 1;
    for &position in positions {
        code += tuple[position].digit() * base;
        base *= 3;
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_examples() {
        assert_eq!(encode(&[]), 1);
        assert_eq!(encode(&[Ternary::Unspec, Ternary::Unspec]), 1);
        assert_eq!(encode(&[Ternary::Plus, Ternary::Unspec]), 2);
        assert_eq!(encode(&[Ternary::Unspec, Ternary::Plus]), 4);
        assert_eq!(encode(&[Ternary::Minus, Ternary::Minus]), 9);
    }

    #[test]
    fn test_round_trip_all_of_sigma_2() {
        for code in 0..9u64 {
            let label = code + 1;
            let tuple = decode(label, 2).unwrap();
            assert_eq!(encode(&tuple), label);
        }
    }

    #[test]
    fn test_decode_rejects_epsilon_and_overflow() {
        assert!(decode(EPSILON, 2).is_none());
        assert!(decode(10, 2).is_none());
        assert!(decode(9, 2).is_some());
    }

    #[test]
    fn test_project_code_matches_projected_encode() {
        let tuple = [Ternary::Plus, Ternary::Minus, Ternary::Unspec, Ternary::Plus];
        let positions = [1usize, 3];
        let projected: Vec<Ternary> = positions.iter().map(|&p| tuple[p]).collect();
        assert_eq!(project_code(&tuple, &positions), code_of(&projected));
    }

    #[test]
    fn test_pow3_overflow() {
        assert_eq!(pow3(0), Some(1));
        assert_eq!(pow3(3), Some(27));
        assert!(pow3(41).is_none());
    }
}
