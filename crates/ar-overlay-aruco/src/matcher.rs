//! Matching observed codes against a dictionary under rotation.

use crate::Dictionary;

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Rotation `0..=3` such that: `observed_code == rotate(dict_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance between observed and dictionary code (after rotation).
    pub hamming: u8,
}

/// Matcher for a fixed dictionary.
///
/// All four rotations of every code are precomputed up front; matching an
/// observed code is then a linear XOR/popcount scan, which at the
/// dictionary sizes embedded here costs a few hundred comparisons per quad.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Build a matcher for the given dictionary and Hamming budget.
    pub fn new(dict: Dictionary, max_hamming: u8) -> Self {
        let n = dict.marker_size;
        assert!(
            dict.bit_count() <= 64,
            "{n}x{n} grid does not fit a u64 code"
        );

        let rotated = dict
            .codes
            .iter()
            .map(|&base| {
                let r1 = rotate90(base, n);
                let r2 = rotate90(r1, n);
                let r3 = rotate90(r2, n);
                [base, r1, r2, r3]
            })
            .collect();

        Self {
            dict,
            max_hamming,
            rotated,
        }
    }

    #[inline]
    pub fn dictionary(&self) -> Dictionary {
        self.dict
    }

    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Best match for `observed` within the Hamming budget, if any.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;

        for (id, rotations) in self.rotated.iter().enumerate() {
            for (rotation, &code) in rotations.iter().enumerate() {
                let hamming = (observed ^ code).count_ones() as u8;
                let m = Match {
                    id: id as u32,
                    rotation: rotation as u8,
                    hamming,
                };
                if hamming == 0 {
                    return Some(m);
                }
                if hamming <= self.max_hamming && best.is_none_or(|b| hamming < b.hamming) {
                    best = Some(m);
                }
            }
        }

        best
    }
}

/// Rotate a row-major code (`idx = y * n + x`) by `rot` quarter turns.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    (0..rot & 3).fold(code, |c, _| rotate90(c, n))
}

// One clockwise quarter turn: destination (x, y) reads source (n-1-x, y)
// transposed, i.e. source index (n-1-x) * n + y.
fn rotate90(code: u64, n: usize) -> u64 {
    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            if code >> ((n - 1 - x) * n + y) & 1 == 1 {
                out |= 1 << (y * n + x);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn rotate_four_times_is_identity() {
        let code = 0x0123_4567_89ab_cdef_u64;
        let n = 8;
        let r = rotate_code_u64(code, n, 1);
        let r = rotate_code_u64(r, n, 1);
        let r = rotate_code_u64(r, n, 1);
        let r = rotate_code_u64(r, n, 1);
        assert_eq!(code, r);
    }

    #[test]
    fn single_bit_walks_the_corners() {
        // bit at (0,0); quarter turns move it through the other corners
        let n = 4;
        let code = 1u64;
        assert_eq!(rotate_code_u64(code, n, 1), 1 << 3);
        assert_eq!(rotate_code_u64(code, n, 2), 1 << 15);
        assert_eq!(rotate_code_u64(code, n, 3), 1 << 12);
    }

    #[test]
    fn matcher_finds_rotated_code() {
        let dict = builtins::DICT_4X4_100;
        let matcher = Matcher::new(dict, 0);

        let base = dict.codes[24];
        let observed = rotate_code_u64(base, dict.marker_size, 1);
        let m = matcher.match_code(observed).expect("match");
        assert_eq!(m.id, 24);
        assert_eq!(m.rotation, 1);
        assert_eq!(m.hamming, 0);
    }

    #[test]
    fn hamming_budget_is_enforced() {
        // one 4x4 code with a single set bit; its rotations occupy the
        // four grid corners, so a flip of bit 5 is distance 1 from the
        // base code and further from every rotation
        static CODES: [u64; 1] = [0x1];
        let dict = Dictionary {
            name: "TEST_4X4_1",
            marker_size: 4,
            max_correction_bits: 1,
            codes: &CODES,
        };

        let corrupted = CODES[0] ^ (1 << 5);
        assert!(Matcher::new(dict, 0).match_code(corrupted).is_none());

        let m = Matcher::new(dict, 1)
            .match_code(corrupted)
            .expect("within budget");
        assert_eq!(m.id, 0);
        assert_eq!(m.rotation, 0);
        assert_eq!(m.hamming, 1);
    }
}
