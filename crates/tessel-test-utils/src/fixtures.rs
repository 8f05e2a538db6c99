//! Reusable shape-inference fixtures.
//!
//! [`matmul_cases`] is a table of operand shapes, transpose flags and
//! expected outputs covering plain, transposed, batched, and invalid
//! matrix products.

use tessel_core::Shape;

/// One matrix-product shape scenario.
#[derive(Clone, Debug)]
pub struct MatmulCase {
    pub name: &'static str,
    pub lhs: Shape,
    pub rhs: Shape,
    pub trans_a: bool,
    pub trans_b: bool,
    /// `None` when the operands are not compatible.
    pub expected: Option<Shape>,
}

impl MatmulCase {
    fn new(
        name: &'static str,
        lhs: &[usize],
        rhs: &[usize],
        trans_a: bool,
        trans_b: bool,
        expected: Option<&[usize]>,
    ) -> Self {
        Self {
            name,
            lhs: Shape::from_slice(lhs),
            rhs: Shape::from_slice(rhs),
            trans_a,
            trans_b,
            expected: expected.map(Shape::from_slice),
        }
    }
}

/// The standard table of matrix-product cases.
pub fn matmul_cases() -> Vec<MatmulCase> {
    vec![
        MatmulCase::new("plain_2d", &[2, 3], &[3, 4], false, false, Some(&[2, 4])),
        MatmulCase::new("transpose_lhs", &[3, 2], &[3, 4], true, false, Some(&[2, 4])),
        MatmulCase::new("transpose_rhs", &[2, 3], &[4, 3], false, true, Some(&[2, 4])),
        MatmulCase::new("transpose_both", &[3, 2], &[4, 3], true, true, Some(&[2, 4])),
        MatmulCase::new(
            "batch_broadcast",
            &[8, 1, 3, 4],
            &[5, 4, 2],
            false,
            false,
            Some(&[8, 5, 3, 2]),
        ),
        MatmulCase::new(
            "batch_broadcast_rhs_longer",
            &[4, 3, 4],
            &[2, 1, 4, 6],
            false,
            false,
            Some(&[2, 4, 3, 6]),
        ),
        MatmulCase::new("inner_mismatch", &[2, 3], &[5, 4], false, false, None),
        MatmulCase::new("lhs_rank_one", &[3], &[3, 4], false, false, None),
        MatmulCase::new("rhs_rank_one", &[2, 3], &[3], false, false, None),
        MatmulCase::new("batch_mismatch", &[2, 3, 4], &[3, 4, 5], false, false, None),
    ]
}
