//! Decompositions of [`blockmat::BlockMatrix`].
//!
//! - `RrqrDecomposition`: rank-revealing QR (Householder QR with column pivoting)

pub mod rrqr;

pub use rrqr::{
    default_rrqr_threshold, set_default_rrqr_threshold, RrqrDecomposition, RrqrError,
    RrqrOptions, Result,
};
