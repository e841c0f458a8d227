use thiserror::Error;

/// Errors returned by the checked (`try_*`) operations of [`VebTree`](crate::VebTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VebError {
    /// The key does not fit in the tree's universe `[0, 2^bits)`.
    #[error("key {key} is outside the universe [0, 2^{bits})")]
    OutOfRange { key: u32, bits: u32 },
}

pub type Result<T> = std::result::Result<T, VebError>;
