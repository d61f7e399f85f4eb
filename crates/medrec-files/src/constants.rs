/// Prefix of every reference minted by [`crate::ObjectUrlRegistry`].
pub const REFERENCE_PREFIX: &str = "blob:medrec/";

/// Name used when a file handle has no usable final path component.
pub(crate) const UNKNOWN_FILENAME: &str = "unknown";
