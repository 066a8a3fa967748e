pub mod blocks;
pub mod sections;

use blocks::{Blocks, Dialect, RowPolicy};
use sections::{bucket_document, BucketRules, Buckets};

/// Two-pass pipeline: lines → blocks → buckets.
pub fn parse_document<S: AsRef<str>>(
    lines: &[S],
    dialect: Dialect,
    policy: RowPolicy,
    rules: &BucketRules,
) -> Buckets {
    bucket_document(rules, Blocks::new(lines, dialect, policy))
}
