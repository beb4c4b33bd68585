use takotako_core::Post;

pub const DEFAULT_WINDOW_MINUTES: u64 = 25;

/// A post is eligible while `now - created_at <= window_minutes * 60`.
///
/// The bound is inclusive, and posts stamped in the future (clock skew) are
/// always eligible.
pub fn is_eligible(post: &Post, now: i64, window_minutes: u64) -> bool {
    let window_secs = i64::try_from(window_minutes)
        .unwrap_or(i64::MAX)
        .saturating_mul(60);
    now.saturating_sub(post.created_at) <= window_secs
}
