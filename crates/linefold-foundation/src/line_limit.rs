//! Line limit configuration for truncated documents.

/// Maximum number of lines a collapsed document shows.
///
/// `Unlimited` disables truncation entirely: no toggle control is offered
/// and every block renders in full.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineLimit {
    Unlimited,
    /// Line budget for the collapsed presentation. A budget of 0 hides all
    /// content while collapsed.
    Lines(usize),
}

impl LineLimit {
    /// Limit used when a host enables truncation without choosing a count.
    pub const DEFAULT: Self = Self::Lines(5);

    /// Builds a limit from a host-supplied count, clamped to at least one
    /// line.
    pub fn clamped(lines: usize) -> Self {
        Self::Lines(lines.max(1))
    }

    /// `None` for a host value that disables truncation.
    pub fn from_optional(lines: Option<usize>) -> Self {
        lines.map_or(Self::Unlimited, Self::clamped)
    }

    #[inline]
    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Lines(_))
    }

    /// Line budget handed to the allocator.
    pub fn budget(&self) -> Option<usize> {
        match self {
            Self::Unlimited => None,
            Self::Lines(lines) => Some(*lines),
        }
    }
}

impl Default for LineLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_five_lines() {
        assert_eq!(LineLimit::default(), LineLimit::Lines(5));
        assert_eq!(LineLimit::default().budget(), Some(5));
    }

    #[test]
    fn clamped_never_goes_below_one() {
        assert_eq!(LineLimit::clamped(0), LineLimit::Lines(1));
        assert_eq!(LineLimit::clamped(3), LineLimit::Lines(3));
    }

    #[test]
    fn optional_none_is_unlimited() {
        let limit = LineLimit::from_optional(None);
        assert!(!limit.is_limited());
        assert_eq!(limit.budget(), None);
        assert_eq!(LineLimit::from_optional(Some(0)), LineLimit::Lines(1));
    }
}
