use std::fmt::{Display, Formatter, Result as FmtResult};

/// Season and episode numbers of a release, as written in `SxxExx` form.
///
/// Ordering is by season first, then episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeCode {
    pub season: u16,
    pub episode: u16,
}
impl EpisodeCode {
    pub fn new(season: u16, episode: u16) -> Self {
        Self { season, episode }
    }
}

impl Display for EpisodeCode {
    /// Renders the canonical two-digit form, e.g. `S01E02`.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EpisodeCode::new(1, 2), "S01E02")]
    #[case(EpisodeCode::new(10, 0), "S10E00")]
    #[case(EpisodeCode::new(99, 99), "S99E99")]
    fn test_display(#[case] code: EpisodeCode, #[case] expected: &str) {
        assert_eq!(code.to_string(), expected);
    }

    #[test]
    fn test_ordering() {
        assert!(EpisodeCode::new(1, 9) < EpisodeCode::new(2, 1));
        assert!(EpisodeCode::new(2, 1) < EpisodeCode::new(2, 2));
    }
}
