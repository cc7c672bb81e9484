use std::fmt;


/// Combined result of the multi-step full clear.
///
/// The steps are not transactional: `PartialFailure` can mean the
/// document entry is already gone while the member count was not adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Entry removed and member count decremented.
    FullSuccess,
    /// The entity had a section but removing its entry or decrementing
    /// the section's member count failed.
    PartialFailure,
    /// The entity had no section, so there were no stats to clear.
    NotApplicable,
}

impl ClearOutcome {
    pub(crate) fn combine(had_section: bool, entry_removed: bool, count_decremented: bool) -> Self {
        if !had_section {
            ClearOutcome::NotApplicable
        } else if entry_removed && count_decremented {
            ClearOutcome::FullSuccess
        } else {
            ClearOutcome::PartialFailure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ClearOutcome::FullSuccess)
    }
}

impl fmt::Display for ClearOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearOutcome::FullSuccess => f.write_str(
                "Your stats have been cleared! Please join a new section if you wish to participate again.",
            ),
            ClearOutcome::PartialFailure => f.write_str(
                "An error occurred while clearing your stats. Please contact an admin.",
            ),
            ClearOutcome::NotApplicable => f.write_str(
                "Your section assignment was cleared, but no corresponding stats were found.",
            ),
        }
    }
}
