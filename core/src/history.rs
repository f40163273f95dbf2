//! # Branch History Utilities
//!
//! A navigation history is an append-only log of [`StepResponse`]s. Entry 0
//! is always the initialization response with step number 0. Because the
//! decision maker can step back and re-navigate, several entries may share a
//! step number; the functions here resolve such branched logs into the path
//! the decision maker is currently on.

use crate::{error::Error, types::StepResponse};

/// Finds the entry to resume from when stepping back to a step number
///
/// Returns the index of the _last_ entry with the given step number. When
/// several entries share the number because the decision maker stepped back
/// before, the most recently appended one wins: it represents the latest
/// intent.
///
/// # Errors
///
/// [`Error::HistoryIntegrity`] if no entry carries the step number.
pub fn step_back_index(history: &[StepResponse], step_number: usize) -> Result<usize, Error> {
    history
        .iter()
        .rposition(|resp| resp.step_number == step_number)
        .ok_or(Error::HistoryIntegrity { step_number })
}

/// Reconstructs the path the decision maker is currently on
///
/// Starting from the last entry, walks backward selecting for each
/// decreasing step number the nearest preceding entry carrying it. The
/// returned indices are in chronological order and always end at the last
/// entry of the history. Abandoned branches are skipped over.
///
/// # Errors
///
/// [`Error::HistoryIntegrity`] if the history is empty or skips a step
/// number on the way down to 0. A gap means the log was tampered with or
/// truncated; it is never silently skipped.
pub fn current_path(history: &[StepResponse]) -> Result<Vec<usize>, Error> {
    let Some(last) = history.len().checked_sub(1) else {
        return Err(Error::HistoryIntegrity { step_number: 0 });
    };
    let mut path = vec![last];
    let mut idx = last;
    for step_number in (0..history[last].step_number).rev() {
        idx = history[..idx]
            .iter()
            .rposition(|resp| resp.step_number == step_number)
            .ok_or(Error::HistoryIntegrity { step_number })?;
        path.push(idx);
    }
    path.reverse();
    Ok(path)
}
