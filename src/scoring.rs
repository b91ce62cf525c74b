// src/scoring.rs

use crate::error::AppError;

/// Points awarded per correctly answered question.
pub const POINTS_PER_CORRECT: i32 = 10;

/// Grades a submitted attempt against the quiz's stored answer key.
///
/// The two slices are positional: `submitted[i]` is the chosen option index
/// for the question whose correct index is `correct[i]`. Lengths must match;
/// a wrong count is an `AnswerCountMismatch`. An out-of-range submitted index
/// simply never matches, it is not an error. No partial credit, no penalty.
pub fn score_answers(correct: &[i32], submitted: &[i32]) -> Result<i32, AppError> {
    if correct.len() != submitted.len() {
        return Err(AppError::AnswerCountMismatch {
            expected: correct.len(),
            submitted: submitted.len(),
        });
    }

    let hits = correct
        .iter()
        .zip(submitted)
        .filter(|(want, got)| want == got)
        .count() as i32;

    Ok(hits * POINTS_PER_CORRECT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_ten_points_per_match() {
        assert_eq!(score_answers(&[0, 1, 2], &[0, 1, 3]).unwrap(), 20);
    }

    #[test]
    fn all_correct_and_all_wrong() {
        assert_eq!(score_answers(&[1, 1, 1], &[1, 1, 1]).unwrap(), 30);
        assert_eq!(score_answers(&[0, 0, 0], &[1, 2, 3]).unwrap(), 0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = score_answers(&[0, 1, 2], &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            AppError::AnswerCountMismatch {
                expected: 3,
                submitted: 2
            }
        ));
    }

    #[test]
    fn out_of_range_submission_just_misses() {
        // 99 is not a valid option index anywhere; it scores 0, not an error.
        assert_eq!(score_answers(&[0], &[99]).unwrap(), 0);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        assert_eq!(score_answers(&[], &[]).unwrap(), 0);
    }
}
