//! Greedy autoregressive token decoding.

/// Token fed to the decoder on the first step.
pub const BOS_TOKEN: i64 = 2;

/// Token that ends a sequence; never part of the output.
pub const EOS_TOKEN: i64 = 3;

/// Upper bound on decode steps per region.
pub const MAX_DECODE_LENGTH: usize = 40;

/// Index of the highest score; the first maximum wins ties.
///
/// Returns `None` for an empty slice.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            Some(_) if score.is_nan() => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Run greedy decoding against a single-step decoder.
///
/// `step_fn(token_id, step)` returns the scores over the vocabulary for the
/// next token given the previously selected one; it is called with
/// [`BOS_TOKEN`] first and then with each selected id. Decoding stops on
/// [`EOS_TOKEN`] (not included) or after [`MAX_DECODE_LENGTH`] steps.
///
/// An empty score vector is reported through `on_empty`, since it means the
/// decoder output was malformed.
pub fn greedy_decode<F, E>(mut step_fn: F, on_empty: impl Fn(usize) -> E) -> Result<Vec<i64>, E>
where
    F: FnMut(i64, usize) -> Result<Vec<f32>, E>,
{
    let mut tokens = Vec::new();
    let mut token_id = BOS_TOKEN;

    for step in 0..MAX_DECODE_LENGTH {
        let scores = step_fn(token_id, step)?;
        token_id = argmax(&scores).ok_or_else(|| on_empty(step))? as i64;

        if token_id == EOS_TOKEN {
            break;
        }
        tokens.push(token_id);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn logits_for_token(target: usize, vocab_size: usize) -> Vec<f32> {
        (0..vocab_size)
            .map(|i| if i == target { 10.0 } else { -10.0 })
            .collect()
    }

    fn no_scores(step: usize) -> String {
        format!("empty scores at step {step}")
    }

    #[test]
    fn test_argmax_first_maximum_wins() {
        assert_eq!(argmax(&[0.1, 0.9, 0.3, 0.9]), Some(1));
        assert_eq!(argmax(&[-1.0, -1.0]), Some(0));
        assert_eq!(argmax(&[f32::NEG_INFINITY, -3.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax(&[0.5, f32::NAN, 0.7]), Some(2));
    }

    #[test]
    fn test_stops_at_eos() {
        let mut calls = 0;
        let tokens = greedy_decode(
            |_, step| {
                calls += 1;
                Ok::<_, String>(match step {
                    0 => logits_for_token(5, 7),
                    1 => logits_for_token(6, 7),
                    _ => logits_for_token(3, 7),
                })
            },
            no_scores,
        )
        .unwrap();

        assert_eq!(tokens, vec![5, 6]);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_stops_at_max_length() {
        let mut calls = 0;
        let tokens = greedy_decode(
            |_, _| {
                calls += 1;
                Ok::<_, String>(logits_for_token(5, 6))
            },
            no_scores,
        )
        .unwrap();

        assert_eq!(calls, MAX_DECODE_LENGTH);
        assert_eq!(tokens, vec![5; MAX_DECODE_LENGTH]);
    }

    #[test]
    fn test_feeds_previous_token() {
        let mut received = Vec::new();
        greedy_decode(
            |token_id, step| {
                received.push(token_id);
                Ok::<_, String>(match step {
                    0 => logits_for_token(5, 7),
                    1 => logits_for_token(6, 7),
                    _ => logits_for_token(3, 7),
                })
            },
            no_scores,
        )
        .unwrap();

        assert_eq!(received, vec![BOS_TOKEN, 5, 6]);
    }

    #[test]
    fn test_control_tokens_other_than_eos_are_kept() {
        // Filtering happens at detokenization, not in the loop.
        let tokens = greedy_decode(
            |_, step| {
                Ok::<_, String>(match step {
                    0 => logits_for_token(4, 7),
                    1 => logits_for_token(6, 7),
                    _ => logits_for_token(3, 7),
                })
            },
            no_scores,
        )
        .unwrap();

        assert_eq!(tokens, vec![4, 6]);
    }

    #[test]
    fn test_step_error_propagates() {
        let mut calls = 0;
        let err = greedy_decode(
            |_, step| {
                calls += 1;
                if step == 1 {
                    Err("session not loaded".to_string())
                } else {
                    Ok(logits_for_token(5, 6))
                }
            },
            no_scores,
        )
        .unwrap_err();

        assert_eq!(err, "session not loaded");
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_empty_scores_is_error() {
        let err = greedy_decode(|_, _| Ok::<_, String>(Vec::new()), no_scores).unwrap_err();
        assert_eq!(err, "empty scores at step 0");
    }
}
