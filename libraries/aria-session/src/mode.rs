//! Track index selection per play mode
//!
//! Pure selection policy shared by explicit skips and natural completion.
//! Shuffle draws a random index and never lands on the current one while the
//! queue holds more than one track.

use crate::types::PlayMode;
use rand::Rng;

/// Next index for an explicit skip-to-next.
///
/// Returns `None` only for an empty queue. An explicit skip at the last
/// index wraps to 0 in every mode.
pub fn next_index<R: Rng>(
    mode: PlayMode,
    current: Option<usize>,
    len: usize,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let current = match current {
        Some(current) => current.min(len - 1),
        None => return Some(first_index(mode, len, rng)),
    };

    match mode {
        PlayMode::LoopOne => Some(current),
        PlayMode::Sequential | PlayMode::LoopAll => Some((current + 1) % len),
        PlayMode::Shuffle => Some(random_other(current, len, rng)),
    }
}

/// Next index for an explicit skip-to-previous
pub fn previous_index<R: Rng>(
    mode: PlayMode,
    current: Option<usize>,
    len: usize,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let current = match current {
        Some(current) => current.min(len - 1),
        None => return Some(first_index(mode, len, rng)),
    };

    match mode {
        PlayMode::LoopOne => Some(current),
        PlayMode::Sequential | PlayMode::LoopAll => Some((current + len - 1) % len),
        PlayMode::Shuffle => Some(random_other(current, len, rng)),
    }
}

/// Next index after a track played through naturally.
///
/// `None` means playback stops: the queue is empty, or a sequential queue
/// finished its last track.
pub fn completion_index<R: Rng>(
    mode: PlayMode,
    current: Option<usize>,
    len: usize,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let current = match current {
        Some(current) => current.min(len - 1),
        None => return Some(first_index(mode, len, rng)),
    };

    match mode {
        PlayMode::LoopOne => Some(current),
        PlayMode::LoopAll => Some((current + 1) % len),
        PlayMode::Sequential => {
            if current + 1 < len {
                Some(current + 1)
            } else {
                None
            }
        }
        PlayMode::Shuffle => Some(random_other(current, len, rng)),
    }
}

fn first_index<R: Rng>(mode: PlayMode, len: usize, rng: &mut R) -> usize {
    match mode {
        PlayMode::Shuffle => rng.gen_range(0..len),
        _ => 0,
    }
}

/// Uniform draw over all indices except `current` (when len > 1)
fn random_other<R: Rng>(current: usize, len: usize, rng: &mut R) -> usize {
    if len <= 1 {
        return 0;
    }

    let drawn = rng.gen_range(0..len - 1);
    if drawn >= current {
        drawn + 1
    } else {
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn empty_queue_yields_no_index() {
        let mut rng = thread_rng();
        for mode in [
            PlayMode::Sequential,
            PlayMode::LoopOne,
            PlayMode::LoopAll,
            PlayMode::Shuffle,
        ] {
            assert_eq!(next_index(mode, None, 0, &mut rng), None);
            assert_eq!(previous_index(mode, Some(0), 0, &mut rng), None);
            assert_eq!(completion_index(mode, Some(0), 0, &mut rng), None);
        }
    }

    #[test]
    fn loop_one_stays_on_current() {
        let mut rng = thread_rng();
        assert_eq!(next_index(PlayMode::LoopOne, Some(0), 1, &mut rng), Some(0));
        assert_eq!(next_index(PlayMode::LoopOne, Some(2), 5, &mut rng), Some(2));
        assert_eq!(
            completion_index(PlayMode::LoopOne, Some(2), 5, &mut rng),
            Some(2)
        );
    }

    #[test]
    fn explicit_skip_wraps_at_the_end_in_every_linear_mode() {
        let mut rng = thread_rng();
        assert_eq!(
            next_index(PlayMode::Sequential, Some(2), 3, &mut rng),
            Some(0)
        );
        assert_eq!(next_index(PlayMode::LoopAll, Some(2), 3, &mut rng), Some(0));
        assert_eq!(
            previous_index(PlayMode::Sequential, Some(0), 3, &mut rng),
            Some(2)
        );
    }

    #[test]
    fn sequential_completion_stops_at_the_last_index() {
        let mut rng = thread_rng();
        assert_eq!(
            completion_index(PlayMode::Sequential, Some(1), 3, &mut rng),
            Some(2)
        );
        assert_eq!(
            completion_index(PlayMode::Sequential, Some(2), 3, &mut rng),
            None
        );
        assert_eq!(
            completion_index(PlayMode::LoopAll, Some(2), 3, &mut rng),
            Some(0)
        );
    }

    #[test]
    fn shuffle_never_repeats_current_when_queue_is_larger_than_one() {
        let mut rng = thread_rng();
        for _ in 0..200 {
            let next = next_index(PlayMode::Shuffle, Some(3), 8, &mut rng).unwrap();
            assert_ne!(next, 3);
            assert!(next < 8);
        }
    }

    #[test]
    fn shuffle_on_single_element_queue_returns_it() {
        let mut rng = thread_rng();
        assert_eq!(next_index(PlayMode::Shuffle, Some(0), 1, &mut rng), Some(0));
    }

    #[test]
    fn shuffle_covers_every_other_index() {
        let mut rng = thread_rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(next_index(PlayMode::Shuffle, Some(1), 4, &mut rng).unwrap());
        }
        assert_eq!(seen, [0usize, 2, 3].into_iter().collect());
    }
}
