//! The rps module contains a repeated rock-paper-scissors game expressed as a [StepVm].
//!
//! Each step is one round. An action is a single 32 byte word whose low nibble carries both
//! moves (bits `0..=1` for player one, bits `2..=3` for player two) and the state is a 32 byte
//! word holding player one's wins in its low 128 bits and player two's in its high 128 bits.

use crate::{Digest, StepVm, VmError};
use ethers::{types::Bytes, utils::keccak256};
use std::{fmt, str::FromStr};

/// The size of an encoded action and of an encoded state.
const WORD_SIZE: usize = 32;

/// A single move in a round of rock-paper-scissors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RpsMove {
    Rock = 0,
    Paper = 1,
    Scissors = 2,
}

impl RpsMove {
    /// Decodes a two bit move code. Code `3` is not a move.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Rock),
            1 => Some(Self::Paper),
            2 => Some(Self::Scissors),
            _ => None,
        }
    }

    /// Returns whether `self` wins a round against `other`.
    pub fn beats(self, other: Self) -> bool {
        (self as u8 + 3 - other as u8) % 3 == 1
    }

    fn letter(self) -> char {
        match self {
            Self::Rock => 'R',
            Self::Paper => 'P',
            Self::Scissors => 'S',
        }
    }
}

/// One round of play. `None` marks an illegal move code, which forfeits the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpsAction {
    pub player_one: Option<RpsMove>,
    pub player_two: Option<RpsMove>,
}

impl RpsAction {
    /// Creates a round where both players make a legal move.
    pub fn new(player_one: RpsMove, player_two: RpsMove) -> Self {
        Self {
            player_one: Some(player_one),
            player_two: Some(player_two),
        }
    }

    fn code(&self) -> u8 {
        let code = |mv: Option<RpsMove>| mv.map_or(3, |mv| mv as u8);
        code(self.player_one) | (code(self.player_two) << 2)
    }
}

impl FromStr for RpsAction {
    type Err = VmError;

    /// Parses a round written as two letters, player one first: `R`, `P`, `S`, or `X` for an
    /// illegal move. `RS` is Rock versus Scissors.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |c: char| match c.to_ascii_uppercase() {
            'R' => Ok(Some(RpsMove::Rock)),
            'P' => Ok(Some(RpsMove::Paper)),
            'S' => Ok(Some(RpsMove::Scissors)),
            'X' => Ok(None),
            other => Err(VmError::InvalidEncoding {
                kind: "rps action",
                reason: format!("unknown move `{other}`"),
            }),
        };
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(one), Some(two), None) => Ok(Self {
                player_one: parse(one)?,
                player_two: parse(two)?,
            }),
            _ => Err(VmError::InvalidEncoding {
                kind: "rps action",
                reason: format!("expected two move letters, got `{s}`"),
            }),
        }
    }
}

impl fmt::Display for RpsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = |mv: Option<RpsMove>| mv.map_or('X', RpsMove::letter);
        write!(f, "{}{}", letter(self.player_one), letter(self.player_two))
    }
}

/// The running score of a repeated game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpsState {
    pub player_one_wins: u128,
    pub player_two_wins: u128,
}

/// The [RpsVm] plays one round of rock-paper-scissors per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpsVm;

impl StepVm for RpsVm {
    type State = RpsState;
    type Action = RpsAction;

    fn initial_state(&self) -> RpsState {
        RpsState::default()
    }

    fn step(&self, state: &RpsState, action: &RpsAction) -> RpsState {
        let mut next = *state;
        match (action.player_one, action.player_two) {
            (Some(one), Some(two)) if one.beats(two) => {
                next.player_one_wins = next.player_one_wins.saturating_add(1)
            }
            (Some(one), Some(two)) if two.beats(one) => {
                next.player_two_wins = next.player_two_wins.saturating_add(1)
            }
            (Some(_), None) => next.player_one_wins = next.player_one_wins.saturating_add(1),
            (None, Some(_)) => next.player_two_wins = next.player_two_wins.saturating_add(1),
            // Ties and double forfeits leave the score untouched.
            _ => {}
        }
        next
    }

    fn commit(&self, state: &RpsState) -> Digest {
        Digest::from(keccak256(self.encode_state(state)))
    }

    fn encode_state(&self, state: &RpsState) -> Bytes {
        let mut word = [0u8; WORD_SIZE];
        word[..16].copy_from_slice(&state.player_two_wins.to_be_bytes());
        word[16..].copy_from_slice(&state.player_one_wins.to_be_bytes());
        Bytes::from(word.to_vec())
    }

    fn decode_state(&self, bytes: &[u8]) -> Result<RpsState, VmError> {
        VmError::check_len("rps state", bytes, WORD_SIZE)?;
        let mut half = [0u8; 16];
        half.copy_from_slice(&bytes[..16]);
        let player_two_wins = u128::from_be_bytes(half);
        half.copy_from_slice(&bytes[16..]);
        let player_one_wins = u128::from_be_bytes(half);
        Ok(RpsState {
            player_one_wins,
            player_two_wins,
        })
    }

    fn encode_action(&self, action: &RpsAction) -> Bytes {
        let mut word = [0u8; WORD_SIZE];
        word[WORD_SIZE - 1] = action.code();
        Bytes::from(word.to_vec())
    }

    fn decode_action(&self, bytes: &[u8]) -> Result<RpsAction, VmError> {
        VmError::check_len("rps action", bytes, WORD_SIZE)?;
        let code = bytes[WORD_SIZE - 1];
        if code > 0x0f || bytes[..WORD_SIZE - 1].iter().any(|b| *b != 0) {
            return Err(VmError::InvalidEncoding {
                kind: "rps action",
                reason: "only the low nibble may be set".to_owned(),
            });
        }
        Ok(RpsAction {
            player_one: RpsMove::from_code(code & 0b11),
            player_two: RpsMove::from_code(code >> 2),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::DynStepVm;

    const EMPTY_COMMITMENT: &str =
        "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563";
    const FIRST_COMMITMENT: &str =
        "0xb10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6";

    /// The rounds of the reference repeated game, player one first.
    const ROUNDS: [&str; 7] = ["RS", "RP", "PR", "PS", "SP", "SR", "RS"];

    fn rounds() -> Vec<RpsAction> {
        ROUNDS
            .iter()
            .map(|r| RpsAction::from_str(r).unwrap())
            .collect()
    }

    fn word(last: u8) -> Vec<u8> {
        let mut w = vec![0u8; 32];
        w[31] = last;
        w
    }

    #[test]
    fn merklizes_reference_states() {
        let empty = Digest::from_str(EMPTY_COMMITMENT).unwrap();
        let first = Digest::from_str(FIRST_COMMITMENT).unwrap();
        assert_eq!(RpsVm.merklize_state(&[0u8; 32]).unwrap(), empty);
        assert_eq!(RpsVm.merklize_state(&word(1)).unwrap(), first);
        assert_eq!(RpsVm.initial_commitment(), empty);
    }

    #[test]
    fn action_encoding_matches_reference_words() {
        let expected = [0x08, 0x04, 0x01, 0x09, 0x06, 0x02, 0x08];
        for (action, code) in rounds().iter().zip(expected) {
            assert_eq!(RpsVm.encode_action(action).to_vec(), word(code));
            assert_eq!(RpsVm.decode_action(&word(code)).unwrap(), *action);
        }
    }

    #[test]
    fn first_round_scores_player_one() {
        let next = RpsVm.run_step(&[0u8; 32], &word(0x08)).unwrap();
        assert_eq!(next.to_vec(), word(1));
    }

    #[test]
    fn runs_reference_game() {
        let actions = rounds();
        let (state, _) = StepVm::run_steps(&RpsVm, &actions[..], 0).unwrap();
        assert_eq!(state, RpsState::default());

        let (state, digest) = StepVm::run_steps(&RpsVm, &actions[..], actions.len()).unwrap();
        assert_eq!(
            state,
            RpsState {
                player_one_wins: 4,
                player_two_wins: 3
            }
        );
        assert_eq!(digest, RpsVm.commit(&state));
    }

    #[test]
    fn fold_is_consistent_with_step() {
        let actions = rounds();
        for k in 0..actions.len() {
            let (state, _) = StepVm::run_steps(&RpsVm, &actions[..], k).unwrap();
            let (next, digest) = StepVm::run_steps(&RpsVm, &actions[..], k + 1).unwrap();
            assert_eq!(RpsVm.step(&state, &actions[k]), next);
            assert_eq!(RpsVm.commit(&next), digest);
        }
    }

    #[test]
    fn illegal_moves_are_penalties() {
        let start = RpsState::default();
        let forfeit_one = RpsAction::from_str("XR").unwrap();
        assert_eq!(RpsVm.step(&start, &forfeit_one).player_two_wins, 1);
        let forfeit_two = RpsAction::from_str("PX").unwrap();
        assert_eq!(RpsVm.step(&start, &forfeit_two).player_one_wins, 1);
        let both = RpsAction::from_str("XX").unwrap();
        assert_eq!(RpsVm.step(&start, &both), start);
        let tie = RpsAction::from_str("SS").unwrap();
        assert_eq!(RpsVm.step(&start, &tie), start);
    }

    #[test]
    fn rejects_malformed_encodings() {
        assert!(matches!(
            RpsVm.run_step(&[0u8; 31], &word(0x08)),
            Err(VmError::InvalidLength { .. })
        ));
        assert!(matches!(
            RpsVm.run_step(&[0u8; 32], &word(0x18)),
            Err(VmError::InvalidEncoding { .. })
        ));
        assert!(RpsAction::from_str("RSP").is_err());
        assert!(RpsAction::from_str("RQ").is_err());
        assert!(matches!(
            StepVm::run_steps(&RpsVm, &rounds()[..], 8),
            Err(VmError::StepCountOutOfRange { count: 8, .. })
        ));
    }
}
