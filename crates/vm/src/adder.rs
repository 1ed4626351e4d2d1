//! The adder module contains a VM that sums a program of single byte instructions.

use crate::{Digest, StepVm, VmError};
use ethers::{
    types::{Bytes, U256},
    utils::keccak256,
};

/// The [AdderVm] adds one program byte to a 256 bit accumulator per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdderVm;

impl StepVm for AdderVm {
    type State = U256;
    type Action = u8;

    fn initial_state(&self) -> U256 {
        U256::zero()
    }

    fn step(&self, state: &U256, action: &u8) -> U256 {
        state.overflowing_add(U256::from(*action)).0
    }

    fn commit(&self, state: &U256) -> Digest {
        Digest::from(keccak256(self.encode_state(state)))
    }

    fn encode_state(&self, state: &U256) -> Bytes {
        let mut word = [0u8; 32];
        state.to_big_endian(&mut word);
        Bytes::from(word.to_vec())
    }

    fn decode_state(&self, bytes: &[u8]) -> Result<U256, VmError> {
        VmError::check_len("adder state", bytes, 32)?;
        Ok(U256::from_big_endian(bytes))
    }

    fn encode_action(&self, action: &u8) -> Bytes {
        Bytes::from(vec![*action])
    }

    fn decode_action(&self, bytes: &[u8]) -> Result<u8, VmError> {
        VmError::check_len("adder instruction", bytes, 1)?;
        Ok(bytes[0])
    }
}
