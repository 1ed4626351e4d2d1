//! The step VM abstraction used by the verification game, along with the concrete VMs that
//! ship with it.
//!
//! A VM defines a computation domain: how a state is encoded, how a single step transitions a
//! state given one input, and how a state is committed to. The game engine never sees a typed
//! state; it works through the byte-level [DynStepVm] handle that every [StepVm] receives for
//! free.

use ethers::types::{Bytes, H256};

mod error;
pub use error::VmError;

mod registry;
pub use registry::{VmId, VmRegistry};

mod rps;
pub use rps::{RpsAction, RpsMove, RpsState, RpsVm};

mod adder;
pub use adder::AdderVm;

/// The [Digest] type is the commitment to a VM state.
pub type Digest = H256;

/// The [StepVm] trait defines a deterministic computation that advances one step at a time.
pub trait StepVm: Send + Sync {
    /// The decoded state of the VM.
    type State: Clone;
    /// The decoded input that drives a single step.
    type Action;

    /// Returns the canonical starting state.
    fn initial_state(&self) -> Self::State;

    /// Applies a single action to a state. Illegal actions must be expressed as a penalty or a
    /// no-op; a step never fails.
    fn step(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Commits to a state.
    fn commit(&self, state: &Self::State) -> Digest;

    /// Encodes a state into its canonical byte form.
    fn encode_state(&self, state: &Self::State) -> Bytes;

    /// Decodes a state from its canonical byte form.
    fn decode_state(&self, bytes: &[u8]) -> Result<Self::State, VmError>;

    /// Encodes an action into its canonical byte form.
    fn encode_action(&self, action: &Self::Action) -> Bytes;

    /// Decodes an action from its canonical byte form.
    fn decode_action(&self, bytes: &[u8]) -> Result<Self::Action, VmError>;

    /// Applies the first `count` actions to the initial state.
    ///
    /// ### Takes
    /// - `actions`: The full action sequence.
    /// - `count`: The number of actions to apply, `0..=actions.len()`.
    ///
    /// ### Returns
    /// - `Ok((State, Digest))`: The resulting state and its commitment.
    /// - `Err(VmError)`: `count` exceeds the number of supplied actions.
    fn run_steps(
        &self,
        actions: &[Self::Action],
        count: usize,
    ) -> Result<(Self::State, Digest), VmError> {
        let applied = actions
            .get(..count)
            .ok_or(VmError::StepCountOutOfRange {
                count,
                available: actions.len(),
            })?;
        let state = applied
            .iter()
            .fold(self.initial_state(), |state, action| self.step(&state, action));
        let digest = self.commit(&state);
        Ok((state, digest))
    }
}

/// The [DynStepVm] trait is the object safe, byte level view of a [StepVm]. States and actions
/// cross this boundary in their encoded form, so decoding is the only way a call can fail.
pub trait DynStepVm: Send + Sync {
    /// Returns the encoded initial state.
    fn initial_state(&self) -> Bytes;

    /// Returns the commitment to the initial state.
    fn initial_commitment(&self) -> Digest;

    /// Applies one encoded action to an encoded state.
    fn run_step(&self, state: &[u8], action: &[u8]) -> Result<Bytes, VmError>;

    /// Commits to an encoded state.
    fn merklize_state(&self, state: &[u8]) -> Result<Digest, VmError>;

    /// Applies the first `count` encoded actions to the initial state.
    fn run_steps(&self, actions: &[Bytes], count: usize) -> Result<(Bytes, Digest), VmError>;
}

impl<V: StepVm> DynStepVm for V {
    fn initial_state(&self) -> Bytes {
        self.encode_state(&StepVm::initial_state(self))
    }

    fn initial_commitment(&self) -> Digest {
        self.commit(&StepVm::initial_state(self))
    }

    fn run_step(&self, state: &[u8], action: &[u8]) -> Result<Bytes, VmError> {
        let state = self.decode_state(state)?;
        let action = self.decode_action(action)?;
        Ok(self.encode_state(&self.step(&state, &action)))
    }

    fn merklize_state(&self, state: &[u8]) -> Result<Digest, VmError> {
        Ok(self.commit(&self.decode_state(state)?))
    }

    fn run_steps(&self, actions: &[Bytes], count: usize) -> Result<(Bytes, Digest), VmError> {
        if count > actions.len() {
            return Err(VmError::StepCountOutOfRange {
                count,
                available: actions.len(),
            });
        }
        let decoded = actions[..count]
            .iter()
            .map(|action| self.decode_action(action))
            .collect::<Result<Vec<_>, _>>()?;
        let (state, digest) = StepVm::run_steps(self, &decoded, count)?;
        Ok((self.encode_state(&state), digest))
    }
}
