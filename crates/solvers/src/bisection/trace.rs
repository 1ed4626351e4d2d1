//! The trace module holds the [Trace], a participant's local replay of the disputed
//! computation.

use anyhow::{anyhow, Context, Result};
use ethers::types::{Bytes, H256};
use std::{fmt, sync::Arc};
use vgame_game::StepWitness;
use vgame_merkle::OrderedMerkleTree;
use vgame_vm::{Digest, DynStepVm};

/// The [Trace] holds every intermediate state of a run together with the commitment over its
/// actions. Step `k` is the state after applying the first `k` actions; the action producing
/// step `k` is leaf `k - 1` of the tree.
#[derive(Clone)]
pub struct Trace {
    actions: Vec<Bytes>,
    states: Vec<Bytes>,
    digests: Vec<Digest>,
    tree: OrderedMerkleTree,
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("steps", &self.actions.len())
            .field("root", &self.tree.root())
            .field("final_digest", &self.final_digest())
            .finish()
    }
}

impl Trace {
    /// Replays `actions` on `vm` from its initial state.
    pub fn build(vm: Arc<dyn DynStepVm>, actions: Vec<Bytes>) -> Result<Self> {
        let mut states = Vec::with_capacity(actions.len() + 1);
        let mut digests = Vec::with_capacity(actions.len() + 1);
        states.push(vm.initial_state());
        digests.push(vm.initial_commitment());

        for (index, action) in actions.iter().enumerate() {
            let previous = &states[states.len() - 1];
            let next = vm
                .run_step(previous, action)
                .with_context(|| format!("failed to replay step {}", index + 1))?;
            digests.push(vm.merklize_state(&next)?);
            states.push(next);
        }

        let tree = OrderedMerkleTree::from_data(&actions);
        tracing::debug!(target: "vgame-trace", "Built trace of {} steps, root {:?}", actions.len(), tree.root());
        Ok(Self {
            actions,
            states,
            digests,
            tree,
        })
    }

    /// Returns the number of steps in the trace.
    pub fn len(&self) -> u64 {
        self.actions.len() as u64
    }

    /// Returns whether the trace has no steps.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Fetch the encoded state at `step`.
    pub fn state_at(&self, step: u64) -> Result<&Bytes> {
        self.states
            .get(step as usize)
            .ok_or(anyhow!("step {} is beyond the end of the trace", step))
    }

    /// Fetch the state digest at `step`.
    pub fn digest_at(&self, step: u64) -> Result<Digest> {
        self.digests
            .get(step as usize)
            .copied()
            .ok_or(anyhow!("step {} is beyond the end of the trace", step))
    }

    /// Returns the digest of the final state, which is what a solver claims.
    pub fn final_digest(&self) -> Digest {
        self.digests[self.digests.len() - 1]
    }

    /// Returns the ordered Merkle root over the actions.
    pub fn root(&self) -> H256 {
        self.tree.root()
    }

    /// Assembles the evidence for the step ending at `high`.
    ///
    /// ### Takes
    /// - `high`: The disputed step, `1..=len`.
    ///
    /// ### Returns
    /// - `Ok(StepWitness)`: The state at `high - 1`, the digest at `high`, the action producing
    ///   `high` and its inclusion proof.
    /// - `Err(anyhow::Error)`: `high` does not name a step of this trace.
    pub fn witness(&self, high: u64) -> Result<StepWitness> {
        let index = high
            .checked_sub(1)
            .filter(|index| *index < self.len())
            .ok_or(anyhow!("no action produces step {}", high))? as usize;
        Ok(StepWitness {
            low_state: self.states[index].clone(),
            high_state_hash: self.digests[index + 1],
            action: self.actions[index].clone(),
            proof: self.tree.prove(index)?.to_bytes(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use vgame_game::{BisectionGame, SystemClock};
    use vgame_merkle::hash_leaf;
    use vgame_vm::{AdderVm, VmRegistry};

    fn program(bytes: &[u8]) -> Vec<Bytes> {
        bytes.iter().map(|b| Bytes::from(vec![*b])).collect()
    }

    #[test]
    fn digests_follow_the_fold() {
        let actions = program(&[1, 2, 3, 4]);
        let trace = Trace::build(Arc::new(AdderVm), actions.clone()).unwrap();
        assert_eq!(trace.len(), 4);
        for k in 0..=4 {
            let (state, digest) = AdderVm.run_steps(&actions, k).unwrap();
            assert_eq!(trace.state_at(k as u64).unwrap(), &state);
            assert_eq!(trace.digest_at(k as u64).unwrap(), digest);
        }
        assert!(trace.digest_at(5).is_err());
    }

    #[test]
    fn witnesses_check_out_against_the_root() {
        let vm = VmRegistry::builtin().get(&VmRegistry::ADDER.into()).unwrap();
        let trace = Trace::build(vm, program(&[5, 6, 7])).unwrap();
        let witness = trace.witness(2).unwrap();
        assert_eq!(witness.action, Bytes::from(vec![6]));
        assert_eq!(witness.high_state_hash, trace.digest_at(2).unwrap());
        assert!(BisectionGame::<SystemClock>::check_proof_ordered(
            &witness.proof,
            trace.root(),
            hash_leaf(&witness.action),
            1,
        )
        .unwrap());
        assert!(trace.witness(0).is_err());
        assert!(trace.witness(4).is_err());
    }

    #[test]
    fn rejects_undecodable_actions() {
        let err = Trace::build(Arc::new(AdderVm), vec![Bytes::from(vec![1, 2])]).unwrap_err();
        assert!(err.to_string().contains("step 1"));
    }
}
