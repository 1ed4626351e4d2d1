//! The bisection verification game.
//!
//! A solver claims the digest of the state reached after running a sequence of inputs through a
//! [vgame_vm::StepVm]; a verifier disputes it. The two narrow the disputed trace by bisection
//! until a single step remains, which is then replayed against the committed inputs. Two
//! variants share the same arena:
//!
//! - [BisectionGame] binds the inputs through an ordered Merkle root, and the final step carries
//!   an inclusion proof for the disputed action.
//! - [SimpleQueryGame] stores the program with the game and reads the action from it directly.

mod types;
pub use types::{Game, GameId, Party, Session, Status, StepWitness};

mod interval;
pub use interval::{Advance, Bisection, PendingQuery};

mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

mod events;
pub use events::{GameEvent, Resolution};

mod error;
pub use error::{ErrorKind, GameError};

mod arena;
pub use arena::Arena;

mod game;
pub use game::BisectionGame;

mod simple;
pub use simple::SimpleQueryGame;
