//! Synchronous queries against the host game client.

use std::rc::Rc;

use crate::types::{ActorPosition, GameState};

/// Read-only view of the host client consulted while handling events.
pub trait Client {
    fn game_state(&self) -> GameState;

    /// The local player's position, `None` when the host has none to give.
    fn local_player_position(&self) -> Option<ActorPosition>;
}

impl<C: Client + ?Sized> Client for Rc<C> {
    fn game_state(&self) -> GameState {
        (**self).game_state()
    }

    fn local_player_position(&self) -> Option<ActorPosition> {
        (**self).local_player_position()
    }
}

impl<C: Client + ?Sized> Client for Box<C> {
    fn game_state(&self) -> GameState {
        (**self).game_state()
    }

    fn local_player_position(&self) -> Option<ActorPosition> {
        (**self).local_player_position()
    }
}
