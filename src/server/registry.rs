use uuid::Uuid;

use crate::game::Seat;

/// Assigns the two player seats to participants in arrival order. Everyone
/// past the second seat is a spectator until a seat frees up; a freed seat
/// goes to the next new participant, lowest seat first.
#[derive(Debug, Default)]
pub struct SeatRegistry {
    seats: [Option<Uuid>; 2],
}

impl SeatRegistry {
    pub fn new() -> Self {
        SeatRegistry::default()
    }

    /// Gives the lowest free seat to the participant, or `None` when both
    /// seats are taken (spectator).
    pub fn assign(&mut self, id: Uuid) -> Option<Seat> {
        let slot = self.seats.iter().position(Option::is_none)?;
        self.seats[slot] = Some(id);
        Seat::from_index(slot as u8)
    }

    /// The seat held by a participant, if any.
    pub fn seat_of(&self, id: &Uuid) -> Option<Seat> {
        self.seats
            .iter()
            .position(|occupant| occupant.as_ref() == Some(id))
            .and_then(|slot| Seat::from_index(slot as u8))
    }

    /// Frees the participant's seat and returns it; `None` for spectators.
    pub fn release(&mut self, id: &Uuid) -> Option<Seat> {
        let slot = self
            .seats
            .iter()
            .position(|occupant| occupant.as_ref() == Some(id))?;
        self.seats[slot] = None;
        Seat::from_index(slot as u8)
    }

    pub fn both_seated(&self) -> bool {
        self.seats.iter().all(Option::is_some)
    }

    pub fn seated_count(&self) -> usize {
        self.seats.iter().filter(|slot| slot.is_some()).count()
    }

    /// The single seated participant, when exactly one seat is occupied.
    pub fn sole_occupant(&self) -> Option<Uuid> {
        match self.seats {
            [Some(id), None] | [None, Some(id)] => Some(id),
            _ => None,
        }
    }

    /// Moves a lone remaining participant to seat 0, so they play first in
    /// the next game regardless of their previous seat.
    pub fn promote_sole_occupant(&mut self) {
        if self.seats[0].is_none() {
            self.seats[0] = self.seats[1].take();
        }
    }
}
