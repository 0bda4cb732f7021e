//! Per-room user bookkeeping.
//!
//! Users live in a dense `Vec` so snapshots keep join order; `index` maps each
//! id to its slot and `occupied` holds one cell per user. The three always have
//! the same length.

use super::errors::RoomError;
use super::types::{Direction, Position, RoomId, User, UserId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct UserIndex {
    room_id: RoomId,
    limit: usize,
    users: Vec<User>,
    occupied: HashSet<Position>,
    index: HashMap<UserId, usize>,
}

/// Result of removing a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub remaining: usize,
    pub position: Position,
}

impl Removal {
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }
}

impl UserIndex {
    pub fn new(room_id: RoomId, limit: usize) -> Self {
        Self {
            room_id,
            limit,
            users: Vec::with_capacity(limit),
            occupied: HashSet::with_capacity(limit),
            index: HashMap::with_capacity(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.users.len() >= self.limit
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn occupied(&self) -> &HashSet<Position> {
        &self.occupied
    }

    pub fn lookup(&self, user_id: &UserId) -> Option<usize> {
        self.index.get(user_id).copied()
    }

    pub fn get(&self, user_id: &UserId) -> Option<&User> {
        self.lookup(user_id).map(|idx| &self.users[idx])
    }

    /// Appends `user` at the next slot. Every check runs before any field is
    /// touched, so a rejected join leaves the index unchanged.
    pub fn join(&mut self, user: User) -> Result<usize, RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull(self.room_id.clone()));
        }
        if self.index.contains_key(&user.user_id) {
            return Err(RoomError::UserAlreadyInRoom(user.user_id));
        }
        if self.occupied.contains(&user.position) {
            return Err(RoomError::NoFreeCell);
        }

        let idx = self.users.len();
        self.occupied.insert(user.position);
        self.index.insert(user.user_id.clone(), idx);
        self.users.push(user);
        Ok(idx)
    }

    /// Swap-and-pop removal: the last user takes the freed slot.
    pub fn remove(&mut self, user_id: &UserId) -> Result<Removal, RoomError> {
        let Some(idx) = self.lookup(user_id) else {
            return Err(RoomError::UserNotFound {
                room_id: self.room_id.clone(),
                user_id: user_id.clone(),
            });
        };

        let removed = self.users.swap_remove(idx);
        if let Some(moved) = self.users.get(idx) {
            self.index.insert(moved.user_id.clone(), idx);
        }
        self.occupied.remove(&removed.position);
        self.index.remove(user_id);

        Ok(Removal {
            remaining: self.users.len(),
            position: removed.position,
        })
    }

    /// Moves a user one cell, keeping the occupied set in step with positions.
    pub fn relocate(
        &mut self,
        user_id: &UserId,
        position: Position,
        direction: Direction,
    ) -> Result<(), RoomError> {
        let Some(idx) = self.lookup(user_id) else {
            return Err(RoomError::UserNotFound {
                room_id: self.room_id.clone(),
                user_id: user_id.clone(),
            });
        };
        let current = self.users[idx].position;
        if current != position && self.occupied.contains(&position) {
            return Err(RoomError::NoFreeCell);
        }

        self.occupied.remove(&current);
        self.occupied.insert(position);
        let user = &mut self.users[idx];
        user.position = position;
        user.direction = direction;
        Ok(())
    }

    /// Uniformly random unoccupied cell of a `grid_size` square grid.
    pub fn random_free_cell<R: Rng + ?Sized>(&self, grid_size: i32, rng: &mut R) -> Option<Position> {
        let free: Vec<Position> = (0..grid_size)
            .flat_map(|row| (0..grid_size).map(move |col| Position::new(row, col)))
            .filter(|cell| !self.occupied.contains(cell))
            .collect();
        free.choose(rng).copied()
    }

    #[cfg(test)]
    pub fn assert_consistent(&self) {
        assert_eq!(self.users.len(), self.index.len());
        assert_eq!(self.users.len(), self.occupied.len());
        for (idx, user) in self.users.iter().enumerate() {
            assert_eq!(self.index.get(&user.user_id), Some(&idx));
            assert!(self.occupied.contains(&user.position));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user(id: &str, row: i32, col: i32) -> User {
        User {
            user_id: UserId::new(id),
            display_name: id.to_uppercase(),
            room_id: RoomId::new("room"),
            position: Position::new(row, col),
            direction: Direction::default(),
        }
    }

    fn make_index(limit: usize, count: usize) -> UserIndex {
        let mut index = UserIndex::new(RoomId::new("room"), limit);
        for n in 0..count {
            index
                .join(make_user(&format!("u{n}"), 0, n as i32))
                .expect("join should succeed");
        }
        index
    }

    #[test]
    fn join_assigns_sequential_slots() {
        let mut index = UserIndex::new(RoomId::new("room"), 4);
        assert_eq!(index.join(make_user("a", 0, 0)), Ok(0));
        assert_eq!(index.join(make_user("b", 0, 1)), Ok(1));
        assert_eq!(index.lookup(&UserId::new("a")), Some(0));
        assert_eq!(index.lookup(&UserId::new("missing")), None);
        index.assert_consistent();
    }

    #[test]
    fn remove_middle_user_swaps_last_into_slot() {
        let mut index = make_index(10, 4);
        let removal = index.remove(&UserId::new("u1")).expect("user should exist");
        assert_eq!(removal.remaining, 3);
        assert_eq!(removal.position, Position::new(0, 1));
        assert_eq!(index.lookup(&UserId::new("u3")), Some(1));
        assert_eq!(index.lookup(&UserId::new("u1")), None);
        assert!(!index.occupied().contains(&Position::new(0, 1)));
        index.assert_consistent();
    }

    #[test]
    fn remove_last_slot_and_drain_to_empty() {
        let mut index = make_index(10, 2);
        let removal = index.remove(&UserId::new("u1")).expect("user should exist");
        assert!(!removal.is_empty());
        index.assert_consistent();
        let removal = index.remove(&UserId::new("u0")).expect("user should exist");
        assert!(removal.is_empty());
        assert!(index.is_empty());
        index.assert_consistent();
    }

    #[test]
    fn remove_unknown_user_is_reported() {
        let mut index = make_index(10, 2);
        let result = index.remove(&UserId::new("ghost"));
        assert!(matches!(result, Err(RoomError::UserNotFound { .. })));
        assert_eq!(index.len(), 2);
        index.assert_consistent();
    }

    #[test]
    fn full_index_rejects_join_without_changes() {
        let mut index = make_index(3, 3);
        assert!(index.is_full());
        let result = index.join(make_user("late", 5, 5));
        assert_eq!(result, Err(RoomError::RoomFull(RoomId::new("room"))));
        assert_eq!(index.len(), 3);
        assert!(!index.occupied().contains(&Position::new(5, 5)));
        index.assert_consistent();
    }

    #[test]
    fn duplicate_id_and_taken_cell_are_rejected() {
        let mut index = make_index(10, 2);
        assert_eq!(
            index.join(make_user("u0", 4, 4)),
            Err(RoomError::UserAlreadyInRoom(UserId::new("u0")))
        );
        assert_eq!(index.join(make_user("new", 0, 0)), Err(RoomError::NoFreeCell));
        index.assert_consistent();
    }

    #[test]
    fn relocate_moves_occupied_cell() {
        let mut index = make_index(10, 2);
        index
            .relocate(&UserId::new("u0"), Position::new(1, 0), Direction::Down)
            .expect("cell should be free");
        let user = index.get(&UserId::new("u0")).expect("user should exist");
        assert_eq!(user.position, Position::new(1, 0));
        assert_eq!(user.direction, Direction::Down);
        assert!(!index.occupied().contains(&Position::new(0, 0)));
        assert_eq!(
            index.relocate(&UserId::new("u0"), Position::new(0, 1), Direction::Up),
            Err(RoomError::NoFreeCell)
        );
        index.assert_consistent();
    }

    #[test]
    fn random_free_cell_skips_occupied() {
        let mut index = make_index(10, 2);
        index.join(make_user("c", 1, 0)).expect("join should succeed");
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let cell = index.random_free_cell(2, &mut rng).expect("one cell is free");
            assert_eq!(cell, Position::new(1, 1));
        }
    }
}
