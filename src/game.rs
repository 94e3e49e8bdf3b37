//! Game flow as a state machine value: start screen, level generation, play.
//!
//! `transition` is a pure function of the current state and one event. It returns the next state
//! and any follow-up events, which `GameMachine` queues and feeds back in order.

use log::{info, trace};
use rand::Rng;
use std::collections::VecDeque;
use std::mem;

use crate::cells::Direction;
use crate::coordinates::GridCoordinate;
use crate::errors::*;
use crate::generators::Algorithm;
use crate::grid::Grid;
use crate::levels::{random_level_plan, LevelPlan, LevelSettings};

/// A level being played: the carved maze and where the player stands in it.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaySession {
    pub grid: Grid,
    pub position: GridCoordinate,
    pub algorithm: Algorithm,
}

impl PlaySession {
    pub fn at_exit(&self) -> bool {
        self.position == self.grid.exit()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameState {
    Start,
    /// A level has been planned and waits for its maze to be generated.
    PickGenerator(LevelPlan),
    Play(PlaySession),
}

impl GameState {
    pub fn name(&self) -> &'static str {
        match *self {
            GameState::Start => "start",
            GameState::PickGenerator(_) => "pick-generator",
            GameState::Play(_) => "play",
        }
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GameEvent {
    /// Leave the start screen.
    Begin,
    /// Carve the planned level.
    Generate,
    /// Try to step the player one cell.
    Move(Direction),
}

/// Next state for `event` arriving in `state`, plus the events it triggers.
///
/// Events that mean nothing in the current state leave it unchanged. Reaching the exit of a level
/// plans the next one.
pub fn transition<R: Rng + ?Sized>(state: GameState,
                                   event: GameEvent,
                                   settings: &LevelSettings,
                                   rng: &mut R)
                                   -> Result<(GameState, Vec<GameEvent>)> {
    match (state, event) {
        (GameState::Start, GameEvent::Begin) => plan_level(settings, rng),

        (GameState::PickGenerator(plan), GameEvent::Generate) => {
            let grid = plan.generate(rng)?;
            info!("level ready: {}x{} {}, entrance {}, exit {}",
                  grid.width(),
                  grid.height(),
                  plan.algorithm,
                  grid.entrance(),
                  grid.exit());
            let session = PlaySession {
                position: grid.entrance(),
                grid: grid,
                algorithm: plan.algorithm,
            };
            Ok((GameState::Play(session), vec![]))
        }

        (GameState::Play(mut session), GameEvent::Move(direction)) => {
            if let Some(next) = session.grid.can_move(session.position, direction)? {
                session.position = next;
            }
            if session.at_exit() {
                info!("exit {} reached", session.position);
                plan_level(settings, rng)
            } else {
                Ok((GameState::Play(session), vec![]))
            }
        }

        (state, event) => {
            trace!("ignoring {:?} in state {}", event, state.name());
            Ok((state, vec![]))
        }
    }
}

fn plan_level<R: Rng + ?Sized>(settings: &LevelSettings,
                               rng: &mut R)
                               -> Result<(GameState, Vec<GameEvent>)> {
    let plan = random_level_plan(settings, rng)?;
    info!("planned {}x{} level using {}", plan.width.0, plan.height.0, plan.algorithm);
    Ok((GameState::PickGenerator(plan), vec![GameEvent::Generate]))
}

/// Owns the current state and the queue of events still to be handled.
#[derive(Clone, Debug)]
pub struct GameMachine {
    current: GameState,
    events: VecDeque<GameEvent>,
    settings: LevelSettings,
    levels_completed: usize,
}

impl GameMachine {
    pub fn new(settings: LevelSettings) -> Result<GameMachine> {
        settings.validate()?;
        Ok(GameMachine {
            current: GameState::Start,
            events: VecDeque::new(),
            settings: settings,
            levels_completed: 0,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.current
    }

    pub fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    /// How many times the player has reached an exit.
    pub fn levels_completed(&self) -> usize {
        self.levels_completed
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    /// Handle the oldest queued event. Returns false when the queue was empty.
    ///
    /// Follow-up events go to the back of the queue. If the transition fails the machine is left
    /// on the start state with an empty queue.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<bool> {
        let event = match self.events.pop_front() {
            Some(event) => event,
            None => return Ok(false),
        };

        let previous = mem::replace(&mut self.current, GameState::Start);
        let was_playing = match previous {
            GameState::Play(_) => true,
            _ => false,
        };
        let (next, follow_ups) = match transition(previous, event, &self.settings, rng) {
            Ok(result) => result,
            Err(e) => {
                self.events.clear();
                return Err(e);
            }
        };

        if let GameState::PickGenerator(_) = next {
            if was_playing {
                self.levels_completed += 1;
            }
        }
        trace!("{} -> {}", event_label(event), next.name());
        self.current = next;
        self.events.extend(follow_ups);
        Ok(true)
    }

    /// Handle events until the queue is empty, returning how many were handled.
    pub fn run_pending<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize> {
        let mut handled = 0;
        while self.step(rng)? {
            handled += 1;
        }
        Ok(handled)
    }
}

fn event_label(event: GameEvent) -> String {
    match event {
        GameEvent::Move(direction) => format!("move {:?}", direction),
        other => format!("{:?}", other).to_lowercase(),
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::analysis::is_perfect;
    use crate::units::{Height, Width};
    use crate::utils::seeded_rng;

    fn gc(x: u32, y: u32) -> GridCoordinate {
        GridCoordinate::new(x, y)
    }

    // Every level is a 5x1 corridor, so whichever algorithm is picked the path is known.
    fn corridor_settings() -> LevelSettings {
        LevelSettings {
            min_width: 5,
            max_width: 6,
            min_height: 1,
            max_height: 2,
        }
    }

    fn play_session(state: &GameState) -> &PlaySession {
        match *state {
            GameState::Play(ref session) => session,
            ref other => panic!("expected play state, got {}", other.name()),
        }
    }

    // Walk the corridor to its exit. Standing on the exit already, bump into a wall instead.
    fn walk_to_exit(machine: &mut GameMachine, rng: &mut impl Rng) {
        let session = play_session(machine.state()).clone();
        let (from, to) = (session.position.x, session.grid.exit().x);
        if from == to {
            machine.push(GameEvent::Move(Direction::Up));
        }
        let direction = if to > from { Direction::Right } else { Direction::Left };
        for _ in 0..(i64::from(to) - i64::from(from)).abs() {
            machine.push(GameEvent::Move(direction));
        }
        machine.run_pending(rng).unwrap();
    }

    fn corridor_plan() -> LevelPlan {
        LevelPlan {
            width: Width(3),
            height: Height(1),
            entrance: gc(0, 0),
            exit: gc(2, 0),
            entrance_side: Some(Direction::Left),
            exit_side: Some(Direction::Right),
            algorithm: Algorithm::DepthFirst,
        }
    }

    fn corridor_session(rng: &mut impl Rng) -> GameState {
        let (state, _) = transition(GameState::PickGenerator(corridor_plan()),
                                    GameEvent::Generate,
                                    &corridor_settings(),
                                    rng)
            .unwrap();
        state
    }

    #[test]
    fn begin_plans_and_generates_a_level() {
        let mut rng = seeded_rng(3);
        let mut machine = GameMachine::new(LevelSettings::default()).unwrap();
        assert_eq!(*machine.state(), GameState::Start);

        machine.push(GameEvent::Begin);
        assert!(machine.step(&mut rng).unwrap());
        match *machine.state() {
            GameState::PickGenerator(ref plan) => {
                assert!(plan.width.0 >= 10 && plan.width.0 < 30);
                assert!(plan.height.0 >= 10 && plan.height.0 < 30);
            }
            ref other => panic!("expected pick-generator state, got {}", other.name()),
        }
        assert_eq!(machine.pending(), 1);

        assert_eq!(machine.run_pending(&mut rng).unwrap(), 1);
        let session = play_session(machine.state());
        assert_eq!(session.position, session.grid.entrance());
        assert!(is_perfect(&session.grid));
        assert!(!machine.step(&mut rng).unwrap());
    }

    #[test]
    fn pick_generator_transition_is_pure() {
        let mut rng = seeded_rng(8);
        let plan = LevelPlan {
            width: Width(3),
            height: Height(2),
            entrance: gc(0, 1),
            exit: gc(2, 0),
            entrance_side: Some(Direction::Left),
            exit_side: Some(Direction::Right),
            algorithm: Algorithm::DepthFirst,
        };
        let (next, follow_ups) = transition(GameState::PickGenerator(plan),
                                            GameEvent::Generate,
                                            &LevelSettings::default(),
                                            &mut rng)
            .unwrap();
        assert!(follow_ups.is_empty());
        let session = play_session(&next);
        assert_eq!(session.position, gc(0, 1));
        assert_eq!(session.algorithm, Algorithm::DepthFirst);
        assert_eq!(session.grid.exit(), gc(2, 0));
    }

    #[test]
    fn unrelated_events_leave_the_state_alone() {
        let mut rng = seeded_rng(4);
        let settings = corridor_settings();

        let (state, follow_ups) =
            transition(GameState::Start, GameEvent::Move(Direction::Up), &settings, &mut rng).unwrap();
        assert_eq!(state, GameState::Start);
        assert!(follow_ups.is_empty());

        let (state, _) = transition(GameState::Start, GameEvent::Generate, &settings, &mut rng).unwrap();
        assert_eq!(state, GameState::Start);

        let mut machine = GameMachine::new(settings).unwrap();
        machine.push(GameEvent::Begin);
        machine.run_pending(&mut rng).unwrap();
        let before = machine.state().clone();
        machine.push(GameEvent::Begin);
        machine.push(GameEvent::Generate);
        assert_eq!(machine.run_pending(&mut rng).unwrap(), 2);
        assert_eq!(*machine.state(), before);
    }

    #[test]
    fn walls_and_edges_block_movement() {
        let mut rng = seeded_rng(12);
        let settings = corridor_settings();
        let mut state = corridor_session(&mut rng);

        // No passages up or down in a single row, and the open entrance side leads off the grid.
        for &direction in &[Direction::Up, Direction::Down, Direction::Left] {
            let (next, follow_ups) =
                transition(state, GameEvent::Move(direction), &settings, &mut rng).unwrap();
            assert!(follow_ups.is_empty());
            assert_eq!(play_session(&next).position, gc(0, 0));
            state = next;
        }
    }

    #[test]
    fn moving_to_the_exit_plans_the_next_level() {
        let mut rng = seeded_rng(12);
        let settings = corridor_settings();
        let state = corridor_session(&mut rng);

        let (state, follow_ups) =
            transition(state, GameEvent::Move(Direction::Right), &settings, &mut rng).unwrap();
        assert!(follow_ups.is_empty());
        assert_eq!(play_session(&state).position, gc(1, 0));

        let (state, follow_ups) =
            transition(state, GameEvent::Move(Direction::Right), &settings, &mut rng).unwrap();
        assert_eq!(follow_ups, vec![GameEvent::Generate]);
        match state {
            GameState::PickGenerator(plan) => {
                assert_eq!(plan.width, Width(5));
                assert_eq!(plan.height, Height(1));
            }
            other => panic!("expected pick-generator state, got {}", other.name()),
        }
    }

    #[test]
    fn reaching_the_exit_starts_a_new_level() {
        let mut rng = seeded_rng(21);
        let mut machine = GameMachine::new(corridor_settings()).unwrap();
        machine.push(GameEvent::Begin);
        machine.run_pending(&mut rng).unwrap();
        assert_eq!(machine.levels_completed(), 0);

        for level in 1..4 {
            walk_to_exit(&mut machine, &mut rng);
            // The exit move queued Generate, which has already produced the next level.
            assert_eq!(machine.levels_completed(), level);
            assert_eq!(machine.pending(), 0);
            let session = play_session(machine.state());
            assert_eq!(session.position, session.grid.entrance());
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = LevelSettings { min_height: 0, ..corridor_settings() };
        assert!(GameMachine::new(settings).is_err());
    }

    #[test]
    fn event_labels() {
        assert_eq!(event_label(GameEvent::Begin), "begin");
        assert_eq!(event_label(GameEvent::Move(Direction::Left)), "move Left");
    }
}
