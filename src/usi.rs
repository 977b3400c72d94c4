use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{debug, warn};

use crate::board::{Board, Color};
use crate::deepening::SearchResult;
use crate::difficulty::{Difficulty, DifficultyProfile};
use crate::error::SearchError;
use crate::evaluation::MATE_SCORE;
use crate::movegen::MoveGenerator;
use crate::search::{SearchEngine, DEFAULT_TABLE_SIZE};

const ENGINE_NAME: &str = "Shogi Salmon";
const ENGINE_AUTHOR: &str = "Shogi Salmon developers";
const MAX_TABLE_SIZE: usize = 100_000_000;

/// Line-oriented USI front end. Commands are handled one at a time; `go`
/// blocks until the search has answered.
pub struct UsiHandler {
    board: Board,
    move_generator: MoveGenerator,
    engine: SearchEngine,
    difficulty: Difficulty,
}

impl Default for UsiHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl UsiHandler {
    pub fn new() -> Self {
        UsiHandler {
            board: Board::new(),
            move_generator: MoveGenerator::new(),
            engine: SearchEngine::new(),
            difficulty: Difficulty::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line.context("failed to read from stdin")?;
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => print!("{}", response),
                Err(err) => warn!("{command}: {err:#}"),
            }
            stdout.flush()?;
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Ok(String::new());
        };

        match name {
            "usi" => Ok(self.handle_usi()),
            "isready" => Ok("readyok\n".to_string()),
            "usinewgame" => Ok(self.handle_usinewgame()),
            "setoption" => self.handle_setoption(args),
            "position" => self.handle_position(args),
            "go" => self.handle_go(args),
            "d" => Ok(format!("{}\nsfen {}\n", self.board, self.board.to_sfen())),
            "stop" | "ponderhit" | "gameover" | "quit" => Ok(String::new()),
            _ => {
                debug!("ignoring unknown command `{command}`");
                Ok(String::new())
            }
        }
    }

    fn handle_usi(&self) -> String {
        let levels: Vec<String> = Difficulty::ALL
            .iter()
            .map(|level| format!("var {level}"))
            .collect();
        format!(
            "id name {ENGINE_NAME}\n\
             id author {ENGINE_AUTHOR}\n\
             option name Difficulty type combo default {} {}\n\
             option name TableSize type spin default {DEFAULT_TABLE_SIZE} min 0 max {MAX_TABLE_SIZE}\n\
             usiok\n",
            Difficulty::default(),
            levels.join(" ")
        )
    }

    fn handle_usinewgame(&mut self) -> String {
        self.board = Board::new();
        self.engine.new_game();
        String::new()
    }

    fn handle_setoption(&mut self, parts: &[&str]) -> Result<String> {
        let value_at = parts.iter().position(|&p| p == "value");
        let name = match (parts.first(), value_at) {
            (Some(&"name"), Some(at)) => parts[1..at].join(" "),
            (Some(&"name"), None) => parts[1..].join(" "),
            _ => bail!("expected `setoption name <id> [value <x>]`"),
        };
        let value = value_at.map(|at| parts[at + 1..].join(" ")).unwrap_or_default();

        match name.as_str() {
            "Difficulty" => {
                self.difficulty = value.parse()?;
                debug!("difficulty set to {}", self.difficulty);
            }
            "TableSize" => {
                let entries: usize = value
                    .parse()
                    .with_context(|| format!("invalid table size `{value}`"))?;
                self.engine.set_table_capacity(entries.min(MAX_TABLE_SIZE));
            }
            _ => warn!("unknown option `{name}`"),
        }
        Ok(String::new())
    }

    /// `position startpos [moves ...]` or `position sfen <board> <side> <hands> <ply> [moves ...]`.
    /// The current position is only replaced once every move has been applied.
    fn handle_position(&mut self, parts: &[&str]) -> Result<String> {
        let moves_at = parts.iter().position(|&p| p == "moves");
        let (setup, moves) = match moves_at {
            Some(at) => (&parts[..at], &parts[at + 1..]),
            None => (parts, &[][..]),
        };

        let mut board = match setup.split_first() {
            Some((&"startpos", _)) => Board::new(),
            Some((&"sfen", sfen)) => Board::from_sfen(&sfen.join(" "))?,
            _ => bail!("expected `startpos` or `sfen`"),
        };

        for text in moves {
            let mv = self.move_generator.parse_usi(&board, text)?;
            board.make_move(mv);
        }

        self.board = board;
        Ok(String::new())
    }

    fn handle_go(&mut self, parts: &[&str]) -> Result<String> {
        let number = |key: &str| -> Option<u64> {
            let at = parts.iter().position(|&p| p == key)?;
            parts.get(at + 1)?.parse().ok()
        };

        let mut profile = self.difficulty.profile();

        if let Some(depth) = number("depth") {
            let depth =
                u32::try_from(depth).with_context(|| format!("depth {depth} is too large"))?;
            profile = profile.with_max_depth(depth)?;
        }

        let remaining = match self.board.side_to_move() {
            Color::Black => number("btime"),
            Color::White => number("wtime"),
        };
        let increment = match self.board.side_to_move() {
            Color::Black => number("binc"),
            Color::White => number("winc"),
        };
        let clock = match (number("movetime"), remaining, number("byoyomi"), increment) {
            (Some(movetime), ..) => Some(movetime),
            (None, None, None, None) => None,
            (None, remaining, byoyomi, increment) => Some(
                (remaining.unwrap_or(0) / 20)
                    .saturating_add(byoyomi.unwrap_or(0))
                    .saturating_add(increment.unwrap_or(0)),
            ),
        };
        match clock.map(Duration::from_millis) {
            Some(budget) if !budget.is_zero() => profile = profile.with_time_budget(budget)?,
            Some(_) => warn!("no time on the clock, keeping {:?}", profile.time_budget()),
            None => {}
        }

        Ok(self.search(&profile))
    }

    fn search(&mut self, profile: &DifficultyProfile) -> String {
        match self.engine.find_best_move(&mut self.board, profile) {
            Ok(result) => format!(
                "info depth {} score {} nodes {} time {}\nbestmove {}\n",
                result.depth_reached,
                format_score(&result),
                result.nodes_visited,
                result.elapsed.as_millis(),
                result.best_move
            ),
            Err(SearchError::NoLegalMoves) => "bestmove resign\n".to_string(),
        }
    }
}

/// `cp <n>` for ordinary scores, `mate <plies>` (negative when being mated) otherwise.
fn format_score(result: &SearchResult) -> String {
    if !result.is_mate() {
        return format!("cp {}", result.score);
    }
    let depth_left = (result.score.abs() - MATE_SCORE) as u32;
    let plies = result.depth_reached.saturating_sub(depth_left).max(1);
    if result.score > 0 {
        format!("mate {plies}")
    } else {
        format!("mate -{plies}")
    }
}
