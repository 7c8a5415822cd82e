//! # L-System Branching
//!
//! String rewriting plus a voxel turtle.
//!
//! ## Alphabet
//!
//! | Symbol | Meaning                                   |
//! |--------|-------------------------------------------|
//! | `F`    | step forward one voxel, emit a segment    |
//! | `+`/`-`| yaw by plus/minus the yaw step            |
//! | `^`/`v`| pitch by plus/minus the pitch step        |
//! | `[`    | push the turtle frame                     |
//! | `]`    | pop the turtle frame                      |
//!
//! Any other symbol is carried through rewriting and ignored by the turtle.

use serde::{Deserialize, Serialize};

/// A single-symbol rewriting rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Symbol to replace.
    pub symbol: char,
    /// Replacement string.
    pub replacement: String,
}

/// Axiom plus parallel rewriting rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LSystem {
    /// Starting string.
    pub axiom: String,
    /// Rules, applied to every symbol in parallel.
    pub rules: Vec<Rule>,
}

impl LSystem {
    /// Creates a system with one rule.
    #[must_use]
    pub fn new(axiom: &str, symbol: char, replacement: &str) -> Self {
        Self {
            axiom: axiom.to_owned(),
            rules: vec![Rule {
                symbol,
                replacement: replacement.to_owned(),
            }],
        }
    }

    fn rewrite(&self, symbol: char) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.symbol == symbol)
            .map(|rule| rule.replacement.as_str())
    }

    /// Rewrites the axiom `iterations` times.
    #[must_use]
    pub fn expand(&self, iterations: u32) -> String {
        let mut current = self.axiom.clone();
        for _ in 0..iterations {
            let mut next = String::with_capacity(current.len() * 4);
            for symbol in current.chars() {
                match self.rewrite(symbol) {
                    Some(replacement) => next.push_str(replacement),
                    None => next.push(symbol),
                }
            }
            current = next;
        }
        current
    }
}

/// Position and heading of the turtle. Angles in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurtleFrame {
    /// Current voxel.
    pub position: [i32; 3],
    /// Heading around the vertical axis.
    pub yaw: f64,
    /// Elevation above the horizontal plane.
    pub pitch: f64,
}

impl TurtleFrame {
    /// Unit heading vector (Y up).
    #[must_use]
    pub fn heading(&self) -> [f64; 3] {
        let horizontal = self.pitch.cos();
        [
            horizontal * self.yaw.cos(),
            self.pitch.sin(),
            horizontal * self.yaw.sin(),
        ]
    }

    /// Heading rounded to a voxel offset.
    #[must_use]
    pub fn step(&self) -> [i32; 3] {
        let [dx, dy, dz] = self.heading();
        [dx.round() as i32, dy.round() as i32, dz.round() as i32]
    }
}

/// One `F` move: the voxels before and after the step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Voxel the turtle left.
    pub from: [i32; 3],
    /// Voxel the turtle arrived at.
    pub to: [i32; 3],
}

/// Turtle interpreter with an explicit frame stack.
#[derive(Clone, Debug)]
pub struct Turtle {
    frame: TurtleFrame,
    stack: Vec<TurtleFrame>,
    yaw_step: f64,
    pitch_step: f64,
}

impl Turtle {
    /// Creates a turtle. Steps are in radians.
    #[must_use]
    pub fn new(start: TurtleFrame, yaw_step: f64, pitch_step: f64) -> Self {
        Self {
            frame: start,
            stack: Vec::new(),
            yaw_step,
            pitch_step,
        }
    }

    /// Current frame.
    #[must_use]
    pub const fn frame(&self) -> &TurtleFrame {
        &self.frame
    }

    /// Applies one symbol, returning the segment for `F`. An unmatched `]`
    /// is ignored.
    pub fn apply(&mut self, symbol: char) -> Option<Segment> {
        match symbol {
            'F' => {
                let from = self.frame.position;
                let [dx, dy, dz] = self.frame.step();
                let to = [from[0] + dx, from[1] + dy, from[2] + dz];
                self.frame.position = to;
                return Some(Segment { from, to });
            }
            '+' => self.frame.yaw += self.yaw_step,
            '-' => self.frame.yaw -= self.yaw_step,
            '^' => self.frame.pitch += self.pitch_step,
            'v' => self.frame.pitch -= self.pitch_step,
            '[' => self.stack.push(self.frame),
            ']' => {
                if let Some(frame) = self.stack.pop() {
                    self.frame = frame;
                }
            }
            _ => {}
        }
        None
    }

    /// Runs a whole command string, calling `on_segment` for each `F`.
    pub fn run(&mut self, commands: &str, mut on_segment: impl FnMut(Segment)) {
        for symbol in commands.chars() {
            if let Some(segment) = self.apply(symbol) {
                on_segment(segment);
            }
        }
    }
}
