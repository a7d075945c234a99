//! Problem generation for each difficulty tier
//!
//! A problem is a prompt, the answer that scores, and the candidate answers
//! that end up on fruits. Every tier produces three candidates with the
//! correct answer first; the layout step shuffles them afterwards.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::{constants::problem as limits, random::RandomSource};

/// The four problem families a session can be created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Single digit addition
    Elementary,
    /// One root of a quadratic equation
    Highschool,
    /// Indefinite integral of a monomial
    College,
    /// Programming language trivia
    Coding,
}

/// Errors raised while interpreting difficulty names
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The name does not match any known tier
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

impl Difficulty {
    /// All tiers, in increasing order of difficulty
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Elementary,
        Difficulty::Highschool,
        Difficulty::College,
        Difficulty::Coding,
    ];

    /// Name used on the wire and in listings
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Elementary => "elementary",
            Self::Highschool => "highschool",
            Self::College => "college",
            Self::Coding => "coding",
        }
    }

    /// Generates a fresh problem of this tier
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fruit_slice::problem::Difficulty;
    ///
    /// let mut rng = fastrand::Rng::with_seed(7);
    /// let problem = Difficulty::Elementary.generate(&mut rng);
    /// assert!(problem.candidates.contains(&problem.answer));
    /// ```
    pub fn generate<R: RandomSource>(self, rng: &mut R) -> Problem {
        match self {
            Self::Elementary => elementary(rng),
            Self::Highschool => highschool(rng),
            Self::College => college(rng),
            Self::Coding => coding(rng),
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str() == s)
            .ok_or_else(|| Error::UnknownDifficulty(s.to_owned()))
    }
}

/// A candidate answer: either a number or a piece of text
///
/// Numbers and text never compare equal to each other, even when the text
/// spells the number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Arithmetic result
    Numeric(f64),
    /// Symbolic expression or trivia answer
    Symbolic(String),
}

impl Serialize for Answer {
    /// Integral numbers are written without a fractional part
    #[allow(clippy::float_cmp)]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Numeric(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Numeric(n) => serializer.serialize_f64(*n),
            Self::Symbolic(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for Answer {
    fn from(value: i64) -> Self {
        Self::Numeric(value as f64)
    }
}

impl From<f64> for Answer {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Self::Symbolic(value.to_owned())
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Self::Symbolic(value)
    }
}

/// A generated problem
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Text shown to the players
    pub prompt: String,
    /// The candidate that scores
    pub answer: Answer,
    /// Every candidate, correct answer first
    pub candidates: Vec<Answer>,
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.).round() / 100.
}

fn operand<R: RandomSource>(rng: &mut R) -> i64 {
    rng.integer(limits::MIN_OPERAND..=limits::MAX_OPERAND)
}

fn elementary<R: RandomSource>(rng: &mut R) -> Problem {
    let a = operand(rng);
    let b = operand(rng);
    let sum = a + b;
    let offsets = limits::MIN_ELEMENTARY_OFFSET..=limits::MAX_ELEMENTARY_OFFSET;
    let above = sum + rng.integer(offsets.clone());
    let below = sum - rng.integer(offsets);

    Problem {
        prompt: format!("{a} + {b}"),
        answer: sum.into(),
        candidates: vec![sum.into(), above.into(), below.into()],
    }
}

/// Root taken by the `+` branch of the quadratic formula for
/// `a·x² + b·x − c = 0`, using the discriminant `b² − 4ac`
///
/// A negative discriminant yields 0: complex roots are not offered.
fn positive_root(a: i64, b: i64, c: i64) -> f64 {
    let discriminant = b * b - 4 * a * c;
    if discriminant < 0 {
        return 0.;
    }
    round_to_hundredths((-b as f64 + (discriminant as f64).sqrt()) / (2 * a) as f64)
}

fn highschool<R: RandomSource>(rng: &mut R) -> Problem {
    let a = operand(rng);
    let b = operand(rng);
    let c = operand(rng);
    let root = positive_root(a, b, c);
    let offsets = limits::MIN_HIGHSCHOOL_OFFSET..limits::MAX_HIGHSCHOOL_OFFSET;
    let above = round_to_hundredths(root + rng.real(offsets.clone()));
    let below = round_to_hundredths(root - rng.real(offsets));

    Problem {
        prompt: format!("Solve: {a}x² + {b}x - {c} = 0 (one root)"),
        answer: root.into(),
        candidates: vec![root.into(), above.into(), below.into()],
    }
}

fn college<R: RandomSource>(rng: &mut R) -> Problem {
    let a = operand(rng);
    let b = operand(rng);
    let coefficient = a as f64 / (b + 1) as f64;
    // `{:?}` keeps the trailing `.0` on whole coefficients
    let antiderivative = format!("{coefficient:?}x^{}", b + 1);

    Problem {
        prompt: format!("Integrate: ∫ {a}x^{b} dx"),
        answer: antiderivative.clone().into(),
        candidates: vec![
            antiderivative.into(),
            format!("{a}x^{b}").into(),
            format!("{a}x^{}", b + 1).into(),
        ],
    }
}

/// Trivia bank: (question, answer, candidates with the answer first)
const CODING_BANK: [(&str, &str, [&str; 3]); 10] = [
    ("What’s Python’s output? print(2 + 3)", "5", ["5", "23", "6"]),
    (
        "What’s JavaScript’s typeof null?",
        "object",
        ["object", "null", "undefined"],
    ),
    ("What’s Python’s len([1, 2, 3])?", "3", ["3", "2", "4"]),
    ("What’s JavaScript’s 2 + '2'?", "22", ["22", "4", "2"]),
    (
        "In Python, what’s type(3.14)?",
        "float",
        ["float", "int", "str"],
    ),
    (
        "What’s JavaScript’s [] instanceof Array?",
        "true",
        ["true", "false", "undefined"],
    ),
    ("In Python, what’s 5 // 2?", "2", ["2", "2.5", "3"]),
    (
        "What’s JavaScript’s '1' == 1?",
        "true",
        ["true", "false", "error"],
    ),
    ("In Python, what’s 'hello'[1]?", "e", ["e", "h", "l"]),
    (
        "What’s JavaScript’s parseInt('10px')?",
        "10",
        ["10", "10px", "NaN"],
    ),
];

fn coding<R: RandomSource>(rng: &mut R) -> Problem {
    let (prompt, answer, candidates) = CODING_BANK[rng.index(CODING_BANK.len())];

    Problem {
        prompt: prompt.to_owned(),
        answer: answer.into(),
        candidates: candidates.into_iter().map(Answer::from).collect(),
    }
}
