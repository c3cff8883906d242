// Per-participant feature extraction from one match row.
//
// Raw fields are resolved once per table schema: each field either maps to a
// column index or, when the column is absent, to its declared default. A
// column that exists but holds an empty or non-numeric cell yields NaN, which
// marks the resulting row incomplete.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataset::{MatchRecord, MatchTable, SCORE};
use crate::score::parse_games;

// ---------------------------------------------------------------------------
// Roles and raw fields
// ---------------------------------------------------------------------------

/// Which side of a match record a participant played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Winner,
    Loser,
}

impl Role {
    pub fn opponent(self) -> Role {
        match self {
            Role::Winner => Role::Loser,
            Role::Loser => Role::Winner,
        }
    }

    pub fn is_winner(self) -> bool {
        self == Role::Winner
    }

    /// Prefix of the identity columns (`winner_name`, `loser_rank`, ...).
    fn player_prefix(self) -> &'static str {
        match self {
            Role::Winner => "winner_",
            Role::Loser => "loser_",
        }
    }

    /// Prefix of the serve-stat columns (`w_svpt`, `l_ace`, ...).
    fn stat_prefix(self) -> &'static str {
        match self {
            Role::Winner => "w_",
            Role::Loser => "l_",
        }
    }
}

/// A raw per-side input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawField {
    Name,
    Seed,
    Rank,
    ServePoints,
    FirstIn,
    FirstWon,
    SecondWon,
    BreakPointsFaced,
    BreakPointsSaved,
    Aces,
    DoubleFaults,
}

impl RawField {
    pub const ALL: [RawField; 11] = [
        RawField::Name,
        RawField::Seed,
        RawField::Rank,
        RawField::ServePoints,
        RawField::FirstIn,
        RawField::FirstWon,
        RawField::SecondWon,
        RawField::BreakPointsFaced,
        RawField::BreakPointsSaved,
        RawField::Aces,
        RawField::DoubleFaults,
    ];

    /// Column name of this field for the given side.
    pub fn column(self, role: Role) -> String {
        let (prefix, suffix) = match self {
            RawField::Name => (role.player_prefix(), "name"),
            RawField::Seed => (role.player_prefix(), "seed"),
            RawField::Rank => (role.player_prefix(), "rank"),
            RawField::ServePoints => (role.stat_prefix(), "svpt"),
            RawField::FirstIn => (role.stat_prefix(), "1stIn"),
            RawField::FirstWon => (role.stat_prefix(), "1stWon"),
            RawField::SecondWon => (role.stat_prefix(), "2ndWon"),
            RawField::BreakPointsFaced => (role.stat_prefix(), "bpFaced"),
            RawField::BreakPointsSaved => (role.stat_prefix(), "bpSaved"),
            RawField::Aces => (role.stat_prefix(), "ace"),
            RawField::DoubleFaults => (role.stat_prefix(), "df"),
        };
        format!("{prefix}{suffix}")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Values substituted for raw fields whose column is absent from the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefaults {
    pub seed: f64,
    pub rank: f64,
    pub svpt: f64,
    pub first_in: f64,
    pub first_won: f64,
    pub second_won: f64,
    pub bp_faced: f64,
    pub bp_saved: f64,
    pub ace: f64,
    pub df: f64,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            seed: 999.0,
            rank: 200.0,
            svpt: 1.0,
            first_in: 0.0,
            first_won: 0.0,
            second_won: 0.0,
            bp_faced: 0.0,
            bp_saved: 0.0,
            ace: 0.0,
            df: 0.0,
        }
    }
}

impl FieldDefaults {
    /// Default for `field`; `None` for fields without one (the player name).
    pub fn get(&self, field: RawField) -> Option<f64> {
        match field {
            RawField::Name => None,
            RawField::Seed => Some(self.seed),
            RawField::Rank => Some(self.rank),
            RawField::ServePoints => Some(self.svpt),
            RawField::FirstIn => Some(self.first_in),
            RawField::FirstWon => Some(self.first_won),
            RawField::SecondWon => Some(self.second_won),
            RawField::BreakPointsFaced => Some(self.bp_faced),
            RawField::BreakPointsSaved => Some(self.bp_saved),
            RawField::Aces => Some(self.ace),
            RawField::DoubleFaults => Some(self.df),
        }
    }
}

// ---------------------------------------------------------------------------
// Feature vector
// ---------------------------------------------------------------------------

/// Names of the model input columns, in matrix order.
pub const FEATURE_COLUMNS: [&str; 18] = [
    "seed",
    "opponent_rank",
    "relative_rank_diff",
    "games_won",
    "games_lost",
    "games_diff",
    "aces",
    "double_faults",
    "1st_serve_pct",
    "1st_serve_win_pct",
    "2nd_serve_win_pct",
    "bp_saved_rate",
    "df_rate",
    "ace_rate",
    "pressure_score",
    "domination_score",
    "serve_dominance",
    "mental_toughness",
];

pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// One participant's performance in one match.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub player_name: Option<String>,
    pub role: Role,
    pub seed: f64,
    pub opponent_rank: f64,
    pub relative_rank_diff: f64,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_diff: i64,
    pub aces: f64,
    pub double_faults: f64,
    pub first_serve_pct: f64,
    pub first_serve_win_pct: f64,
    pub second_serve_win_pct: f64,
    pub bp_saved_rate: f64,
    pub df_rate: f64,
    pub ace_rate: f64,
    pub pressure_score: f64,
    pub domination_score: f64,
}

impl FeatureVector {
    /// Numeric fields that may carry a missing (NaN) value.
    fn numeric_fields(&self) -> [f64; 14] {
        [
            self.seed,
            self.opponent_rank,
            self.relative_rank_diff,
            self.aces,
            self.double_faults,
            self.first_serve_pct,
            self.first_serve_win_pct,
            self.second_serve_win_pct,
            self.bp_saved_rate,
            self.df_rate,
            self.ace_rate,
            self.pressure_score,
            self.domination_score,
            self.games_diff as f64,
        ]
    }

    /// True when the name is present and every numeric field is finite.
    pub fn is_complete(&self) -> bool {
        self.player_name.is_some() && self.numeric_fields().iter().all(|v| v.is_finite())
    }
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lookup {
    Column(usize),
    Default(f64),
    Absent,
}

/// Feature extractor bound to one table schema.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    lookups: HashMap<(Role, RawField), Lookup>,
    score: Option<usize>,
}

impl FeatureExtractor {
    /// Resolve every raw field of both sides against `table`'s header.
    pub fn new(table: &MatchTable, defaults: &FieldDefaults) -> Self {
        let mut lookups = HashMap::new();
        for role in [Role::Winner, Role::Loser] {
            for field in RawField::ALL {
                let lookup = match table.column_index(&field.column(role)) {
                    Some(idx) => Lookup::Column(idx),
                    None => defaults.get(field).map_or(Lookup::Absent, Lookup::Default),
                };
                lookups.insert((role, field), lookup);
            }
        }
        Self {
            lookups,
            score: table.column_index(SCORE),
        }
    }

    fn lookup(&self, role: Role, field: RawField) -> Lookup {
        self.lookups
            .get(&(role, field))
            .copied()
            .unwrap_or(Lookup::Absent)
    }

    /// Numeric value of a raw field: the parsed cell, the declared default
    /// for an absent column, or NaN for an empty/non-numeric cell.
    fn number(&self, record: &MatchRecord, role: Role, field: RawField) -> f64 {
        match self.lookup(role, field) {
            Lookup::Column(idx) => record
                .cell(idx)
                .and_then(|cell| cell.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN),
            Lookup::Default(value) => value,
            Lookup::Absent => f64::NAN,
        }
    }

    fn name(&self, record: &MatchRecord, role: Role) -> Option<String> {
        match self.lookup(role, RawField::Name) {
            Lookup::Column(idx) => record
                .cell(idx)
                .filter(|cell| !cell.is_empty())
                .map(str::to_string),
            Lookup::Default(_) | Lookup::Absent => None,
        }
    }

    /// Feature vector for the participant who played `role` in `record`.
    pub fn extract(&self, record: &MatchRecord, role: Role) -> FeatureVector {
        let opp = role.opponent();

        let svpt = self.number(record, role, RawField::ServePoints);
        let first_in = self.number(record, role, RawField::FirstIn);
        let first_won = self.number(record, role, RawField::FirstWon);
        let second_won = self.number(record, role, RawField::SecondWon);
        let bp_faced = self.number(record, role, RawField::BreakPointsFaced);
        let bp_saved = self.number(record, role, RawField::BreakPointsSaved);
        let aces = self.number(record, role, RawField::Aces);
        let double_faults = self.number(record, role, RawField::DoubleFaults);
        let own_rank = self.number(record, role, RawField::Rank);
        let opponent_rank = self.number(record, opp, RawField::Rank);

        let score = self
            .score
            .and_then(|idx| record.cell(idx))
            .filter(|s| !s.is_empty());
        let (games_won, games_lost) = parse_games(score, role.is_winner());
        let games_diff = i64::from(games_won) - i64::from(games_lost);

        FeatureVector {
            player_name: self.name(record, role),
            role,
            seed: self.number(record, role, RawField::Seed),
            opponent_rank,
            relative_rank_diff: own_rank - opponent_rank,
            games_won,
            games_lost,
            games_diff,
            aces,
            double_faults,
            first_serve_pct: ratio(first_in, svpt),
            first_serve_win_pct: ratio(first_won, first_in),
            second_serve_win_pct: ratio(second_won, svpt - first_in),
            bp_saved_rate: ratio(bp_saved, bp_faced),
            df_rate: ratio(double_faults, svpt),
            ace_rate: ratio(aces, svpt),
            pressure_score: bp_faced + double_faults - aces,
            domination_score: games_diff as f64 + aces - double_faults,
        }
    }
}
