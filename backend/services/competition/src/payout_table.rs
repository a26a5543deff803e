//! Sparse rank × entrant percentage table used to split a weekly prize pool.
//!
//! The table only lists a handful of rank and entrant-count keys. Any other
//! rank or entrant count is resolved to the nearest published key at or below
//! it (see [`bucket`]), so a rank 14 with published rank keys `{10, 15, 50}` is
//! paid at the rank 10 rate.

use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

use thiserror::Error;

/// Percentages are stored as basis points: 10000 is the whole prize pool.
pub const BASIS_POINTS: i64 = 10_000;

#[derive(Error, Debug)]
pub enum PayoutTableError {
    #[error("Failed to read payout table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Payout table is empty")]
    Empty,

    #[error("Payout table line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Payout table {axis} keys must be strictly ascending")]
    UnsortedKeys { axis: &'static str },

    #[error("Payout table {axis} keys must start at 1 or above")]
    ZeroKey { axis: &'static str },

    #[error("Payout table row for rank {rank} has more cells than entrant keys")]
    RowTooLong { rank: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutTable {
    rank_keys: Vec<u32>,
    entrance_keys: Vec<u32>,
    data: BTreeMap<u32, BTreeMap<u32, u32>>,
}

impl PayoutTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PayoutTableError> {
        let path = path.as_ref();
        let source = read_to_string(path).map_err(|source| PayoutTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&source)
    }

    /// Parses the comma separated grid.
    ///
    /// The first non-blank line is a free-form header. The second holds a label
    /// followed by the ascending entrant-count keys. Every later line is a rank
    /// key followed by basis-point cells aligned with the entrant keys; a blank
    /// or non-positive cell ends that row.
    pub fn parse(source: &str) -> Result<Self, PayoutTableError> {
        let mut lines = source
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        lines.next().ok_or(PayoutTableError::Empty)?;

        let (entrance_line, entrance_row) = lines.next().ok_or(PayoutTableError::Empty)?;
        let entrance_cells: Vec<&str> = entrance_row.split(',').collect();
        let entrance_keys = positive_prefix(entrance_line, entrance_cells.get(1..).unwrap_or(&[]))?;
        if entrance_keys.is_empty() {
            return Err(malformed(entrance_line, "missing entrant keys"));
        }

        let mut rows = Vec::new();
        for (line, row) in lines {
            let cells: Vec<&str> = row.split(',').collect();
            let rank_cell = cells[0].trim();
            let rank = match rank_cell.parse::<u32>() {
                Ok(rank) if rank > 0 => rank,
                _ => {
                    return Err(malformed(
                        line,
                        format!("'{}' is not a valid rank key", rank_cell),
                    ))
                }
            };
            let values = positive_prefix(line, &cells[1..])?;
            rows.push((rank, values));
        }

        Self::from_rows(entrance_keys, rows)
    }

    /// Builds a table from the entrant keys and `(rank key, cells)` rows, where
    /// `cells[j]` is the basis points for `entrance_keys[j]`.
    pub fn from_rows(
        entrance_keys: Vec<u32>,
        rows: Vec<(u32, Vec<u32>)>,
    ) -> Result<Self, PayoutTableError> {
        if entrance_keys.is_empty() || rows.is_empty() {
            return Err(PayoutTableError::Empty);
        }
        if !strictly_ascending(&entrance_keys) {
            return Err(PayoutTableError::UnsortedKeys { axis: "entrant" });
        }

        let rank_keys: Vec<u32> = rows.iter().map(|(rank, _)| *rank).collect();
        if !strictly_ascending(&rank_keys) {
            return Err(PayoutTableError::UnsortedKeys { axis: "rank" });
        }

        // 0 is the "no bucket" sentinel of `bucket`
        if entrance_keys[0] == 0 {
            return Err(PayoutTableError::ZeroKey { axis: "entrant" });
        }
        if rank_keys[0] == 0 {
            return Err(PayoutTableError::ZeroKey { axis: "rank" });
        }

        let mut data = BTreeMap::new();
        for (rank, values) in rows {
            if values.len() > entrance_keys.len() {
                return Err(PayoutTableError::RowTooLong { rank });
            }
            let row: BTreeMap<u32, u32> = entrance_keys
                .iter()
                .copied()
                .zip(values.into_iter().take_while(|value| *value > 0))
                .collect();
            data.insert(rank, row);
        }

        Ok(Self {
            rank_keys,
            entrance_keys,
            data,
        })
    }

    pub fn rank_keys(&self) -> &[u32] {
        &self.rank_keys
    }

    pub fn entrance_keys(&self) -> &[u32] {
        &self.entrance_keys
    }

    /// Basis points of the pool awarded to `rank` when `entrants` competed.
    pub fn percentage(&self, rank: u32, entrants: u32) -> u32 {
        if rank == 0 {
            return 0;
        }
        let rank_key = bucket(rank, &self.rank_keys);
        let entrance_key = bucket(entrants, &self.entrance_keys);
        self.cell(rank_key, entrance_key)
    }

    /// One percentage per rank key, in ascending rank-key order.
    pub fn entrance_column(&self, entrants: u32) -> Vec<u32> {
        let entrance_key = bucket(entrants, &self.entrance_keys);
        self.rank_keys
            .iter()
            .map(|rank_key| self.cell(*rank_key, entrance_key))
            .collect()
    }

    /// Points paid to each rank bucket for a fixed pool and entrant count.
    pub fn display_for_ranking(&self, prize_pool: i64, entrants: u32) -> Vec<i64> {
        self.entrance_column(entrants)
            .into_iter()
            .map(|basis_points| share_of(prize_pool, basis_points))
            .collect()
    }

    /// Expands one value per rank key into one value per rank, where index `i`
    /// is rank `i + 1`. Ranks below the first key share the first bucket and the
    /// last key covers a single rank.
    pub fn expand_ranking(&self, bucketed: &[i64]) -> Vec<i64> {
        let mut expanded = Vec::new();
        for (idx, value) in bucketed.iter().enumerate() {
            let Some(&key) = self.rank_keys.get(idx) else {
                break;
            };
            let mut span = match self.rank_keys.get(idx + 1) {
                Some(&next) => next - key,
                None => 1,
            };
            if idx == 0 {
                span += key - 1;
            }
            expanded.extend(std::iter::repeat(*value).take(span as usize));
        }
        expanded
    }

    /// Per-rank payouts for `entrants` competitors sharing `prize_pool`.
    pub fn payouts(&self, prize_pool: i64, entrants: u32) -> Vec<i64> {
        self.expand_ranking(&self.display_for_ranking(prize_pool, entrants))
    }

    fn cell(&self, rank_key: u32, entrance_key: u32) -> u32 {
        self.data
            .get(&rank_key)
            .and_then(|row| row.get(&entrance_key))
            .copied()
            .unwrap_or(0)
    }
}

/// Resolves `n` to the largest key at or below it.
///
/// `0` means "no bucket" and maps to `0`. Values below the first key clamp up
/// to the first key, values at or past the last key clamp to the last key.
///
/// # Panics
/// If `keys` is empty.
pub fn bucket(n: u32, keys: &[u32]) -> u32 {
    assert!(!keys.is_empty(), "bucket lookup against an empty key sequence");

    if n == 0 {
        return 0;
    }

    let first = keys[0];
    let last = keys[keys.len() - 1];
    if n < first {
        return first;
    }
    if n >= last {
        return last;
    }

    keys.windows(2)
        .find(|pair| pair[0] <= n && n < pair[1])
        .map(|pair| pair[0])
        .unwrap_or(last)
}

/// `floor(prize_pool * basis_points / 10000)`.
pub fn share_of(prize_pool: i64, basis_points: u32) -> i64 {
    let share = (prize_pool as i128 * basis_points as i128) / BASIS_POINTS as i128;
    i64::try_from(share).unwrap_or(i64::MAX)
}

fn positive_prefix(line: usize, cells: &[&str]) -> Result<Vec<u32>, PayoutTableError> {
    let mut values = Vec::new();
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() {
            break;
        }
        let value: i64 = cell
            .parse()
            .map_err(|_| malformed(line, format!("'{}' is not an integer", cell)))?;
        if value <= 0 {
            break;
        }
        let value = u32::try_from(value)
            .map_err(|_| malformed(line, format!("{} is out of range", value)))?;
        values.push(value);
    }
    Ok(values)
}

fn strictly_ascending(keys: &[u32]) -> bool {
    keys.windows(2).all(|pair| pair[0] < pair[1])
}

fn malformed(line: usize, reason: impl Into<String>) -> PayoutTableError {
    PayoutTableError::Malformed {
        line,
        reason: reason.into(),
    }
}
