//! Alignment of two sequences into an edit script.

use serde::Serialize;
use std::fmt;

/// Tally of leaf comparisons below a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub num_same: usize,
    pub num_diff: usize,
}

impl DiffResult {
    pub fn equal(&self) -> bool {
        self.num_diff == 0
    }

    /// Close enough that a modification reads better than a removal plus an
    /// insertion. Any equal result is similar.
    pub fn similar(&self) -> bool {
        self.num_same + 1 >= self.num_diff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EditType {
    /// Elements match
    Identity,
    /// Element exists only in x
    UniqueX,
    /// Element exists only in y
    UniqueY,
    /// Elements are paired but differ
    Modified,
}

impl EditType {
    fn symbol(self) -> char {
        match self {
            EditType::Identity => '.',
            EditType::UniqueX => 'X',
            EditType::UniqueY => 'Y',
            EditType::Modified => 'M',
        }
    }
}

/// Sequence of edits transforming x into y.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditScript(Vec<EditType>);

impl EditScript {
    /// Number of non-identity edits.
    pub fn dist(&self) -> usize {
        self.0.iter().filter(|e| **e != EditType::Identity).count()
    }

    /// Length of x implied by the script.
    pub fn len_x(&self) -> usize {
        self.0.iter().filter(|e| **e != EditType::UniqueY).count()
    }

    /// Length of y implied by the script.
    pub fn len_y(&self) -> usize {
        self.0.iter().filter(|e| **e != EditType::UniqueX).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn edits(&self) -> &[EditType] {
        &self.0
    }
}

impl IntoIterator for EditScript {
    type Item = EditType;
    type IntoIter = std::vec::IntoIter<EditType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for EditScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self.0.iter().map(|e| e.symbol()).collect();
        f.write_str(&s)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pairing {
    Equal,
    Similar,
    Forbidden,
}

/// Largest middle section, in element pairs, aligned with the full table.
const MAX_TABLE_CELLS: usize = 1 << 16;

/// How far the greedy walk looks ahead on each side to resynchronize.
const RESYNC_WINDOW: usize = 16;

/// Align `nx` elements of x with `ny` elements of y.
///
/// `f(ix, iy)` compares element `ix` of x with element `iy` of y. Equal
/// prefixes and suffixes are consumed first. A remainder of at most
/// `MAX_TABLE_CELLS` pairs is aligned with an edit-distance table where a
/// match costs 0, a modification of similar elements costs 1, and each
/// insertion or removal costs 1; ties prefer identity, then modification,
/// then removal. Larger remainders are walked greedily with a bounded
/// look-ahead, which keeps memory and the number of calls to `f` linear.
///
/// # Errors
///
/// Returns the first error produced by `f`.
pub fn difference<E, F>(nx: usize, ny: usize, mut f: F) -> Result<EditScript, E>
where
    F: FnMut(usize, usize) -> Result<DiffResult, E>,
{
    let mut prefix = 0;
    while prefix < nx && prefix < ny && f(prefix, prefix)?.equal() {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < nx - prefix
        && suffix < ny - prefix
        && f(nx - 1 - suffix, ny - 1 - suffix)?.equal()
    {
        suffix += 1;
    }

    let mx = nx - prefix - suffix;
    let my = ny - prefix - suffix;
    let mut edits = vec![EditType::Identity; prefix];
    edits.extend(align_middle(mx, my, |ix, iy| f(prefix + ix, prefix + iy))?);
    edits.extend(std::iter::repeat(EditType::Identity).take(suffix));
    Ok(EditScript(edits))
}

fn align_middle<E, F>(mx: usize, my: usize, mut f: F) -> Result<Vec<EditType>, E>
where
    F: FnMut(usize, usize) -> Result<DiffResult, E>,
{
    if mx == 0 || my == 0 {
        let mut edits = vec![EditType::UniqueX; mx];
        edits.extend(std::iter::repeat(EditType::UniqueY).take(my));
        return Ok(edits);
    }
    if mx.saturating_mul(my) > MAX_TABLE_CELLS {
        return align_greedy(mx, my, f);
    }

    let width = my + 1;
    let mut pairing = vec![Pairing::Forbidden; mx * my];
    for ix in 0..mx {
        for iy in 0..my {
            let r = f(ix, iy)?;
            pairing[ix * my + iy] = if r.equal() {
                Pairing::Equal
            } else if r.similar() {
                Pairing::Similar
            } else {
                Pairing::Forbidden
            };
        }
    }

    // cost[a][b]: cheapest alignment of x[a..] with y[b..]
    let mut cost = vec![0u32; (mx + 1) * width];
    for a in (0..=mx).rev() {
        for b in (0..=my).rev() {
            let at = a * width + b;
            cost[at] = if a == mx {
                (my - b) as u32
            } else if b == my {
                (mx - a) as u32
            } else {
                let mut best = 1 + cost[(a + 1) * width + b].min(cost[a * width + b + 1]);
                match pairing[a * my + b] {
                    Pairing::Equal => best = best.min(cost[(a + 1) * width + b + 1]),
                    Pairing::Similar => best = best.min(1 + cost[(a + 1) * width + b + 1]),
                    Pairing::Forbidden => {}
                }
                best
            };
        }
    }

    let mut edits = Vec::with_capacity(mx + my);
    let (mut a, mut b) = (0, 0);
    while a < mx || b < my {
        let here = cost[a * width + b];
        let diagonal = if a < mx && b < my {
            Some((pairing[a * my + b], cost[(a + 1) * width + b + 1]))
        } else {
            None
        };
        match diagonal {
            Some((Pairing::Equal, next)) if next == here => {
                edits.push(EditType::Identity);
                a += 1;
                b += 1;
            }
            Some((Pairing::Similar, next)) if next + 1 == here => {
                edits.push(EditType::Modified);
                a += 1;
                b += 1;
            }
            _ if a < mx && (b == my || cost[(a + 1) * width + b] + 1 == here) => {
                edits.push(EditType::UniqueX);
                a += 1;
            }
            _ => {
                edits.push(EditType::UniqueY);
                b += 1;
            }
        }
    }
    Ok(edits)
}

fn align_greedy<E, F>(mx: usize, my: usize, mut f: F) -> Result<Vec<EditType>, E>
where
    F: FnMut(usize, usize) -> Result<DiffResult, E>,
{
    let mut edits = Vec::with_capacity(mx + my);
    let (mut a, mut b) = (0, 0);
    'walk: while a < mx && b < my {
        let here = f(a, b)?;
        if here.equal() {
            edits.push(EditType::Identity);
            a += 1;
            b += 1;
            continue;
        }
        for d in 1..=RESYNC_WINDOW {
            if a + d < mx && f(a + d, b)?.equal() {
                edits.extend(std::iter::repeat(EditType::UniqueX).take(d));
                a += d;
                continue 'walk;
            }
            if b + d < my && f(a, b + d)?.equal() {
                edits.extend(std::iter::repeat(EditType::UniqueY).take(d));
                b += d;
                continue 'walk;
            }
        }
        if here.similar() {
            edits.push(EditType::Modified);
        } else {
            edits.extend([EditType::UniqueX, EditType::UniqueY]);
        }
        a += 1;
        b += 1;
    }
    edits.extend(std::iter::repeat(EditType::UniqueX).take(mx - a));
    edits.extend(std::iter::repeat(EditType::UniqueY).take(my - b));
    Ok(edits)
}
