//! Single-pass constraint solver.
//!
//! A split takes one rectangle, one direction and one constraint per child,
//! and returns one rectangle per child, in order. It holds no state and
//! knows nothing about trees; nesting is done by splitting the results again.
//!
//! Rounding uses the largest-remainder method: every share is floored, then
//! the cells lost to flooring go one at a time to the participants with the
//! largest fractional parts. Equal remainders go to the leftmost participant.
//! The resolved lengths therefore never leak or overflow a cell.

use super::constraint::{Constraint, Direction, Margin};
use super::rect::Rect;

/// A reusable split description: direction, constraints, spacing and margin.
///
/// # Example
///
/// ```
/// use weft::layout::{Constraint, Layout, Rect};
///
/// let rects = Layout::horizontal([Constraint::Length(3), Constraint::Fill(1), Constraint::Fill(1)])
///     .split(Rect::new(0, 0, 10, 3));
/// let widths: Vec<u16> = rects.iter().map(|r| r.width).collect();
/// assert_eq!(widths, [3, 4, 3]);
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Layout {
    direction: Direction,
    constraints: Vec<Constraint>,
    spacing: u16,
    margin: Margin,
}

impl Layout {
    /// Create a layout along `direction`.
    pub fn new(direction: Direction, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self {
            direction,
            constraints: constraints.into_iter().collect(),
            spacing: 0,
            margin: Margin::NONE,
        }
    }

    /// Children side by side.
    pub fn horizontal(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self::new(Direction::Horizontal, constraints)
    }

    /// Children stacked top to bottom.
    pub fn vertical(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self::new(Direction::Vertical, constraints)
    }

    /// Set the gap between adjacent children (builder pattern).
    #[must_use]
    pub const fn with_spacing(mut self, spacing: u16) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the margin around the split area (builder pattern).
    #[must_use]
    pub const fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    /// The split direction.
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// The per-child constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The gap between adjacent children.
    pub const fn spacing(&self) -> u16 {
        self.spacing
    }

    /// The margin around the split area.
    pub const fn margin(&self) -> Margin {
        self.margin
    }

    /// Partition `area` among the constraints.
    pub fn split(&self, area: Rect) -> Vec<Rect> {
        split(area, self.direction, &self.constraints, self.spacing, self.margin)
    }
}

/// Partition `area` into one rectangle per constraint.
///
/// The cross axis of every result spans the full inner area. Results never
/// extend past the inner area, whatever the constraints ask for.
pub fn split(
    area: Rect,
    direction: Direction,
    constraints: &[Constraint],
    spacing: u16,
    margin: Margin,
) -> Vec<Rect> {
    if constraints.is_empty() {
        return Vec::new();
    }

    let inner = area.inner(margin);
    let (start, available) = match direction {
        Direction::Horizontal => (inner.x, inner.width),
        Direction::Vertical => (inner.y, inner.height),
    };

    let gaps = u64::from(spacing) * (constraints.len() as u64 - 1);
    let distributable = u64::from(available).saturating_sub(gaps);
    let lengths = resolve(constraints, distributable);

    let end = u64::from(start) + u64::from(available);
    let mut pos = u64::from(start);

    lengths
        .into_iter()
        .map(|length| {
            let offset = pos.min(end);
            let length = length.min(end - offset);
            pos = offset + length + u64::from(spacing);

            let (offset, length) = (clamp_u16(offset), clamp_u16(length));
            match direction {
                Direction::Horizontal => Rect::new(offset, inner.y, length, inner.height),
                Direction::Vertical => Rect::new(inner.x, offset, inner.width, length),
            }
        })
        .collect()
}

fn clamp_u16(value: u64) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Resolve every constraint to a length; the total never exceeds `total`.
fn resolve(constraints: &[Constraint], total: u64) -> Vec<u64> {
    let mut sizes = vec![0u64; constraints.len()];
    let mut fixed = Vec::new();
    let mut proportional = Vec::new();
    let mut minimums = Vec::new();
    let mut fills = Vec::new();

    for (i, constraint) in constraints.iter().enumerate() {
        match *constraint {
            Constraint::Length(len) => {
                sizes[i] = u64::from(len);
                fixed.push(i);
            }
            Constraint::Percentage(pct) => {
                sizes[i] = (u64::from(pct.min(100)) * total + 50) / 100;
                proportional.push(i);
            }
            Constraint::Ratio(num, den) => {
                sizes[i] = if den == 0 {
                    0
                } else {
                    let (num, den) = (u64::from(num), u64::from(den));
                    ((num * total * 2 + den) / (den * 2)).min(total)
                };
                proportional.push(i);
            }
            Constraint::Min(len) => {
                sizes[i] = u64::from(len);
                minimums.push(i);
            }
            Constraint::Fill(weight) => fills.push(Share {
                index: i,
                weight: u64::from(weight),
                cap: None,
            }),
            Constraint::Max(len) => fills.push(Share {
                index: i,
                weight: 1,
                cap: Some(u64::from(len)),
            }),
        }
    }

    let demand: u64 = sizes.iter().sum();
    if demand > total {
        let mut excess = demand - total;
        for class in [&fixed, &proportional, &minimums] {
            if excess == 0 {
                break;
            }
            let weights: Vec<u64> = class.iter().map(|&i| sizes[i]).collect();
            let class_total: u64 = weights.iter().sum();
            let take = excess.min(class_total);
            for (&i, share) in class.iter().zip(distribute(class_total - take, &weights)) {
                sizes[i] = share;
            }
            excess -= take;
        }
    }

    let pool = total - sizes.iter().sum::<u64>();
    if !fills.is_empty() {
        share_capped(pool, &mut fills, &mut sizes);
    } else if !minimums.is_empty() {
        let weights = vec![1; minimums.len()];
        for (&i, extra) in minimums.iter().zip(distribute(pool, &weights)) {
            sizes[i] += extra;
        }
    }

    sizes
}

/// One participant in the leftover pool.
struct Share {
    index: usize,
    weight: u64,
    cap: Option<u64>,
}

/// Share `pool` among `shares` by weight, honoring caps.
///
/// A participant whose share would exceed its cap is pinned at the cap and
/// the rest is re-shared among the others. Space nobody can take stays unused.
fn share_capped(mut pool: u64, shares: &mut Vec<Share>, sizes: &mut [u64]) {
    loop {
        let weights: Vec<u64> = shares.iter().map(|s| s.weight).collect();
        let amounts = distribute(pool, &weights);

        let mut pinned = false;
        let mut k = 0;
        shares.retain(|share| {
            let amount = amounts[k];
            k += 1;
            match share.cap {
                Some(cap) if amount > cap => {
                    sizes[share.index] = cap;
                    pool -= cap;
                    pinned = true;
                    false
                }
                _ => true,
            }
        });

        if !pinned || shares.is_empty() {
            let weights: Vec<u64> = shares.iter().map(|s| s.weight).collect();
            for (share, amount) in shares.iter().zip(distribute(pool, &weights)) {
                sizes[share.index] = amount;
            }
            return;
        }
    }
}

/// Split `total` proportionally to `weights` with largest-remainder rounding.
///
/// The result sums to exactly `total` unless every weight is zero, in which
/// case everything is zero.
fn distribute(total: u64, weights: &[u64]) -> Vec<u64> {
    let weight_sum: u64 = weights.iter().sum();
    if weight_sum == 0 {
        return vec![0; weights.len()];
    }

    let mut shares: Vec<u64> = weights
        .iter()
        .map(|&w| u128_mul_div(total, w, weight_sum))
        .collect();
    let assigned: u64 = shares.iter().sum();

    let mut order: Vec<(usize, u64)> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| (i, u128_mul_rem(total, w, weight_sum)))
        .collect();
    // Stable: equal remainders keep left-to-right order.
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let leftover = usize::try_from(total - assigned).unwrap_or(usize::MAX);
    for &(i, _) in order.iter().take(leftover) {
        shares[i] += 1;
    }
    shares
}

#[allow(clippy::cast_possible_truncation)]
fn u128_mul_div(a: u64, b: u64, d: u64) -> u64 {
    (u128::from(a) * u128::from(b) / u128::from(d)) as u64
}

#[allow(clippy::cast_possible_truncation)]
fn u128_mul_rem(a: u64, b: u64, d: u64) -> u64 {
    (u128::from(a) * u128::from(b) % u128::from(d)) as u64
}
