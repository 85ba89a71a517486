//! Optimal one-dimensional partitioning (Jenks / Fisher natural breaks).
//!
//! Works on distinct values weighted by multiplicity. Prefix sums give the
//! within-class sum of squares of any contiguous run in O(1); each DP row is
//! filled by divide and conquer over the monotone optimal split, giving
//! O(k · m · log m) time for `m` distinct values.

/// Weighted prefix sums of the shifted values.
struct SegmentCost {
    weight: Vec<f64>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl SegmentCost {
    fn new(distinct: &[(f64, usize)]) -> Self {
        let total: f64 = distinct.iter().map(|&(_, w)| w as f64).sum();
        // Shifting by the mean keeps the sums small and limits cancellation.
        let shift = distinct.iter().map(|&(v, w)| v * w as f64).sum::<f64>() / total;

        let m = distinct.len();
        let mut weight = Vec::with_capacity(m + 1);
        let mut sum = Vec::with_capacity(m + 1);
        let mut sum_sq = Vec::with_capacity(m + 1);
        let (mut w_acc, mut s_acc, mut ss_acc) = (0.0, 0.0, 0.0);
        weight.push(w_acc);
        sum.push(s_acc);
        sum_sq.push(ss_acc);
        for &(v, w) in distinct {
            let x = v - shift;
            let w = w as f64;
            w_acc += w;
            s_acc += w * x;
            ss_acc += w * x * x;
            weight.push(w_acc);
            sum.push(s_acc);
            sum_sq.push(ss_acc);
        }
        SegmentCost { weight, sum, sum_sq }
    }

    /// Sum of squared deviations from the mean over distinct indices `a..=b`.
    fn cost(&self, a: usize, b: usize) -> f64 {
        let w = self.weight[b + 1] - self.weight[a];
        let s = self.sum[b + 1] - self.sum[a];
        let ss = self.sum_sq[b + 1] - self.sum_sq[a];
        (ss - s * s / w).max(0.0)
    }
}

struct Row<'a> {
    cost: &'a SegmentCost,
    prev: &'a [f64],
    cur: Vec<f64>,
    start: Vec<usize>,
    classes: usize,
}

impl Row<'_> {
    /// Fill `cur[lo..=hi]`, knowing the optimal start of the last class lies in `opt_lo..=opt_hi`.
    fn fill(&mut self, lo: usize, hi: usize, opt_lo: usize, opt_hi: usize) {
        if lo > hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let first = opt_lo.max(self.classes);
        let last = opt_hi.min(mid);

        let mut best = f64::INFINITY;
        let mut best_start = first;
        for t in first..=last {
            let c = self.prev[t - 1] + self.cost.cost(t, mid);
            if c < best {
                best = c;
                best_start = t;
            }
        }
        self.cur[mid] = best;
        self.start[mid] = best_start;

        if mid > lo {
            self.fill(lo, mid - 1, opt_lo, best_start);
        }
        self.fill(mid + 1, hi, best_start, opt_hi);
    }
}

/// A break strictly above `lo` and at most `hi`, so half-open classes keep both groups intact.
fn split_point(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid > lo && mid <= hi { mid } else { hi }
}

/// Breaks of the minimum within-class sum of squares partition into
/// `min(k, distinct.len())` classes.
///
/// `distinct` holds ascending distinct values with their counts (at least
/// two entries). Inner breaks sit halfway between the last value of one class
/// and the first value of the next.
pub(super) fn natural_breaks(distinct: &[(f64, usize)], k: usize) -> Vec<f64> {
    let m = distinct.len();
    let k = k.min(m);
    let cost = SegmentCost::new(distinct);

    // prev[i]: best cost of the first i+1 values in (row index + 1) classes.
    let mut prev: Vec<f64> = (0..m).map(|i| cost.cost(0, i)).collect();
    let mut starts: Vec<Vec<usize>> = Vec::with_capacity(k.saturating_sub(1));

    for classes in 1..k {
        let mut row = Row {
            cost: &cost,
            prev: &prev,
            cur: vec![f64::INFINITY; m],
            start: vec![0; m],
            classes,
        };
        row.fill(classes, m - 1, classes, m - 1);
        let Row { cur, start, .. } = row;
        starts.push(start);
        prev = cur;
    }

    // Walk back from the last value to recover where each class begins.
    let mut class_starts = Vec::with_capacity(k - 1);
    let mut end = m - 1;
    for start in starts.iter().rev() {
        let t = start[end];
        class_starts.push(t);
        end = t - 1;
    }
    class_starts.reverse();

    let mut breaks = Vec::with_capacity(k + 1);
    breaks.push(distinct[0].0);
    breaks.extend(
        class_starts
            .iter()
            .map(|&t| split_point(distinct[t - 1].0, distinct[t].0)),
    );
    breaks.push(distinct[m - 1].0);
    breaks
}
