//! Exhaustive solver for the 24 game.
//!
//! Pure reduction over the multiset: pick an unordered pair, combine with one
//! of the four operators (both operand orders for the non-commutative ones),
//! recurse on the smaller multiset. Four small integers keep the search space
//! at a few hundred partial combinations, so there is no memoization.

use crate::constants::{TARGET, TOLERANCE};

// Divisors this close to zero are skipped, not an error.
const DIV_EPS: f64 = 1e-9;

/// Whether the four numbers can reach 24 with `+ - * /` and parentheses.
pub fn has_solution(numbers: &[i64; 4]) -> bool {
    let values: Vec<f64> = numbers.iter().map(|n| *n as f64).collect();
    reduce(&values)
}

/// First witness expression in the fixed exploration order, or `None`.
pub fn solve(numbers: &[i64; 4]) -> Option<String> {
    let items: Vec<(f64, String)> = numbers
        .iter()
        .map(|n| (*n as f64, n.to_string()))
        .collect();
    reduce_witness(&items)
}

/// Results of combining `a` and `b`, in the fixed operator order. Division by
/// (near) zero yields no candidate.
fn combinations(a: f64, b: f64) -> Vec<f64> {
    let mut out = vec![a + b, a - b, b - a, a * b];
    if b.abs() > DIV_EPS {
        out.push(a / b);
    }
    if a.abs() > DIV_EPS {
        out.push(b / a);
    }
    out
}

fn reduce(values: &[f64]) -> bool {
    if values.len() == 1 {
        return (values[0] - TARGET).abs() <= TOLERANCE;
    }

    for i in 0..values.len() {
        for j in (i + 1)..values.len() {
            let mut rest: Vec<f64> = values
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != i && *k != j)
                .map(|(_, v)| *v)
                .collect();

            for candidate in combinations(values[i], values[j]) {
                rest.push(candidate);
                if reduce(&rest) {
                    return true;
                }
                rest.pop();
            }
        }
    }

    false
}

fn reduce_witness(items: &[(f64, String)]) -> Option<String> {
    if items.len() == 1 {
        if (items[0].0 - TARGET).abs() <= TOLERANCE {
            return Some(items[0].1.clone());
        }
        return None;
    }

    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let (a, ea) = (&items[i].0, &items[i].1);
            let (b, eb) = (&items[j].0, &items[j].1);

            let mut candidates: Vec<(f64, String)> = vec![
                (a + b, format!("({}+{})", ea, eb)),
                (a - b, format!("({}-{})", ea, eb)),
                (b - a, format!("({}-{})", eb, ea)),
                (a * b, format!("({}*{})", ea, eb)),
            ];
            if b.abs() > DIV_EPS {
                candidates.push((a / b, format!("({}/{})", ea, eb)));
            }
            if a.abs() > DIV_EPS {
                candidates.push((b / a, format!("({}/{})", eb, ea)));
            }

            let rest: Vec<(f64, String)> = items
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != i && *k != j)
                .map(|(_, item)| item.clone())
                .collect();

            for candidate in candidates {
                let mut next = rest.clone();
                next.push(candidate);
                if let Some(witness) = reduce_witness(&next) {
                    return Some(witness);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::expression::{evaluate, extract_numbers};

    fn sorted(mut v: Vec<i64>) -> Vec<i64> {
        v.sort_unstable();
        v
    }

    #[test]
    fn fallback_quadruple_is_solvable() {
        assert!(has_solution(&[4, 6, 8, 1]));
        let witness = solve(&[4, 6, 8, 1]).unwrap();
        let value = evaluate(&witness).unwrap();
        assert!((value - 24.0).abs() <= 1e-3);
    }

    #[test]
    fn all_ones_has_no_solution() {
        assert!(!has_solution(&[1, 1, 1, 1]));
        assert!(solve(&[1, 1, 1, 1]).is_none());
    }

    #[test]
    fn known_division_case_is_solvable() {
        // 8 / (3 - 8/3) = 24 needs fractional intermediates
        assert!(has_solution(&[3, 3, 8, 8]));
    }

    #[test]
    fn solve_agrees_with_has_solution_everywhere() {
        // Soundness over the full 9^4 input space: every claimed-solvable
        // input yields a witness using exactly the input multiset that
        // evaluates to 24 within tolerance.
        for a in 1..=9i64 {
            for b in 1..=9i64 {
                for c in 1..=9i64 {
                    for d in 1..=9i64 {
                        let input = [a, b, c, d];
                        let witness = solve(&input);
                        assert_eq!(
                            witness.is_some(),
                            has_solution(&input),
                            "disagreement on {:?}",
                            input
                        );
                        if let Some(expr) = witness {
                            let used = sorted(extract_numbers(&expr));
                            assert_eq!(used, sorted(input.to_vec()), "multiset for {:?}", input);
                            let value = evaluate(&expr).unwrap();
                            assert!((value - 24.0).abs() <= 1e-3, "{expr} = {value}");
                        }
                    }
                }
            }
        }
    }
}
