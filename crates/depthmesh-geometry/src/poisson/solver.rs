//! Conjugate-gradient solve of the discrete Poisson equation.

use super::grid::Lattice;

/// Outcome of a solve.
#[derive(Debug, Clone, Copy)]
pub struct SolveStats {
    pub iterations: usize,
    pub relative_residual: f64,
    pub converged: bool,
}

/// Applies `A = -h^2 * laplacian` (7-point stencil) on interior nodes.
///
/// Boundary nodes are fixed at zero and map to zero.
fn apply_operator(lattice: &Lattice, x: &[f32], out: &mut [f32]) {
    let n = lattice.n;
    let (sy, sz) = (n, n * n);
    for z in 0..n {
        for y in 0..n {
            for xi in 0..n {
                let i = lattice.index(xi, y, z);
                if lattice.is_boundary(xi, y, z) {
                    out[i] = 0.0;
                    continue;
                }
                let neighbours =
                    x[i - 1] + x[i + 1] + x[i - sy] + x[i + sy] + x[i - sz] + x[i + sz];
                out[i] = 6.0 * x[i] - neighbours;
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

/// Solves `-laplacian(chi) = rhs / h^2`, i.e. `A chi = rhs`, with zero
/// Dirichlet boundary. `rhs` must already be scaled by `-h^2`.
///
/// Runs until the residual drops below `tolerance` relative to `rhs`, or
/// `max_iterations` is reached.
#[allow(clippy::cast_possible_truncation)]
pub fn solve(
    lattice: &Lattice,
    rhs: &[f32],
    max_iterations: usize,
    tolerance: f64,
) -> (Vec<f32>, SolveStats) {
    let len = lattice.node_count();
    let mut chi = vec![0.0_f32; len];
    // chi starts at zero, so the residual is the right-hand side
    let mut r = rhs.to_vec();
    for z in 0..lattice.n {
        for y in 0..lattice.n {
            for x in 0..lattice.n {
                if lattice.is_boundary(x, y, z) {
                    r[lattice.index(x, y, z)] = 0.0;
                }
            }
        }
    }
    let mut p = r.clone();
    let mut ap = vec![0.0_f32; len];

    let rhs_norm = dot(&r, &r).sqrt();
    let mut rr = dot(&r, &r);
    let mut stats = SolveStats {
        iterations: 0,
        relative_residual: 0.0,
        converged: true,
    };
    if rhs_norm == 0.0 {
        return (chi, stats);
    }

    for iteration in 1..=max_iterations {
        apply_operator(lattice, &p, &mut ap);
        let p_ap = dot(&p, &ap);
        if p_ap <= 0.0 {
            break;
        }
        let alpha = (rr / p_ap) as f32;
        for i in 0..len {
            chi[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }
        let rr_next = dot(&r, &r);
        stats.iterations = iteration;
        stats.relative_residual = rr_next.sqrt() / rhs_norm;
        if stats.relative_residual <= tolerance {
            return (chi, stats);
        }
        let beta = (rr_next / rr) as f32;
        for i in 0..len {
            p[i] = r[i] + beta * p[i];
        }
        rr = rr_next;
    }

    stats.converged = false;
    (chi, stats)
}
