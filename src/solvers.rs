use crate::{
    hyperbolic_keplers_equation, hyperbolic_keplers_equation_derivative, keplers_equation,
    keplers_equation_derivative, solve_monotone_cubic, NUMERIC_MAX_ITERS, NUMERIC_TOLERANCE,
};
use core::f64::consts::{PI, TAU};

/// A constant used to get the initial seed for the eccentric anomaly.
///
/// It's very arbitrary, but according to some testing, a value just
/// below 1 works better than exactly 1.
///
/// Source:
/// "Two fast and accurate routines for solving the elliptic Kepler
/// equation for all values of the eccentricity and mean anomaly"
/// by Daniele Tommasini and David N. Olivieri,
/// section 2.1.2, 'The "rational seed"'
///
/// <https://doi.org/10.1051/0004-6361/202141423>
const B: f64 = 0.999999;

const PI_SQUARED: f64 = PI * PI;

/// The outcome of a bounded Newton-Raphson iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct NewtonSolution {
    /// The last iterate.
    pub(crate) value: f64,
    /// Whether the last step was within [`NUMERIC_TOLERANCE`] of the iterate.
    pub(crate) converged: bool,
}

/// Newton-Raphson from `seed`, with every iterate kept in `[lower, upper]`.
///
/// `f` returns the function value and its derivative. The tolerance is
/// relative even for tiny roots: near-parabolic orbits spend most of their
/// time close to an anomaly of zero.
fn newton(seed: f64, lower: f64, upper: f64, f: impl Fn(f64) -> (f64, f64)) -> NewtonSolution {
    let mut x = seed;

    for _ in 0..NUMERIC_MAX_ITERS {
        let (value, derivative) = f(x);

        if derivative.abs() < 1e-30 || !derivative.is_finite() {
            // dangerously close to div-by-zero, break out
            return NewtonSolution {
                value: x,
                converged: false,
            };
        }

        let delta = value / derivative;
        x = (x - delta).max(lower).min(upper);

        if delta.abs() <= NUMERIC_TOLERANCE * x.abs() {
            return NewtonSolution {
                value: x,
                converged: true,
            };
        }
    }

    NewtonSolution {
        value: x,
        converged: false,
    }
}

/// Gets the elliptic eccentric anomaly at a mean anomaly.
///
/// # Unchecked Operation
/// This function does not check whether or not the orbit is actually elliptic (e < 1).
/// Nonsensical output may be produced if it is hyperbolic or parabolic.
pub(crate) fn eccentric_anomaly_elliptic(eccentricity: f64, mean_anomaly: f64) -> f64 {
    solve_elliptic(eccentricity, mean_anomaly).value
}

/// Solves Kepler's equation `M = E - e sin E` for the eccentric anomaly.
///
/// # Method
/// Newton-Raphson, started from the "rational seed" of Tommasini and
/// Olivieri.
///
/// On `[0, pi]` the equation is convex, and the root lies below each of
/// `M + e`, `cbrt(pi^2 M)` and `pi` (the middle bound follows from
/// `E - sin E >= E^3 / pi^2`). Iterates are clamped to that bound, so even
/// a seed far below the root near e = 1 can't overshoot onto another
/// branch; from above, Newton's method descends monotonically.
///
/// The iteration count is capped at [`NUMERIC_MAX_ITERS`]; if the cap is hit
/// the best estimate so far is returned.
pub(crate) fn solve_elliptic(eccentricity: f64, mean_anomaly: f64) -> NewtonSolution {
    if !mean_anomaly.is_finite() {
        return NewtonSolution {
            value: f64::NAN,
            converged: false,
        };
    }

    // Use the symmetry and periodicity of the eccentric anomaly
    // Equation 2 from the paper
    // "Two fast and accurate routines for solving
    // the elliptic Kepler equation for all values
    // of the eccentricity and mean anomaly"
    let turns = (mean_anomaly / TAU).floor();
    let mut reduced = mean_anomaly - turns * TAU;
    let mut sign = 1.0;
    let mut offset = turns * TAU;

    if reduced > PI {
        reduced -= TAU;
        offset += TAU;
    }
    if reduced < 0.0 {
        reduced = -reduced;
        sign = -1.0;
    }

    // Starting guess, equation 19:
    // E_0 = M + (4beM(pi - M)) / (8eM + 4e(e-pi) + pi^2)
    let seed = reduced
        + (4.0 * eccentricity * B * reduced * (PI - reduced))
            / (8.0 * eccentricity * reduced
                + 4.0 * eccentricity * (eccentricity - PI)
                + PI_SQUARED);
    let upper = (reduced + eccentricity)
        .min((PI_SQUARED * reduced).cbrt())
        .min(PI);

    let solution = newton(seed.min(upper), 0.0, upper, |ecc_anom| {
        (
            keplers_equation(reduced, ecc_anom, eccentricity),
            keplers_equation_derivative(ecc_anom, eccentricity),
        )
    });

    if !solution.converged {
        log::debug!(
            "elliptic Kepler solver did not converge (e = {eccentricity}, M = {mean_anomaly})"
        );
    }

    NewtonSolution {
        value: solution.value * sign + offset,
        ..solution
    }
}

/// Gets the hyperbolic eccentric anomaly at a mean anomaly.
///
/// # Unchecked Operation
/// This function does not check whether or not the orbit is actually hyperbolic.
pub(crate) fn eccentric_anomaly_hyperbolic(eccentricity: f64, mean_anomaly: f64) -> f64 {
    solve_hyperbolic(eccentricity, mean_anomaly).value
}

/// Solves the hyperbolic Kepler equation `M = e sinh H - H`.
///
/// # Method
/// Newton-Raphson. The seed is the smaller of `ln(2|M|/e + 1.8)`, which is
/// close for large `|M|`, and `cbrt(6|M|)`, which bounds the root from above
/// since `sinh H - H >= H^3 / 6`. The equation is convex and increasing for
/// positive `H`: from below the root the first step overshoots past it,
/// and from above the iterates descend monotonically.
pub(crate) fn solve_hyperbolic(eccentricity: f64, mean_anomaly: f64) -> NewtonSolution {
    let sign = mean_anomaly.signum();
    let magnitude = mean_anomaly.abs();

    let seed = (2.0 * magnitude / eccentricity + 1.8)
        .ln()
        .min((6.0 * magnitude).cbrt());

    let solution = newton(seed, 0.0, f64::INFINITY, |ecc_anom| {
        (
            hyperbolic_keplers_equation(magnitude, ecc_anom, eccentricity),
            hyperbolic_keplers_equation_derivative(ecc_anom, eccentricity),
        )
    });

    if !solution.converged {
        log::debug!(
            "hyperbolic Kepler solver did not converge (e = {eccentricity}, M = {mean_anomaly})"
        );
    }

    NewtonSolution {
        value: sign * solution.value,
        ..solution
    }
}

/// Solves Barker's equation `M = D + D^3 / 3` for `D = tan(v / 2)`.
///
/// The cubic is monotone in `D`, so this is a closed form; no iteration is
/// needed even for huge mean anomalies.
pub(crate) fn parabolic_anomaly(mean_anomaly: f64) -> f64 {
    // D^3 + 3D - 3M = 0
    solve_monotone_cubic(1.0, 0.0, 3.0, -3.0 * mean_anomaly)
}
