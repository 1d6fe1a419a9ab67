//! Value types exchanged with the solver collaborator.

use crate::error::StepError;

/// Result of one call to [`Simulation::step`](crate::Simulation::step).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The solver advanced by one time step.
    Advanced,
    /// The solver has nothing to do (paused, or the run target was
    /// reached). The loop then blocks on the command queue instead of
    /// spinning.
    Idle,
}

/// Solver figures shown on the control page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolverStatus {
    /// Number of steps taken since start.
    pub nsteps: u64,
    /// Simulated time in seconds.
    pub time: f64,
    /// Last time step in seconds.
    pub dt: f64,
    /// Error estimate of the last step.
    pub last_err: f64,
    /// Target maximum error per step.
    pub max_err: f64,
    /// Lower bound on the adaptive time step.
    pub min_dt: f64,
    /// Upper bound on the adaptive time step.
    pub max_dt: f64,
    /// Fixed time step, or 0 when adaptive.
    pub fix_dt: f64,
    /// Whether the solver is currently paused.
    pub paused: bool,
}

/// Mesh geometry request.
///
/// Cell sizes are in metres. `pbc` holds the number of periodic images
/// per axis (0 = not periodic).
#[derive(Clone, Debug, PartialEq)]
pub struct MeshSpec {
    /// Cell count along x, y, z.
    pub cells: [usize; 3],
    /// Cell size along x, y, z in metres.
    pub cell_size: [f64; 3],
    /// Periodic repetitions along x, y, z.
    pub pbc: [usize; 3],
}

impl MeshSpec {
    /// Check structural constraints: every axis has at least one cell
    /// and every cell size is finite and positive.
    pub fn validate(&self) -> Result<(), StepError> {
        for (axis, &n) in ["x", "y", "z"].iter().zip(&self.cells) {
            if n == 0 {
                return Err(StepError::InvalidMesh {
                    reason: format!("cell count along {axis} must be at least 1"),
                });
            }
        }
        for (axis, &c) in ["x", "y", "z"].iter().zip(&self.cell_size) {
            if !c.is_finite() || c <= 0.0 {
                return Err(StepError::InvalidMesh {
                    reason: format!("cell size along {axis} must be positive, got {c}"),
                });
            }
        }
        Ok(())
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.iter().product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> MeshSpec {
        MeshSpec {
            cells: [64, 32, 1],
            cell_size: [4e-9, 4e-9, 2e-9],
            pbc: [0, 0, 0],
        }
    }

    #[test]
    fn valid_mesh_passes() {
        assert!(mesh().validate().is_ok());
        assert_eq!(mesh().cell_count(), 2048);
    }

    #[test]
    fn zero_cells_rejected() {
        let m = MeshSpec {
            cells: [64, 0, 1],
            ..mesh()
        };
        assert!(matches!(m.validate(), Err(StepError::InvalidMesh { .. })));
    }

    #[test]
    fn non_positive_cell_size_rejected() {
        let m = MeshSpec {
            cell_size: [4e-9, f64::NAN, 2e-9],
            ..mesh()
        };
        assert!(m.validate().is_err());
        let m = MeshSpec {
            cell_size: [0.0, 4e-9, 2e-9],
            ..mesh()
        };
        assert!(m.validate().is_err());
    }
}
