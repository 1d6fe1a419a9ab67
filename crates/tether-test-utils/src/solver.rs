//! Mock solver and matching registry entries.
//!
//! - [`MockSolver`]: steps a counter, can be paused, capped, slowed down
//!   or made to fail, and stores region-wise parameters by name.
//! - [`MockParam`]: a [`Param`] backed by [`MockSolver`]'s parameter map.
//! - [`MockQuantity`]: a [`Quantity`] with fixed metadata.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use smallvec::SmallVec;
use tether_core::{
    MeshSpec, Param, ParamError, ParamValue, Quantity, RegionId, RegionSelection, ScriptError,
    Simulation, SolverStatus, StepError, StepOutcome,
};

/// Scriptable stand-in for a numerical solver.
#[derive(Debug, Clone)]
pub struct MockSolver {
    pub nsteps: u64,
    pub time: f64,
    pub dt: f64,
    pub paused: bool,
    /// Steps left before the solver goes idle by itself. `None` runs
    /// forever.
    pub run_for: Option<u64>,
    /// The next `fail_steps` steps return an error.
    pub fail_steps: u32,
    pub step_delay: Duration,
    pub mesh_delay: Duration,
    pub mesh: Option<MeshSpec>,
    pub free_mib: Option<u64>,
    /// Parameter values per region, indexed by `RegionId`.
    pub params: HashMap<String, Vec<ParamValue>>,
    /// Successful parameter writes.
    pub writes: u64,
}

impl Default for MockSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSolver {
    pub fn new() -> Self {
        Self {
            nsteps: 0,
            time: 0.0,
            dt: 1e-13,
            paused: false,
            run_for: None,
            fail_steps: 0,
            step_delay: Duration::ZERO,
            mesh_delay: Duration::ZERO,
            mesh: None,
            free_mib: Some(2048),
            params: HashMap::new(),
            writes: 0,
        }
    }

    /// A solver that reports idle until resumed.
    pub fn paused() -> Self {
        Self {
            paused: true,
            ..Self::new()
        }
    }

    /// Add a parameter holding `value` in every region.
    pub fn with_param(mut self, name: &str, value: &[f64]) -> Self {
        let v: ParamValue = SmallVec::from_slice(value);
        self.params
            .insert(name.to_owned(), vec![v; RegionId::COUNT]);
        self
    }

    pub fn param(&self, name: &str, region: RegionId) -> Option<&ParamValue> {
        self.params
            .get(name)
            .and_then(|regions| regions.get(usize::from(region.0)))
    }

    /// Write `value` into the selected region(s) of `name`.
    pub fn set_param(
        &mut self,
        name: &str,
        selection: RegionSelection,
        value: &[f64],
    ) -> Result<(), ScriptError> {
        if let Some(component) = value.iter().position(|v| !v.is_finite()) {
            return Err(ParamError::NotFinite {
                name: name.to_owned(),
                component,
            }
            .into());
        }
        let regions = self
            .params
            .get_mut(name)
            .ok_or_else(|| ScriptError::UnknownTarget {
                name: name.to_owned(),
            })?;
        if let Some(first) = regions.first() {
            if first.len() != value.len() {
                return Err(ParamError::ComponentCount {
                    name: name.to_owned(),
                    expected: first.len(),
                    found: value.len(),
                }
                .into());
            }
        }
        let v: ParamValue = SmallVec::from_slice(value);
        match selection {
            RegionSelection::All => regions.iter_mut().for_each(|r| *r = v.clone()),
            RegionSelection::One(region) => regions[usize::from(region.0)] = v,
        }
        self.writes += 1;
        Ok(())
    }
}

impl Simulation for MockSolver {
    fn step(&mut self) -> Result<StepOutcome, StepError> {
        if self.fail_steps > 0 {
            self.fail_steps -= 1;
            return Err(StepError::Failed {
                reason: format!("mock failure at step {}", self.nsteps),
            });
        }
        if self.paused || self.run_for == Some(0) {
            return Ok(StepOutcome::Idle);
        }
        if let Some(left) = self.run_for.as_mut() {
            *left -= 1;
        }
        if !self.step_delay.is_zero() {
            thread::sleep(self.step_delay);
        }
        self.nsteps += 1;
        self.time += self.dt;
        Ok(StepOutcome::Advanced)
    }

    fn status(&self) -> SolverStatus {
        SolverStatus {
            nsteps: self.nsteps,
            time: self.time,
            dt: self.dt,
            last_err: 1e-6,
            max_err: 1e-5,
            min_dt: 1e-15,
            max_dt: 1e-12,
            fix_dt: 0.0,
            paused: self.paused || self.run_for == Some(0),
        }
    }

    fn set_mesh(&mut self, mesh: &MeshSpec) -> Result<(), StepError> {
        mesh.validate()?;
        if !self.mesh_delay.is_zero() {
            thread::sleep(self.mesh_delay);
        }
        self.mesh = Some(mesh.clone());
        Ok(())
    }

    fn free_memory_mib(&self) -> Option<u64> {
        self.free_mib
    }
}

/// Region-wise parameter stored in [`MockSolver::params`].
#[derive(Debug, Clone)]
pub struct MockParam {
    pub name: String,
    pub n_comp: usize,
    pub unit: String,
    pub doc: String,
}

impl MockParam {
    pub fn new(name: &str, n_comp: usize, unit: &str) -> Self {
        Self {
            name: name.to_owned(),
            n_comp,
            unit: unit.to_owned(),
            doc: String::new(),
        }
    }
}

impl Param<MockSolver> for MockParam {
    fn n_comp(&self) -> usize {
        self.n_comp
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn doc(&self) -> &str {
        &self.doc
    }

    fn region(&self, sim: &MockSolver, region: RegionId) -> ParamValue {
        sim.param(&self.name, region)
            .cloned()
            .unwrap_or_else(|| SmallVec::from_elem(0.0, self.n_comp))
    }

    fn set_region(
        &self,
        sim: &mut MockSolver,
        region: RegionId,
        value: &[f64],
    ) -> Result<(), ParamError> {
        if value.len() != self.n_comp {
            return Err(ParamError::ComponentCount {
                name: self.name.clone(),
                expected: self.n_comp,
                found: value.len(),
            });
        }
        match sim.set_param(&self.name, RegionSelection::One(region), value) {
            Ok(()) => Ok(()),
            Err(ScriptError::Param(e)) => Err(e),
            Err(ScriptError::UnknownTarget { .. }) => Err(ParamError::UndefinedRegion { region }),
        }
    }

    fn is_uniform(&self, sim: &MockSolver) -> bool {
        match sim.params.get(&self.name) {
            Some(regions) => regions.windows(2).all(|w| w[0] == w[1]),
            None => true,
        }
    }
}

/// Displayable quantity with fixed metadata.
#[derive(Debug, Clone)]
pub struct MockQuantity {
    pub n_comp: usize,
    pub unit: String,
    pub doc: String,
}

impl MockQuantity {
    pub fn new(n_comp: usize, unit: &str, doc: &str) -> Self {
        Self {
            n_comp,
            unit: unit.to_owned(),
            doc: doc.to_owned(),
        }
    }
}

impl Quantity<MockSolver> for MockQuantity {
    fn n_comp(&self) -> usize {
        self.n_comp
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn doc(&self) -> &str {
        &self.doc
    }
}
