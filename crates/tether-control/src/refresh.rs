//! One consistent read of simulation state and its publication.
//!
//! [`Snapshot::capture`] runs on the simulation thread inside a single
//! injected command, so every field in it reflects the same instant.
//! [`Snapshot::publish`] runs back on the handler thread.

use tether_core::{ParamValue, RegionId, RegionSelection, SolverStatus};

use crate::events::{self, param_id};
use crate::page::Page;
use crate::registry::Registry;

/// Result of [`ControlSurface::refresh`](crate::surface::ControlSurface::refresh).
#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    /// The bridge was busy; nothing was injected and only the status
    /// line was updated.
    Busy,
    /// A full snapshot was taken and published.
    Updated(Snapshot),
}

/// Displayed value of one parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamReading {
    /// Registry name.
    pub name: String,
    /// Component count.
    pub n_comp: usize,
    /// Value for the selected region. `None` when all regions are
    /// selected and they disagree, which the page shows as blanks.
    pub value: Option<ParamValue>,
}

/// Mutually consistent simulation figures.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Solver figures.
    pub status: SolverStatus,
    /// Free device memory in MiB, if known.
    pub free_mib: Option<u64>,
    /// Selected render quantity.
    pub quantity: String,
    /// Selected render component.
    pub component: String,
    /// Cache breaker value at capture time.
    pub breaker: u64,
    /// Region the parameter readings refer to.
    pub region: RegionSelection,
    /// Every registered parameter, in registry order.
    pub params: Vec<ParamReading>,
}

/// Display reference for a rendered quantity. Changes whenever the step
/// count or the cache breaker does.
pub fn render_identifier(
    prefix: &str,
    quantity: &str,
    component: &str,
    nsteps: u64,
    breaker: u64,
) -> String {
    format!("{prefix}{quantity}/{component}?{nsteps}_{breaker}")
}

/// Status line text.
pub fn status_line(status: &SolverStatus) -> &'static str {
    if status.paused {
        "paused"
    } else {
        "running"
    }
}

fn format_component(v: f64) -> String {
    // Shown at single precision.
    format!("{}", v as f32)
}

impl Snapshot {
    /// Read everything the page shows. Call on the simulation thread.
    pub fn capture<S: tether_core::Simulation>(
        sim: &S,
        registry: &Registry<S>,
        quantity: String,
        component: String,
        region: RegionSelection,
        breaker: u64,
    ) -> Self {
        let params = registry
            .params()
            .map(|(name, p)| {
                let value = match region {
                    RegionSelection::One(r) => Some(p.region(sim, r)),
                    RegionSelection::All if p.is_uniform(sim) => Some(p.region(sim, RegionId(0))),
                    RegionSelection::All => None,
                };
                ParamReading {
                    name: name.to_owned(),
                    n_comp: p.n_comp(),
                    value,
                }
            })
            .collect();
        Self {
            status: sim.status(),
            free_mib: sim.free_memory_mib(),
            quantity,
            component,
            breaker,
            region,
            params,
        }
    }

    /// This snapshot's render reference.
    pub fn render_identifier(&self, prefix: &str) -> String {
        render_identifier(
            prefix,
            &self.quantity,
            &self.component,
            self.status.nsteps,
            self.breaker,
        )
    }

    /// Write every field to `page`.
    pub fn publish(&self, page: &Page, render_prefix: &str) {
        let s = &self.status;
        page.set("nsteps", s.nsteps);
        page.set("time", format!("{:.6e}", s.time));
        page.set("dt", format!("{:.6e}", s.dt));
        page.set("lasterr", format!("{:.6e}", s.last_err));
        page.set("maxerr", s.max_err);
        page.set("mindt", s.min_dt);
        page.set("maxdt", s.max_dt);
        page.set("fixdt", s.fix_dt);
        page.set(events::SOLVER_STATUS, status_line(s));
        page.set(events::DISPLAY, self.render_identifier(render_prefix));
        match self.free_mib {
            Some(mib) => page.set("memfree", mib),
            None => page.set("memfree", ""),
        }

        for reading in &self.params {
            for comp in 0..reading.n_comp {
                let text = reading
                    .value
                    .as_ref()
                    .and_then(|v| v.get(comp))
                    .map(|&c| format_component(c))
                    .unwrap_or_default();
                page.set(&param_id(&reading.name, comp), text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Value;
    use crate::registry::RegistryBuilder;
    use proptest::prelude::*;
    use tether_test_utils::{MockParam, MockSolver};

    fn registry() -> Registry<MockSolver> {
        let mut b = RegistryBuilder::<MockSolver>::new();
        b.param("Msat", MockParam::new("Msat", 1, "A/m"))
            .unwrap()
            .param("m", MockParam::new("m", 3, ""))
            .unwrap();
        b.build()
    }

    fn sim() -> MockSolver {
        MockSolver::new()
            .with_param("Msat", &[8e5])
            .with_param("m", &[1.0, 0.0, 0.0])
    }

    #[test]
    fn render_identifier_format() {
        assert_eq!(
            render_identifier("/render/", "m", "x", 120, 7),
            "/render/m/x?120_7"
        );
    }

    #[test]
    fn uniform_param_shows_region_zero_for_all() {
        let snap = Snapshot::capture(
            &sim(),
            &registry(),
            "m".into(),
            String::new(),
            RegionSelection::All,
            0,
        );
        let page = Page::new();
        snap.publish(&page, "/render/");
        assert_eq!(page.string_value("param_Msat_0"), "800000");
        assert_eq!(page.string_value("param_m_0"), "1");
        assert_eq!(page.string_value("param_m_2"), "0");
        assert_eq!(page.string_value("solverstatus"), "running");
        assert_eq!(page.value("memfree"), Some(Value::Int(2048)));
    }

    #[test]
    fn non_uniform_param_blank_for_all_regions() {
        let mut s = sim();
        s.set_param("Msat", RegionSelection::One(RegionId(4)), &[1e5])
            .unwrap();
        let reg = registry();
        let all = Snapshot::capture(&s, &reg, "m".into(), String::new(), RegionSelection::All, 0);
        let page = Page::new();
        all.publish(&page, "/render/");
        assert_eq!(page.string_value("param_Msat_0"), "");

        let one = Snapshot::capture(
            &s,
            &reg,
            "m".into(),
            String::new(),
            RegionSelection::One(RegionId(4)),
            0,
        );
        one.publish(&page, "/render/");
        assert_eq!(page.string_value("param_Msat_0"), "100000");
    }

    #[test]
    fn scientific_fields() {
        let mut s = sim();
        s.time = 2.5e-10;
        let snap = Snapshot::capture(&s, &registry(), "m".into(), "z".into(), RegionSelection::All, 3);
        let page = Page::new();
        snap.publish(&page, "/img/");
        assert_eq!(page.string_value("time"), "2.500000e-10");
        assert_eq!(page.string_value("display"), "/img/m/z?0_3");
    }

    proptest! {
        #[test]
        fn breaker_change_always_changes_identifier(
            quant in "[A-Za-z_]{1,8}",
            comp in "[xyz]?",
            nsteps in any::<u64>(),
            breaker in 0u64..u64::MAX,
        ) {
            let before = render_identifier("/render/", &quant, &comp, nsteps, breaker);
            let after = render_identifier("/render/", &quant, &comp, nsteps, breaker + 1);
            prop_assert_ne!(before, after);
        }
    }
}
