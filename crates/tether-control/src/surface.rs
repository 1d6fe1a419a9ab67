//! The control surface: inbound event dispatch and the periodic refresh.
//!
//! Every handler runs on the caller's (request) thread. Reads and writes
//! of simulation state go through the [`Injector`]; busy state, heartbeat
//! and cache breaker are touched directly through [`Signals`].

use std::sync::Arc;

use tether_core::{Compiler, Console, RegionSelection, Simulation};
use tether_engine::{Injector, Signals};

use crate::config::ControlConfig;
use crate::error::{ControlError, EvalError};
use crate::eval::EvalPipeline;
use crate::events::{self, Event};
use crate::mesh;
use crate::page::Page;
use crate::refresh::{self, RefreshOutcome, Snapshot};
use crate::registry::Registry;

/// How an inbound event was dealt with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// The handler ran.
    Handled,
    /// A mutating event arrived while busy and was not acted on.
    Deferred,
}

/// Binds page events and refresh polls to the simulation thread.
pub struct ControlSurface<S> {
    config: ControlConfig,
    page: Arc<Page>,
    registry: Arc<Registry<S>>,
    injector: Injector<S>,
    signals: Signals,
    eval: EvalPipeline<S>,
}

impl<S: Simulation> ControlSurface<S> {
    /// Arm the surface. `page` should be the gate `signals` was built
    /// with, so busy transitions show on it.
    pub fn new(
        config: ControlConfig,
        page: Arc<Page>,
        registry: Registry<S>,
        injector: Injector<S>,
        signals: Signals,
        compiler: Arc<dyn Compiler<S>>,
        console: Arc<dyn Console>,
    ) -> Self {
        page.set(events::TITLE, config.title.as_str());
        page.set(events::VERSION, config.version.as_str());
        page.set(events::RENDER_QUANT, config.default_quantity.as_str());
        page.set(events::RENDER_COMP, config.default_component.as_str());
        page.set(events::SEL_REGION, RegionSelection::All.index());
        page.set(
            events::RENDER_DOC,
            registry
                .quantity(&config.default_quantity)
                .map(|q| q.doc())
                .unwrap_or_default(),
        );
        // Nothing to confirm until a mesh box changes.
        page.set_disabled(events::SETMESH, true);

        let eval = EvalPipeline::new(compiler, injector.clone(), console);
        Self {
            config,
            page,
            registry: Arc::new(registry),
            injector,
            signals,
            eval,
        }
    }

    /// Handle the inbound event `id`.
    ///
    /// The cache breaker is bumped before returning, whatever the
    /// outcome. Mutating events are deferred while busy.
    pub fn handle_event(&self, id: &str) -> Result<EventOutcome, ControlError> {
        let outcome = match Event::parse(id) {
            Some(event) => self.dispatch(event),
            None => Err(ControlError::UnknownEvent { id: id.to_owned() }),
        };
        let breaker = self.signals.cache.bump();
        tracing::trace!(event = id, breaker, "event handled");
        outcome
    }

    fn dispatch(&self, event: Event<'_>) -> Result<EventOutcome, ControlError> {
        if event.is_mutating() && self.signals.busy.is_busy() {
            tracing::debug!(?event, "busy; mutating event deferred");
            return Ok(EventOutcome::Deferred);
        }
        match event {
            Event::Cli => {
                let text = self.page.string_value(events::CLI);
                self.page.set(events::CLI, "");
                if !text.trim().is_empty() {
                    self.run_script(&text)?;
                }
            }
            Event::MeshBox(_) => mesh::mark_dirty(&self.page),
            Event::SetMesh => {
                mesh::apply(&self.page, &self.injector, &self.signals.busy)?;
            }
            Event::RenderQuant => {
                let name = self.page.string_value(events::RENDER_QUANT);
                let quantity = self
                    .registry
                    .quantity(&name)
                    .ok_or(ControlError::NotRegistered { name })?;
                self.page.set(events::RENDER_DOC, quantity.doc());
            }
            // Picked up by the next refresh.
            Event::RenderComp => {}
            Event::SelectRegion => {
                self.region()?;
            }
            Event::ParamEdit { name, comp } => {
                let text = self.param_assignment(name, comp)?;
                self.run_script(&text)?;
            }
        }
        Ok(EventOutcome::Handled)
    }

    /// Compile errors are already on the console and are not a failure
    /// of the event itself.
    fn run_script(&self, text: &str) -> Result<(), ControlError> {
        match self.eval.eval(text) {
            Ok(_) | Err(EvalError::Compile { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Script text assigning the page's component boxes of `name` to the
    /// selected region(s). `comp` is the box that changed.
    fn param_assignment(&self, name: &str, comp: usize) -> Result<String, ControlError> {
        let param = self
            .registry
            .param(name)
            .ok_or_else(|| ControlError::NotRegistered {
                name: name.to_owned(),
            })?;
        if comp >= param.n_comp() {
            return Err(ControlError::BadField {
                id: events::param_id(name, comp),
                reason: format!("{name} has {} component(s)", param.n_comp()),
            });
        }
        let comps: Vec<String> = (0..param.n_comp())
            .map(|c| {
                self.page
                    .string_value(&events::param_id(name, c))
                    .trim()
                    .to_owned()
            })
            .collect();
        let value = match comps.as_slice() {
            [v] => v.clone(),
            vs => format!("({})", vs.join(", ")),
        };
        Ok(match self.region()? {
            RegionSelection::All => format!("{name} = {value}"),
            RegionSelection::One(r) => format!("{name}.setRegion({r}, {value})"),
        })
    }

    /// The region selected for parameter display and edits.
    pub fn region(&self) -> Result<RegionSelection, ControlError> {
        let index = self.page.int_value(events::SEL_REGION)?;
        RegionSelection::from_index(index).ok_or_else(|| ControlError::BadField {
            id: events::SEL_REGION.to_owned(),
            reason: format!("{index} is not a region (-1..=255)"),
        })
    }

    /// The periodic monitor poll.
    ///
    /// While busy, publishes `"busy"` and injects nothing. Otherwise
    /// re-enables the controls and takes one [`Snapshot`] through a
    /// single blocking injection, then publishes it.
    pub fn refresh(&self) -> Result<RefreshOutcome, ControlError> {
        self.signals.heartbeat.touch();

        if !self.signals.busy.enable_controls_if_idle() {
            self.page.set(events::SOLVER_STATUS, "busy");
            tracing::debug!("busy; refresh skipped");
            return Ok(RefreshOutcome::Busy);
        }

        let page = Arc::clone(&self.page);
        let registry = Arc::clone(&self.registry);
        let cache = Arc::clone(&self.signals.cache);
        let region = self.region().unwrap_or_default();
        let snapshot = self.injector.call("refresh", move |sim: &mut S| {
            Snapshot::capture(
                sim,
                &registry,
                page.string_value(events::RENDER_QUANT),
                page.string_value(events::RENDER_COMP),
                region,
                cache.current(),
            )
        })?;

        snapshot.publish(&self.page, &self.config.render_prefix);
        Ok(RefreshOutcome::Updated(snapshot))
    }

    /// Render reference for the current selection, step count and cache
    /// breaker.
    pub fn render_identifier(&self) -> String {
        refresh::render_identifier(
            &self.config.render_prefix,
            &self.page.string_value(events::RENDER_QUANT),
            &self.page.string_value(events::RENDER_COMP),
            self.page
                .int_value("nsteps")
                .ok()
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0),
            self.signals.cache.current(),
        )
    }

    /// The page this surface publishes to.
    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    /// Page title.
    pub fn title(&self) -> &str {
        &self.config.title
    }

    /// Registered quantity names, sorted case-insensitively.
    pub fn quant_names(&self) -> Vec<&str> {
        self.registry.quant_names()
    }

    /// Registered parameter names, sorted case-insensitively.
    pub fn param_names(&self) -> Vec<&str> {
        self.registry.param_names()
    }

    /// Shared busy/heartbeat/cache primitives.
    pub fn signals(&self) -> &Signals {
        &self.signals
    }
}
