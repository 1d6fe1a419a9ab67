//! Control page ids and inbound event decoding.

/// Free-text command box.
pub const CLI: &str = "cli";
/// Mesh confirmation button.
pub const SETMESH: &str = "setmesh";
/// Mesh warning line.
pub const SETMESH_WARN: &str = "setmeshwarn";
/// Render quantity selector.
pub const RENDER_QUANT: &str = "renderQuant";
/// Render component selector.
pub const RENDER_COMP: &str = "renderComp";
/// Documentation line for the selected quantity.
pub const RENDER_DOC: &str = "renderDoc";
/// Cache-busting image reference.
pub const DISPLAY: &str = "display";
/// Region selector for parameter display and edits.
pub const SEL_REGION: &str = "sel_region";
/// Solver status line.
pub const SOLVER_STATUS: &str = "solverstatus";
/// Page title.
pub const TITLE: &str = "title";
/// Version string.
pub const VERSION: &str = "version";

/// Cell counts, cell sizes (nm) and periodic images, in that order.
pub const MESH_BOXES: [&str; 9] = ["nx", "ny", "nz", "cx", "cy", "cz", "px", "py", "pz"];

const PARAM_PREFIX: &str = "param_";

/// Page id of component `comp` of parameter `name`.
pub fn param_id(name: &str, comp: usize) -> String {
    format!("{PARAM_PREFIX}{name}_{comp}")
}

/// A decoded inbound event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// The command box was submitted.
    Cli,
    /// One of the [`MESH_BOXES`] changed.
    MeshBox(&'a str),
    /// The mesh confirmation button was pressed.
    SetMesh,
    /// The render quantity changed.
    RenderQuant,
    /// The render component changed.
    RenderComp,
    /// The region selector changed.
    SelectRegion,
    /// A parameter component box changed.
    ParamEdit {
        /// Parameter name.
        name: &'a str,
        /// Component index.
        comp: usize,
    },
}

impl<'a> Event<'a> {
    /// Decode an event id. Returns `None` for ids no handler is bound to.
    pub fn parse(id: &'a str) -> Option<Self> {
        match id {
            CLI => Some(Event::Cli),
            SETMESH => Some(Event::SetMesh),
            RENDER_QUANT => Some(Event::RenderQuant),
            RENDER_COMP => Some(Event::RenderComp),
            SEL_REGION => Some(Event::SelectRegion),
            _ if MESH_BOXES.iter().any(|b| *b == id) => Some(Event::MeshBox(id)),
            _ => {
                let rest = id.strip_prefix(PARAM_PREFIX)?;
                let (name, comp) = rest.rsplit_once('_')?;
                if name.is_empty() {
                    return None;
                }
                let comp = comp.parse().ok()?;
                Some(Event::ParamEdit { name, comp })
            }
        }
    }

    /// Whether the event mutates simulation state. Mutating events are
    /// deferred while the bridge is busy.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Event::Cli | Event::SetMesh | Event::ParamEdit { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_ids_round_trip_with_underscored_names() {
        let id = param_id("B_ext", 2);
        assert_eq!(id, "param_B_ext_2");
        assert_eq!(
            Event::parse(&id),
            Some(Event::ParamEdit {
                name: "B_ext",
                comp: 2
            })
        );
    }

    #[test]
    fn fixed_ids() {
        assert_eq!(Event::parse("cli"), Some(Event::Cli));
        assert_eq!(Event::parse("cz"), Some(Event::MeshBox("cz")));
        assert_eq!(Event::parse("renderQuant"), Some(Event::RenderQuant));
        assert_eq!(Event::parse("param_x"), None);
        assert_eq!(Event::parse("param__0"), None);
        assert_eq!(Event::parse("bogus"), None);
    }

    #[test]
    fn mutating_events() {
        assert!(Event::Cli.is_mutating());
        assert!(Event::SetMesh.is_mutating());
        assert!(!Event::MeshBox("nx").is_mutating());
        assert!(!Event::RenderQuant.is_mutating());
    }
}
