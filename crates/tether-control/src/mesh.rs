//! Mesh editing: dirty tracking on the page and the confirmed, busy-
//! bracketed remesh on the simulation thread.

use std::sync::Arc;

use tether_core::{MeshSpec, Simulation};
use tether_engine::{BusyState, Injector};

use crate::error::ControlError;
use crate::events::{MESH_BOXES, SETMESH, SETMESH_WARN};
use crate::page::Page;

/// Shown while the mesh boxes differ from the applied mesh.
pub const MESH_WARN: &str = "\u{26a0} Click to update mesh (may take some time)";
/// Shown once the requested mesh has been applied.
pub const MESH_OK: &str = "mesh up to date";

/// Metres per nanometre. Cell sizes are entered in nm.
const NM: f64 = 1e-9;

/// A mesh box changed: allow confirmation and warn.
pub fn mark_dirty(page: &Page) {
    page.set_disabled(SETMESH, false);
    page.set(SETMESH_WARN, MESH_WARN);
}

/// Parse the nine mesh boxes.
pub fn read_mesh(page: &Page) -> Result<MeshSpec, ControlError> {
    let [nx, ny, nz, cx, cy, cz, px, py, pz] = MESH_BOXES;
    Ok(MeshSpec {
        cells: [count(page, nx)?, count(page, ny)?, count(page, nz)?],
        cell_size: [
            page.float_value(cx)? * NM,
            page.float_value(cy)? * NM,
            page.float_value(cz)? * NM,
        ],
        pbc: [count(page, px)?, count(page, py)?, count(page, pz)?],
    })
}

fn count(page: &Page, id: &str) -> Result<usize, ControlError> {
    let v = page.int_value(id)?;
    usize::try_from(v).map_err(|_| ControlError::BadField {
        id: id.to_owned(),
        reason: format!("{v} is negative"),
    })
}

/// Apply the mesh in the page boxes and wait for it to take effect.
///
/// The confirm button is disabled first. The solver call runs inside a
/// busy bracket on the simulation thread, so concurrent refreshes skip
/// instead of queuing behind it.
pub fn apply<S: Simulation>(
    page: &Page,
    injector: &Injector<S>,
    busy: &Arc<BusyState>,
) -> Result<MeshSpec, ControlError> {
    page.set_disabled(SETMESH, true);
    let mesh = read_mesh(page)?;
    mesh.validate()?;

    let busy = Arc::clone(busy);
    let requested = mesh.clone();
    injector.call("setmesh", move |sim: &mut S| {
        let _busy = busy.enter();
        sim.set_mesh(&requested)
    })??;

    tracing::info!(cells = ?mesh.cells, cell_size = ?mesh.cell_size, pbc = ?mesh.pbc, "mesh updated");
    page.set(SETMESH_WARN, MESH_OK);
    Ok(mesh)
}
