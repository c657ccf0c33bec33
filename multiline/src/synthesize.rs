//! Fills the primary master layers from the tagged path groups.

use glyphs_model::Glyph;
use log::debug;
use smol_str::SmolStr;

use crate::{
    duplicate::Duplication, error::Error, metrics::MetricsTarget, profile::StrokeProfile,
};

/// Rebuild the layer of each master in `master_ids` from the matching
/// profile row, then reconcile its metrics.
///
/// Every layer must exist before anything is cleared.
pub fn synthesize_masters(
    glyph: &mut Glyph,
    master_ids: &[SmolStr],
    profile: &StrokeProfile,
    duplication: &Duplication,
    metrics: &MetricsTarget,
) -> Result<(), Error> {
    if let Some(missing) = master_ids
        .iter()
        .find(|id| glyph.master_layer(id).is_none())
    {
        return Err(Error::MissingMasterLayer {
            glyph: glyph.name.clone(),
            master: missing.clone(),
        });
    }

    for (master_id, row) in master_ids.iter().zip(profile.masters()) {
        let name = glyph.name.clone();
        let Some(layer) = glyph.master_layer_mut(master_id) else {
            continue;
        };
        layer.clear();
        layer
            .shapes
            .extend(row.paths(duplication).iter().map(|tagged| row.apply(tagged)));
        metrics.reconcile(layer);
        debug!(
            "{name} {master_id}: {} paths, lsb {:.1} rsb {:.1}",
            layer.shapes.len(),
            layer.lsb(),
            layer.rsb()
        );
    }
    Ok(())
}
