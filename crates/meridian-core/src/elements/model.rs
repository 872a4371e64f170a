//! The element list and the grouping engine that keeps it in step with a
//! sequential model.

use meridian_geometry::Transform;
use meridian_materials::same_medium;
use serde::{Deserialize, Serialize};

use super::{
    transform_at, AirGap, DummyInterface, Element, ElementError, ElementKind, Lens, Mirror,
    ThinElement,
};
use crate::sequential::{RefractMode, SequentialModel};

/// Interface the transforms are computed relative to: the first real
/// surface, so a distant object does not swamp the lens coordinates.
const GLOBAL_REFERENCE: usize = 1;

const IMAGE_LABEL: &str = "Image";

/// Per-variant 1-based numbering for generated labels.
#[derive(Default)]
struct LabelCounters {
    lens: usize,
    mirror: usize,
    thin: usize,
}

impl LabelCounters {
    fn next(&mut self, kind: ElementKind) -> String {
        let n = match kind {
            ElementKind::Lens => &mut self.lens,
            ElementKind::Mirror => &mut self.mirror,
            ElementKind::Thin => &mut self.thin,
            ElementKind::Dummy | ElementKind::AirGap => {
                unreachable!("{} labels are not numbered per variant", kind)
            }
        };
        *n += 1;
        kind.default_label(*n)
    }
}

/// The ordered list of elements grouping a sequential model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementModel {
    pub elements: Vec<Element>,
}

impl ElementModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.elements.clear();
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn add_element(&mut self, e: impl Into<Element>) {
        self.elements.push(e.into());
    }

    /// Group a sequential model into elements. Does nothing if the list is
    /// already populated.
    pub fn elements_from_sequence(&mut self, seq: &SequentialModel) {
        if !self.elements.is_empty() {
            return;
        }

        let tfrms = seq.compute_global_coords(GLOBAL_REFERENCE);
        let mut counters = LabelCounters::default();
        for (i, g) in seq.gaps().iter().enumerate() {
            let tfrm = transform_at(&tfrms, i);
            if g.is_air() {
                self.process_airgap(seq, i, tfrm, &mut counters, true);
                continue;
            }

            let Some(s1) = seq.interface(i) else { continue };
            if s1.refract_mode == RefractMode::Reflect && i > 0 {
                let buried = seq
                    .gap(i - 1)
                    .is_some_and(|gp| same_medium(&gp.medium, &g.medium));
                if buried {
                    if let Some(Element::Lens(lens)) = self.elements.last_mut() {
                        lens.absorb_buried(seq, i);
                        continue;
                    }
                }
            }

            let sd = seq
                .interface(i + 1)
                .map_or(s1.surface_od(), |s2| s1.surface_od().max(s2.surface_od()));
            let mut lens = Lens::from_sequence(seq, i, sd, tfrm);
            lens.label = counters.next(ElementKind::Lens);
            self.add_element(lens);
        }

        self.add_dummy_interface_at_image(seq, &tfrms);
        self.relabel_airgaps();
        log::debug!(
            "Grouped {} interfaces into {} elements",
            seq.interface_count(),
            self.elements.len()
        );
    }

    /// Emit the entities for air gap `i`: optionally an element for the
    /// interface leading it, then always the air gap itself.
    fn process_airgap(
        &mut self,
        seq: &SequentialModel,
        i: usize,
        tfrm: Transform,
        counters: &mut LabelCounters,
        add_ele: bool,
    ) {
        let Some(s) = seq.interface(i) else { return };

        if i == 0 {
            self.add_dummy_once(seq, i, "Object", tfrm.clone());
        } else if s.is_thin_lens() {
            if add_ele {
                let mut te = ThinElement::from_sequence(seq, i, s.surface_od(), tfrm.clone());
                te.label = counters.next(ElementKind::Thin);
                self.add_element(te);
            }
        } else if s.refract_mode == RefractMode::Reflect {
            if add_ele {
                let mut m =
                    Mirror::from_sequence(seq, i, s.surface_od(), seq.z_dir(i), tfrm.clone());
                m.label = counters.next(ElementKind::Mirror);
                self.add_element(m);
            }
        } else if seq.gap(i - 1).is_some_and(|gp| gp.is_air()) {
            // Air on both sides; curved surfaces land here too.
            let label = if seq.stop_surface() == Some(i) {
                "Aperture Stop".to_string()
            } else {
                ElementKind::Dummy.default_label(i)
            };
            self.add_dummy_once(seq, i, label, tfrm.clone());
        }

        self.add_element(AirGap::from_sequence(seq, i, tfrm));
    }

    fn add_dummy_once(
        &mut self,
        seq: &SequentialModel,
        i: usize,
        label: impl Into<String>,
        tfrm: Transform,
    ) {
        let exists = self
            .elements
            .iter()
            .any(|e| matches!(e, Element::Dummy(d) if d.idx == i));
        if exists {
            return;
        }
        let sd = seq.interface(i).map_or(1.0, |s| s.surface_od());
        self.add_element(DummyInterface::from_sequence(seq, i, label, sd, tfrm));
    }

    /// Backfill the air gaps and dummy planes missing from a grouping saved
    /// before they existed. Does nothing if any air gap is present.
    ///
    /// Returns the number of entities added.
    pub fn airgaps_from_sequence(&mut self, seq: &SequentialModel, tfrms: &[Transform]) -> usize {
        if self.elements.iter().any(|e| matches!(e, Element::AirGap(_))) {
            return 0;
        }

        let before = self.elements.len();
        let mut counters = LabelCounters::default();
        for (i, g) in seq.gaps().iter().enumerate() {
            if g.is_air() {
                self.process_airgap(seq, i, transform_at(tfrms, i), &mut counters, false);
            }
        }
        let added = self.elements.len() - before;
        log::debug!("Backfilled {} air gap and dummy entities", added);
        added
    }

    /// Add the image-plane dummy unless a dummy already sits on the last
    /// interface.
    pub fn add_dummy_interface_at_image(&mut self, seq: &SequentialModel, tfrms: &[Transform]) {
        let Some(idx) = seq.interface_count().checked_sub(1) else {
            return;
        };
        self.add_dummy_once(seq, idx, IMAGE_LABEL, transform_at(tfrms, idx));
    }

    /// Attach a freshly loaded element list to the live model.
    ///
    /// Older lists are upgraded first, then every stored index is resolved,
    /// the list is put in sequence order and air gaps are relabelled.
    /// Running it twice gives the same list.
    pub fn sync_to_restore(&mut self, seq: &SequentialModel) -> Result<(), ElementError> {
        let tfrms = seq.compute_global_coords(GLOBAL_REFERENCE);

        self.airgaps_from_sequence(seq, &tfrms);
        self.add_dummy_interface_at_image(seq, &tfrms);

        for (i, e) in self.elements.iter_mut().enumerate() {
            if e.label().is_empty() {
                e.set_label(e.kind().default_label(i + 1));
            }
            e.sync_to_restore(seq, &tfrms)?;
        }
        self.sequence_elements(seq);
        self.relabel_airgaps();
        Ok(())
    }

    /// Refresh every element after an edit of the sequential model.
    ///
    /// Elements whose interfaces or gaps have gone are left as they were;
    /// each one is logged and returned.
    pub fn update_model(&mut self, seq: &SequentialModel) -> Vec<ElementError> {
        let tfrms = seq.compute_global_coords(GLOBAL_REFERENCE);
        let mut errors = Vec::new();
        for e in &mut self.elements {
            let refreshed = e
                .sync_to_update(seq)
                .and_then(|()| e.update_size(seq).map(|_| ()));
            if let Err(err) = refreshed {
                log::warn!("{}", err);
                errors.push(err);
                continue;
            }
            if let Some(i) = e.reference_interface().and_then(|id| seq.interface_index(id)) {
                e.set_transform(transform_at(&tfrms, i));
            }
        }
        errors
    }

    /// Sort elements by the current position of their reference interface.
    ///
    /// The sort is stable, so an element keeps its place ahead of the air
    /// gap that shares its reference interface.
    pub fn sequence_elements(&mut self, seq: &SequentialModel) {
        self.elements.sort_by_key(|e| {
            e.reference_interface()
                .and_then(|id| seq.interface_index(id))
                .unwrap_or_else(|| e.reference_index())
        });
    }

    /// Name every air gap after its neighbours: "AirGap {prev}-{next}".
    pub fn relabel_airgaps(&mut self) {
        for i in 0..self.elements.len() {
            if self.elements[i].kind() != ElementKind::AirGap {
                continue;
            }
            let prev = i
                .checked_sub(1)
                .and_then(|j| self.elements.get(j))
                .map_or("", Element::label);
            let next = self.elements.get(i + 1).map_or("", Element::label);
            let label = format!("AirGap {}-{}", prev, next);
            self.elements[i].set_label(label);
        }
    }

    /// One line per element: index, label, kind and description.
    pub fn list_elements(&self, seq: &SequentialModel) -> String {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}: {} ({}): {}", i, e.label(), e.kind(), e.describe(seq)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
