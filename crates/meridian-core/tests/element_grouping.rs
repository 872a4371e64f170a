//! Integration tests for the element grouping engine.
//!
//! - Coverage and ordering of a freshly grouped model
//! - Buried mirror and front-surface mirror classification
//! - JSON persistence and idempotent restore
//! - Legacy upgrade (air gap backfill)
//! - Refresh after structural edits (shifted indices, dangling references)
//! - Compound element editing (bending, thickness, edge flats)

use std::collections::BTreeMap;
use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};

use meridian_core::elements::{
    create_lens, create_mirror, Element, ElementError, ElementKind, ElementModel, MirrorShape,
};
use meridian_core::sequential::{Gap, Interface, RefractMode, SequentialModel};
use meridian_geometry::Profile;
use meridian_materials::{Medium, ModelGlass};

// ─────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────

fn glass(name: &str) -> Arc<dyn Medium> {
    Arc::new(ModelGlass::new(name, 1.6204, 60.31))
}

/// A Cooke-style triplet with a stop plane behind the first element.
///
/// Interfaces: 0 object, 1-2 first lens, 3 stop, 4-5 second lens,
/// 6-7 third lens, 8 image.
fn triplet() -> SequentialModel {
    let mut seq = SequentialModel::new();
    seq.gap_mut(0).unwrap().thi = 1.0e10;
    let sk16 = glass("SK16");
    let f4: Arc<dyn Medium> = Arc::new(ModelGlass::new("F4", 1.6165, 36.63));

    let surfaces = [
        (Interface::new(Profile::spherical(0.0445)).with_aperture(10.0), Gap::new(2.0, sk16.clone())),
        (Interface::new(Profile::spherical(0.0)).with_aperture(10.0), Gap::air(5.0)),
        (Interface::plane().with_aperture(6.0), Gap::air(1.5)),
        (Interface::new(Profile::spherical(-0.0457)).with_aperture(7.0), Gap::new(1.0, f4)),
        (Interface::new(Profile::spherical(0.0502)).with_aperture(7.0), Gap::air(5.0)),
        (Interface::new(Profile::spherical(0.0102)).with_aperture(9.0), Gap::new(2.0, sk16)),
        (Interface::new(Profile::spherical(-0.0513)).with_aperture(9.0), Gap::air(42.0)),
    ];
    for (ifc, gap) in surfaces {
        seq.add_surface(ifc, gap).unwrap();
    }
    seq.set_stop_surface(Some(3)).unwrap();
    seq
}

/// A Mangin mirror: glass with a silvered back face.
fn mangin() -> SequentialModel {
    let bk7 = glass("N-BK7");
    let mut seq = SequentialModel::new();
    seq.gap_mut(0).unwrap().thi = 1.0e10;
    seq.add_surface(
        Interface::new(Profile::spherical(-0.01)).with_aperture(20.0),
        Gap::new(5.0, bk7.clone()),
    )
    .unwrap();
    seq.add_surface(
        Interface::new(Profile::spherical(-0.008))
            .with_mode(RefractMode::Reflect)
            .with_aperture(21.0),
        Gap::new(-5.0, bk7),
    )
    .unwrap();
    seq.add_surface(
        Interface::new(Profile::spherical(-0.01)).with_aperture(20.0),
        Gap::air(-60.0),
    )
    .unwrap();
    seq
}

fn grouped(seq: &SequentialModel) -> ElementModel {
    let mut em = ElementModel::new();
    em.elements_from_sequence(seq);
    em
}

type Summary = (ElementKind, String, usize, Option<f64>, Option<(f64, f64)>);

/// (kind, label, reference index, sd, edge extent) for every element.
fn summary(em: &ElementModel) -> Vec<Summary> {
    em.elements
        .iter()
        .map(|e| {
            (
                e.kind(),
                e.label().to_string(),
                e.reference_index(),
                e.sd(),
                e.edge_extent(),
            )
        })
        .collect()
}

fn count_references(em: &ElementModel) -> (BTreeMap<usize, usize>, BTreeMap<usize, usize>) {
    let mut ifcs = BTreeMap::new();
    let mut gaps = BTreeMap::new();
    for e in &em.elements {
        for i in e.interface_indices() {
            *ifcs.entry(i).or_insert(0) += 1;
        }
        for g in e.gap_indices() {
            *gaps.entry(g).or_insert(0) += 1;
        }
    }
    (ifcs, gaps)
}

// ─────────────────────────────────────────────────────────────
// Grouping
// ─────────────────────────────────────────────────────────────

#[test]
fn test_every_interface_and_gap_covered_once() {
    let seq = triplet();
    let em = grouped(&seq);
    let (ifcs, gaps) = count_references(&em);

    assert_eq!(ifcs.keys().copied().collect::<Vec<_>>(), (0..seq.interface_count()).collect::<Vec<_>>());
    assert!(ifcs.values().all(|&n| n == 1), "interface counts: {:?}", ifcs);
    assert_eq!(gaps.keys().copied().collect::<Vec<_>>(), (0..seq.gaps().len()).collect::<Vec<_>>());
    assert!(gaps.values().all(|&n| n == 1), "gap counts: {:?}", gaps);
}

#[test]
fn test_elements_follow_physical_order() {
    let seq = triplet();
    let em = grouped(&seq);
    let refs: Vec<usize> = em.elements.iter().map(Element::reference_index).collect();
    assert!(refs.windows(2).all(|w| w[0] <= w[1]), "out of order: {:?}", refs);

    let kinds: Vec<ElementKind> = em.elements.iter().map(Element::kind).collect();
    use ElementKind::*;
    assert_eq!(
        kinds,
        [Dummy, AirGap, Lens, AirGap, Dummy, AirGap, Lens, AirGap, Lens, AirGap, Dummy]
    );
}

#[test]
fn test_air_gaps_interleave_with_neighbour_labels() {
    let em = grouped(&triplet());
    let labels: Vec<&str> = em.elements.iter().map(Element::label).collect();
    assert_eq!(
        labels,
        [
            "Object",
            "AirGap Object-E1",
            "E1",
            "AirGap E1-Aperture Stop",
            "Aperture Stop",
            "AirGap Aperture Stop-E2",
            "E2",
            "AirGap E2-E3",
            "E3",
            "AirGap E3-Image",
            "Image",
        ]
    );
}

#[test]
fn test_grouping_twice_is_a_no_op() {
    let seq = triplet();
    let mut em = grouped(&seq);
    let before = summary(&em);
    em.elements_from_sequence(&seq);
    assert_eq!(summary(&em), before);
}

#[test]
fn test_lens_sd_is_larger_face_aperture() {
    let seq = triplet();
    let em = grouped(&seq);
    let e2 = em.elements.iter().find(|e| e.label() == "E2").unwrap();
    assert_relative_eq!(e2.sd().unwrap(), 7.0);
}

#[test]
fn test_buried_mirror_extends_lens_span() {
    let seq = mangin();
    let em = grouped(&seq);

    let lenses: Vec<_> = em
        .elements
        .iter()
        .filter_map(|e| match e {
            Element::Lens(l) => Some(l),
            _ => None,
        })
        .collect();
    assert_eq!(lenses.len(), 1);
    let lens = lenses[0];
    assert_eq!((lens.s1_indx, lens.s2_indx), (1, 3));
    assert_eq!(lens.buried_indices, vec![2]);
    assert_eq!(lens.gap_indices, vec![1, 2]);
    assert!(em.elements.iter().all(|e| e.kind() != ElementKind::Mirror));

    let (ifcs, gaps) = count_references(&em);
    assert!(ifcs.values().all(|&n| n == 1));
    assert_eq!(ifcs.len(), seq.interface_count());
    assert_eq!(gaps.len(), seq.gaps().len());

    // Signed gap thicknesses cancel across the reflection.
    assert_abs_diff_eq!(lens.thickness(&seq).unwrap(), 0.0, epsilon = 1e-12);
}

#[test]
fn test_buried_mirror_medium_names_compare_loosely() {
    let mut seq = SequentialModel::new();
    seq.add_surface(Interface::new(Profile::spherical(0.01)), Gap::new(5.0, glass("N-BK7")))
        .unwrap();
    seq.add_surface(
        Interface::plane().with_mode(RefractMode::Reflect),
        Gap::new(-5.0, glass(" n-bk7 ")),
    )
    .unwrap();
    seq.add_surface(Interface::new(Profile::spherical(0.01)), Gap::air(-20.0))
        .unwrap();

    let em = grouped(&seq);
    let n_lenses = em.elements.iter().filter(|e| e.kind() == ElementKind::Lens).count();
    assert_eq!(n_lenses, 1);
}

#[test]
fn test_front_surface_mirror_reverses_direction() {
    let mut seq = SequentialModel::new();
    seq.gap_mut(0).unwrap().thi = 1.0e10;
    seq.add_surface(
        Interface::new(Profile::conic(-0.005, -1.0))
            .with_mode(RefractMode::Reflect)
            .with_aperture(50.0),
        Gap::air(-100.0),
    )
    .unwrap();

    let em = grouped(&seq);
    let Some(Element::Mirror(m)) = em.elements.iter().find(|e| e.kind() == ElementKind::Mirror) else {
        panic!("no mirror in {:?}", summary(&em));
    };
    assert_eq!(m.label, "M1");
    assert_eq!(m.z_dir, -1.0);
    assert_relative_eq!(m.get_thi(), 2.5);
}

#[test]
fn test_secondary_mirror_follows_second_reflection() {
    let mut seq = SequentialModel::new();
    seq.gap_mut(0).unwrap().thi = 1.0e10;
    seq.add_surface(
        Interface::new(Profile::spherical(-0.005))
            .with_mode(RefractMode::Reflect)
            .with_aperture(50.0),
        Gap::air(-80.0),
    )
    .unwrap();
    let mut em = grouped(&seq);

    let (secondary, me) = create_mirror(&MirrorShape::default(), 10.0);
    seq.insert_surface_and_gap(2, secondary, Gap::air(100.0)).unwrap();
    em.add_element(me);
    assert!(em.update_model(&seq).is_empty());

    let dirs: Vec<(usize, f64)> = em
        .elements
        .iter()
        .filter_map(|e| match e {
            Element::Mirror(m) => Some((m.s_indx, m.z_dir)),
            _ => None,
        })
        .collect();
    assert_eq!(dirs, [(1, -1.0), (2, 1.0)]);
    assert_eq!(seq.z_dir(2), 1.0);

    // The substrate sits behind the secondary, on the +z side.
    let outline = em.elements.last().unwrap().shape(&seq).unwrap();
    let max_z = outline.points.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
    assert_abs_diff_eq!(max_z, 0.5, epsilon = 1e-12);
}

// ─────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────

#[test]
fn test_json_round_trip_restores_grouping() {
    let seq = triplet();
    let em = grouped(&seq);
    let json = serde_json::to_string_pretty(&em).unwrap();

    let mut restored: ElementModel = serde_json::from_str(&json).unwrap();
    restored.sync_to_restore(&seq).unwrap();
    assert_eq!(summary(&restored), summary(&em));
    assert_eq!(restored.elements[2].sd(), Some(10.0));
    assert_eq!(restored.elements[2].edge_extent(), Some((-10.0, 10.0)));

    // Restored elements are live again.
    assert!(restored.update_model(&seq).is_empty());
}

#[test]
fn test_restore_is_idempotent() {
    let seq = triplet();
    let json = serde_json::to_string(&grouped(&seq)).unwrap();
    let mut em: ElementModel = serde_json::from_str(&json).unwrap();

    em.sync_to_restore(&seq).unwrap();
    assert!(em.update_model(&seq).is_empty());
    let once = summary(&em);
    em.sync_to_restore(&seq).unwrap();
    assert!(em.update_model(&seq).is_empty());
    assert_eq!(summary(&em), once);
}

#[test]
fn test_restore_assigns_default_labels() {
    let seq = triplet();
    let mut json: serde_json::Value = serde_json::to_value(grouped(&seq)).unwrap();
    json["elements"][2].as_object_mut().unwrap().remove("label");

    let mut em: ElementModel = serde_json::from_value(json).unwrap();
    em.sync_to_restore(&seq).unwrap();
    assert_eq!(em.elements[2].label(), "E3");
}

#[test]
fn test_restore_rejects_index_past_end() {
    let seq = triplet();
    let json = serde_json::to_string(&grouped(&seq)).unwrap();
    let mut em: ElementModel = serde_json::from_str(&json).unwrap();

    let short = SequentialModel::new();
    let err = em.sync_to_restore(&short).unwrap_err();
    assert!(matches!(err, ElementError::RestoreIndexOutOfRange { .. }));
}

// ─────────────────────────────────────────────────────────────
// Legacy upgrade
// ─────────────────────────────────────────────────────────────

#[test]
fn test_legacy_model_backfills_air_gaps_and_dummies() {
    let seq = triplet();
    let full = grouped(&seq);
    let mut legacy = full.clone();
    legacy.elements.retain(|e| e.kind() == ElementKind::Lens);
    assert_eq!(legacy.num_elements(), 3);

    let tfrms = seq.compute_global_coords(1);
    // Object + 5 air gaps + the stop plane.
    assert_eq!(legacy.airgaps_from_sequence(&seq, &tfrms), 7);
    assert_eq!(legacy.airgaps_from_sequence(&seq, &tfrms), 0);

    legacy.sync_to_restore(&seq).unwrap();
    assert_eq!(summary(&legacy), summary(&full));
}

#[test]
fn test_legacy_model_keeps_single_image_dummy() {
    let mut seq = SequentialModel::new();
    seq.add_surface(Interface::new(Profile::spherical(0.02)), Gap::new(4.0, glass("N-BK7")))
        .unwrap();
    seq.add_surface(Interface::new(Profile::spherical(-0.02)), Gap::air(40.0))
        .unwrap();

    let mut legacy = grouped(&seq);
    legacy
        .elements
        .retain(|e| matches!(e.kind(), ElementKind::Lens) || e.label() == "Image");
    let json = serde_json::to_string(&legacy).unwrap();

    let mut em: ElementModel = serde_json::from_str(&json).unwrap();
    em.sync_to_restore(&seq).unwrap();
    let labels: Vec<&str> = em.elements.iter().map(Element::label).collect();
    assert_eq!(
        labels,
        ["Object", "AirGap Object-E1", "E1", "AirGap E1-Image", "Image"]
    );

    let (ifcs, _) = count_references(&em);
    assert!(ifcs.values().all(|&n| n == 1), "interface counts: {:?}", ifcs);
}

// ─────────────────────────────────────────────────────────────
// Refresh after edits
// ─────────────────────────────────────────────────────────────

#[test]
fn test_inserted_lens_resolves_indices() {
    let mut seq = triplet();
    let mut em = grouped(&seq);

    let ((s1, s2, g), lens) = create_lens(0.01, 0.0, 3.0, 8.0, None);
    seq.insert_surface_and_gap(1, s1, g).unwrap();
    seq.insert_surface_and_gap(2, s2, Gap::air(10.0)).unwrap();
    em.add_element(lens);

    assert!(em.update_model(&seq).is_empty());
    em.sequence_elements(&seq);

    let lenses: Vec<_> = em
        .elements
        .iter()
        .filter_map(|e| match e {
            Element::Lens(l) => Some((l.s1_indx, l.s2_indx, l.gap_indices.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        lenses,
        [(1, 2, vec![1]), (3, 4, vec![3]), (6, 7, vec![6]), (8, 9, vec![8])]
    );

    // The new lens sits at the origin of the global frame.
    let new_lens = em.elements.iter().find(|e| e.reference_index() == 1).unwrap();
    assert_abs_diff_eq!(new_lens.transform().translation.z, 0.0, epsilon = 1e-12);
    let old_first = em.elements.iter().find(|e| e.label() == "E1").unwrap();
    assert_abs_diff_eq!(old_first.transform().translation.z, 13.0, epsilon = 1e-9);
}

#[test]
fn test_removed_interface_reports_dangling_elements() {
    let mut seq = triplet();
    let mut em = grouped(&seq);

    seq.remove_surface_and_gap(3).unwrap();
    let errors = em.update_model(&seq);

    // The stop plane lost its interface and the air gap behind it its gap.
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e, ElementError::StructuralInconsistency { .. })));

    let e2 = em.elements.iter().find(|e| e.label() == "E2").unwrap();
    assert_eq!(e2.reference_index(), 3);
}

#[test]
fn test_update_model_tracks_aperture_changes() {
    let mut seq = triplet();
    let mut em = grouped(&seq);

    seq.interface_mut(5).unwrap().max_aperture = 8.5;
    assert!(em.update_model(&seq).is_empty());
    let e2 = em.elements.iter().find(|e| e.label() == "E2").unwrap();
    assert_relative_eq!(e2.sd().unwrap(), 8.5);
}

// ─────────────────────────────────────────────────────────────
// Compound element editing
// ─────────────────────────────────────────────────────────────

fn first_lens(em: &ElementModel) -> &meridian_core::elements::Lens {
    em.elements
        .iter()
        .find_map(|e| match e {
            Element::Lens(l) => Some(l),
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_equiconvex_lens_has_zero_bending() {
    let mut seq = SequentialModel::new();
    seq.add_surface(Interface::new(Profile::spherical(0.02)), Gap::new(4.0, glass("N-BK7")))
        .unwrap();
    seq.add_surface(Interface::new(Profile::spherical(-0.02)), Gap::air(40.0))
        .unwrap();
    let em = grouped(&seq);
    assert_abs_diff_eq!(first_lens(&em).get_bending(&seq).unwrap(), 0.0, epsilon = 1e-12);
}

#[test]
fn test_equal_curvatures_give_zero_bending() {
    let mut seq = SequentialModel::new();
    seq.add_surface(Interface::new(Profile::spherical(0.02)), Gap::new(4.0, glass("N-BK7")))
        .unwrap();
    seq.add_surface(Interface::new(Profile::spherical(0.02)), Gap::air(40.0))
        .unwrap();
    let em = grouped(&seq);
    let lens = first_lens(&em);
    let bending = lens.get_bending(&seq).unwrap();
    assert!(bending.is_finite());
    assert_eq!(bending, 0.0);

    lens.set_bending(&mut seq, 0.0).unwrap();
    let bending = lens.get_bending(&seq).unwrap();
    assert!(bending.is_finite());
    assert_eq!(bending, 0.0);
}

#[test]
fn test_set_bending_keeps_curvature_difference() {
    let mut seq = triplet();
    let em = grouped(&seq);
    let lens = first_lens(&em).clone();
    let delta = seq.interface(1).unwrap().profile_cv() - seq.interface(2).unwrap().profile_cv();

    lens.set_bending(&mut seq, 1.0).unwrap();
    assert_relative_eq!(lens.get_bending(&seq).unwrap(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(seq.interface(2).unwrap().profile_cv(), 0.0, epsilon = 1e-15);
    let new_delta = seq.interface(1).unwrap().profile_cv() - seq.interface(2).unwrap().profile_cv();
    assert_relative_eq!(new_delta, delta, epsilon = 1e-12);

    lens.set_bending(&mut seq, -0.5).unwrap();
    assert_relative_eq!(lens.get_bending(&seq).unwrap(), -0.5, epsilon = 1e-12);
}

#[test]
fn test_lens_thickness_edit() {
    let mut seq = triplet();
    let em = grouped(&seq);
    let lens = first_lens(&em);
    lens.set_thickness(&mut seq, 3.5).unwrap();
    assert_relative_eq!(seq.gap(1).unwrap().thi, 3.5);
    assert_relative_eq!(lens.thickness(&seq).unwrap(), 3.5);
}

#[test]
fn test_small_rear_face_gets_edge_flat() {
    let mut seq = SequentialModel::new();
    seq.add_surface(
        Interface::new(Profile::spherical(0.02)).with_aperture(10.0),
        Gap::new(4.0, glass("N-BK7")),
    )
    .unwrap();
    seq.add_surface(
        Interface::new(Profile::spherical(0.01)).with_aperture(8.0),
        Gap::air(40.0),
    )
    .unwrap();

    let mut em = grouped(&seq);
    assert!(em.update_model(&seq).is_empty());
    let lens = first_lens(&em);
    assert_eq!(lens.flat1, None);
    assert_eq!(lens.flat2, Some(8.0));

    let outline = em.elements[2].shape(&seq).unwrap();
    assert_eq!(outline.points.first(), outline.points.last());
    let max_y = outline.points.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);
    assert_relative_eq!(max_y, 10.0);
}
