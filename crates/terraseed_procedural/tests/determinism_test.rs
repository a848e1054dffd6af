//! # Determinism Integration Test
//!
//! Proves that a world is a pure function of its key: repeated builds,
//! builds on other threads and builds after an encode/decode cycle all
//! land on the same content hash.

use std::collections::HashSet;
use std::thread;

use terraseed_procedural::mapping::{map_v1, KnobV1, MICRO_VAR_RANGE, V1_TABLE};
use terraseed_procedural::{
    map, Archetype, ArtifactCodec, BreakKind, DeterminismVerifier, GenerationKey, MacroVars,
    MappedParameters, MappingVersion, RegionCoord, ShareLink, Synthesizer, TerrainType,
};

fn reference_key(mapping: MappingVersion) -> GenerationKey {
    GenerationKey::with_mapping(RegionCoord::new(0, 0), 12345, MacroVars::uniform(50), mapping)
}

/// Test: the reference world, built five times, hashes identically.
#[test]
fn test_reference_world_is_stable() {
    let key = reference_key(MappingVersion::V1);

    let params = map_v1(key.vars());
    assert!((params.water_level - 0.325).abs() < 1e-12);
    assert!((params.knob(KnobV1::WaterLevel) - 0.325).abs() < 1e-12);

    let synth = Synthesizer::new(64);
    let hashes: HashSet<_> = (0..5).map(|_| synth.build(&key).content_hash()).collect();
    assert_eq!(hashes.len(), 1, "five builds produced {hashes:?}");
}

/// Test: moving any single var by one step changes the world.
#[test]
fn test_single_var_change_changes_hash() {
    let synth = Synthesizer::new(64);
    let base_key = reference_key(MappingVersion::V1);
    let base = synth.build(&base_key).content_hash();

    // Vars that feed terrain directly; a one-step change must show up.
    for index in [3, 4, 5, 6, 8] {
        let vars = base_key.vars().with(index, 51);
        let key = GenerationKey::with_mapping(base_key.region(), 12345, vars, MappingVersion::V1);
        assert_ne!(synth.build(&key).content_hash(), base, "var {index} had no effect");
    }
}

/// Test: a one-unit step in any var moves at least one V1 knob.
#[test]
fn test_every_var_step_moves_a_v1_knob() {
    let base_vars = MacroVars::uniform(50);
    let base = map_v1(&base_vars);

    for index in 0..10 {
        let stepped = map_v1(&base_vars.with(index, 51));
        assert_ne!(stepped, base, "var {index} changed no V1 knob");

        let moved = V1_TABLE
            .iter()
            .filter(|range| stepped.knob(range.knob) != base.knob(range.knob))
            .count();
        assert_eq!(moved, 1, "var {index} moved {moved} knobs");

        let wrapped = map(MappingVersion::V1, 12345, &base_vars.with(index, 51));
        assert_ne!(wrapped, map(MappingVersion::V1, 12345, &base_vars));
    }
}

/// Test: threads racing on the same key agree.
#[test]
fn test_parallel_builds_agree() {
    let key = reference_key(MappingVersion::V2);
    let expected = Synthesizer::new(64).build(&key).content_hash();

    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(move || Synthesizer::new(64).build(&key).content_hash()))
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

/// Test: the verifier sees no break on a clean build and flags drift.
#[test]
fn test_verifier_on_reference_world() {
    let key = reference_key(MappingVersion::V2);
    let verifier = DeterminismVerifier::new(Synthesizer::new(64), 5);
    let clean = verifier.verify(&key, None);
    assert!(clean.is_valid);
    assert_eq!(clean.run_hashes.len(), 5);

    let v1_hash = Synthesizer::new(64).build(&reference_key(MappingVersion::V1)).content_hash();
    let drifted = verifier.verify(&key, Some(v1_hash));
    assert_eq!(drifted.break_kind, BreakKind::VersionDrift);
}

/// Test: a shared link reopens the same world.
#[test]
fn test_link_reopens_world() {
    let key = reference_key(MappingVersion::V2);
    let synth = Synthesizer::new(48);
    let original = synth.build(&key);

    let link = ShareLink::from_key(&key).encode();
    assert_eq!(link, "v2:12345:50,50,50,50,50,50,50,50,50,50");

    let reopened = ShareLink::decode(&link).key_at(key.region());
    assert_eq!(synth.build(&reopened).content_hash(), original.content_hash());
}

/// Test: a shipped artifact decodes to the same hash.
#[test]
fn test_codec_preserves_hash() {
    let synth = Synthesizer::new(64);
    for seed in [1_i64, -5, 12345, i64::MAX] {
        let key = GenerationKey::new(RegionCoord::new(3, -1), seed, MacroVars::uniform(65));
        let artifact = synth.build(&key);
        let decoded = ArtifactCodec::decode(&ArtifactCodec::encode(&artifact)).unwrap();
        assert_eq!(decoded.content_hash(), artifact.content_hash());
        assert_eq!(decoded.count(TerrainType::Water), artifact.count(TerrainType::Water));
    }
}

/// Test: every archetype shows up across a spread of seeds.
#[test]
fn test_archetypes_are_reachable() {
    let mut seen = HashSet::new();
    for seed in 0..400 {
        if let MappedParameters::V2(p) = map(MappingVersion::V2, seed, &MacroVars::default()) {
            seen.insert(p.archetype);
            for micro in p.micro_vars {
                assert!(micro.abs() <= MICRO_VAR_RANGE);
            }
        }
    }
    for archetype in Archetype::ALL {
        assert!(seen.contains(&archetype), "{archetype} never selected");
    }
}
