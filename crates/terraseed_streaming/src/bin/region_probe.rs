//! # Region Probe
//!
//! Debug surface for one shareable link: builds the region, prints an
//! artifact summary and a determinism record, and optionally exercises the
//! cache with a neighbour preload.
//!
//! ## Usage
//!
//! ```bash
//! region_probe --link v2:12345:50,50,50,50,50,50,50,50,50,50 --map --preload
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use terraseed_procedural::{
    ContentHash, DeterminismVerifier, GeneratorConfig, RegionCoord, ShareLink, Synthesizer,
    TerrainType, WorldArtifact,
};
use terraseed_streaming::{
    CacheConfig, InMemoryRegistry, NeighborPreloader, PreloadOutcome, RegionCache, RegionParams,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_LINK: &str = "v2:12345:50,50,50,50,50,50,50,50,50,50";

struct ProbeArgs {
    link: String,
    region: RegionCoord,
    expected: Option<ContentHash>,
    config_path: Option<String>,
    size: Option<usize>,
    runs: Option<u32>,
    show_map: bool,
    preload: bool,
}

impl Default for ProbeArgs {
    fn default() -> Self {
        Self {
            link: DEFAULT_LINK.to_string(),
            region: RegionCoord::new(0, 0),
            expected: None,
            config_path: None,
            size: None,
            runs: None,
            show_map: false,
            preload: false,
        }
    }
}

fn print_usage() {
    println!("Usage: region_probe [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -l, --link <LINK>       Shareable link (default: {DEFAULT_LINK})");
    println!("  -r, --region <X,Y>      Region coordinate (default: 0,0)");
    println!("  -s, --size <N>          Grid size, overrides config (default: 64)");
    println!("  -n, --runs <N>          Determinism runs, overrides config (default: 3)");
    println!("  -e, --expect <HASH>     Expected content hash, 8 hex digits");
    println!("  -c, --config <PATH>     Generator config TOML (mapping applies to bare links)");
    println!("  -m, --map               Print the grid");
    println!("  -p, --preload           Build through the cache and preload neighbours");
    println!("  -h, --help              Print this help");
}

/// Parses arguments. Returns `None` when only help was requested.
fn parse_args() -> Option<ProbeArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut probe = ProbeArgs::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--link" | "-l" => {
                if let Some(v) = value {
                    probe.link.clone_from(v);
                    i += 1;
                }
            }
            "--region" | "-r" => {
                if let Some(v) = value {
                    probe.region = parse_region(v).unwrap_or(probe.region);
                    i += 1;
                }
            }
            "--size" | "-s" => {
                if let Some(v) = value {
                    probe.size = v.parse().ok();
                    i += 1;
                }
            }
            "--runs" | "-n" => {
                if let Some(v) = value {
                    probe.runs = v.parse().ok();
                    i += 1;
                }
            }
            "--expect" | "-e" => {
                if let Some(v) = value {
                    probe.expected = ContentHash::from_hex(v);
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if let Some(v) = value {
                    probe.config_path = Some(v.clone());
                    i += 1;
                }
            }
            "--map" | "-m" => probe.show_map = true,
            "--preload" | "-p" => probe.preload = true,
            "--help" | "-h" => {
                print_usage();
                return None;
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    Some(probe)
}

fn parse_region(text: &str) -> Option<RegionCoord> {
    let (x, y) = text.split_once(',')?;
    Some(RegionCoord::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

const fn glyph(kind: TerrainType, has_river: bool) -> char {
    match kind {
        TerrainType::Water if has_river => '=',
        TerrainType::Water => '~',
        TerrainType::Ground => '.',
        TerrainType::Forest => 'T',
        TerrainType::Mountain => '^',
        TerrainType::Path => '#',
        TerrainType::Bridge => 'H',
        TerrainType::Sand => ':',
        TerrainType::Rock => '%',
        TerrainType::Snow => '*',
    }
}

/// Space-separated hex hashes.
fn join_hashes(hashes: &[ContentHash]) -> String {
    hashes.iter().map(|h| h.to_hex()).collect::<Vec<_>>().join(" ")
}

fn print_summary(artifact: &WorldArtifact) {
    let size = artifact.grid_size();
    let total = (size * size) as f64;

    println!("Key:          {}", artifact.key());
    println!("Link:         {}", ShareLink::from_key(artifact.key()));
    println!("Content hash: {}", artifact.content_hash());
    println!(
        "Archetype:    {}",
        artifact.archetype().map_or_else(|| "none (v1)".to_string(), |a| a.to_string())
    );
    println!("Grid:         {size}x{size}");
    println!();
    println!("Terrain:");
    for kind in TerrainType::ALL {
        let count = artifact.count(kind);
        if count > 0 {
            let share = count as f64 / total * 100.0;
            println!("  {:<9} {:>6}  {:>5.1}%", format!("{kind:?}"), count, share);
        }
    }
    let rivers = artifact.cells().iter().filter(|cell| cell.has_river).count();
    println!("  river     {rivers:>6}");
    println!();

    let object = artifact.planted_object();
    println!("Object:       {:?} at ({}, {})", object.kind, object.position.x, object.position.y);
    println!("Spawn:        ({}, {})", artifact.spawn_point().x, artifact.spawn_point().y);
    println!("Landmarks:    {}", artifact.landmarks().len());
    println!("Anomalies:    {}", artifact.anomalies());
}

fn print_map(artifact: &WorldArtifact) {
    let size = artifact.grid_size();
    let object = artifact.planted_object().position;
    let spawn = artifact.spawn_point();

    let mut rows: Vec<Vec<char>> = (0..size)
        .map(|y| {
            artifact
                .row(y)
                .map(|row| row.iter().map(|cell| glyph(cell.kind, cell.has_river)).collect())
                .unwrap_or_default()
        })
        .collect();

    let mut mark = |x: u32, y: u32, c: char| {
        if let Some(slot) = rows.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
            *slot = c;
        }
    };
    for landmark in artifact.landmarks() {
        mark(landmark.x, landmark.y, '!');
    }
    mark(object.x, object.y, 'O');
    mark(spawn.x, spawn.y, '@');

    println!();
    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
}

async fn run_preload(artifact_link: &ShareLink, region: RegionCoord, synth: Synthesizer) {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.claim_around(region, 1, RegionParams::from_link(artifact_link));

    let cache = RegionCache::new(synth, CacheConfig::default());
    let mut preloader = NeighborPreloader::new(cache.clone(), registry);

    match preloader.enter_region(region).await {
        Ok(Some(artifact)) => println!("Entered {} hash={}", region, artifact.content_hash()),
        Ok(None) => println!("Region {region} is unclaimed"),
        Err(err) => {
            println!("Entering {region} failed: {err}");
            return;
        }
    }

    if let Some(handle) = preloader.take_preload() {
        for outcome in handle.join().await {
            match outcome {
                PreloadOutcome::Ready(key) => {
                    let hash = cache
                        .get(&key)
                        .map(|a| a.content_hash().to_hex())
                        .unwrap_or_default();
                    println!("  preloaded {} hash={hash}", key.region());
                }
                other => println!("  skipped {other:?}"),
            }
        }
    }

    let stats = cache.stats();
    println!();
    println!("Cache:");
    println!("  resident  {} entries, {} bytes", stats.resident_entries, stats.resident_bytes);
    println!("  hits      {}", stats.hits);
    println!("  misses    {}", stats.misses);
    println!(
        "  builds    {} started, {} completed, {} failed",
        stats.builds_started, stats.builds_completed, stats.builds_failed
    );
    println!("  evictions {}", stats.evictions);
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .init();

    let Some(args) = parse_args() else {
        return ExitCode::SUCCESS;
    };

    let mut config = match &args.config_path {
        Some(path) => match GeneratorConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => GeneratorConfig::default(),
    };
    if let Some(size) = args.size {
        config.grid_size = size;
    }
    if let Some(runs) = args.runs {
        config.verification_runs = runs;
    }
    let config = config.normalized();

    let link = config.open_link(&args.link);
    let key = link.key_at(args.region);
    let synth = Synthesizer::from_config(&config);

    let artifact = synth.build(&key);
    print_summary(&artifact);
    if args.show_map {
        print_map(&artifact);
    }

    let record = DeterminismVerifier::from_config(&config).verify(&key, args.expected);
    println!();
    println!("Determinism:");
    println!("  valid     {}", record.is_valid);
    println!("  break     {}", record.break_kind);
    println!(
        "  expected  {}",
        record.expected_hash.map_or_else(|| "-".to_string(), ContentHash::to_hex)
    );
    println!("  actual    {}", record.actual_hash);
    println!(
        "  runs      {}",
        join_hashes(&record.run_hashes)
    );

    if args.preload {
        println!();
        run_preload(&link, args.region, synth).await;
    }

    if record.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
