use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use island_generator::error::Result;
use island_generator::export;
use island_generator::falloff::FalloffMetric;
use island_generator::island::IslandGenerator;
use island_generator::noise_map::PerlinNoise;
use island_generator::settings::IslandConfig;
use island_generator::water_bodies::water_body_stats;

#[derive(Parser, Debug)]
#[command(name = "island_generator")]
#[command(about = "Generate a procedural island heightmap and detect its lakes")]
struct Args {
    /// JSON config file (defaults are used for anything it leaves out)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Noise seed. Without a config file a random seed is used; with one, its
    /// `seed` field (0 when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Index into the supported chunk sizes (0-8)
    #[arg(long)]
    chunk_size_index: Option<usize>,

    /// Falloff shape: square or circular
    #[arg(long)]
    falloff_metric: Option<FalloffMetric>,

    /// Disable the island falloff mask
    #[arg(long)]
    no_falloff: bool,

    /// Heights strictly below this are water
    #[arg(long)]
    water_level: Option<f32>,

    /// Minimum lake area in square world units
    #[arg(long)]
    min_lake_size: Option<f32>,

    /// Lake detection sampling stride in cells
    #[arg(long)]
    stride: Option<usize>,

    /// Skip lake detection
    #[arg(long)]
    no_lakes: bool,

    /// Directory for the PNG previews and lakes.json
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write the preview falloff mask
    #[arg(long)]
    export_falloff: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    if let Some(height_map) = &config.height_map {
        println!("Generating island with seed: {}", height_map.noise.seed);
    }
    if let Some(mesh) = &config.mesh {
        println!("Map size: {0}x{0} ({1:.1} world units)", mesh.num_verts_per_line(), mesh.mesh_world_size());
    }

    let generator = IslandGenerator::new(config);
    let island = generator.generate(&PerlinNoise)?;

    println!(
        "Heightmap range: {:.2} to {:.2}",
        island.height_map.min_value(),
        island.height_map.max_value()
    );

    let stats = water_body_stats(&island.water_bodies);
    println!(
        "Found {} lakes ({} sampled cells, {:.1} world units²)",
        stats.lake_count, stats.total_cells, stats.total_area
    );
    for lake in &island.water_bodies {
        println!(
            "  Lake {}: center ({:.1}, {:.1}, {:.1}) size {:.1} x {:.1}{}",
            lake.id,
            lake.center[0],
            lake.center[1],
            lake.center[2],
            lake.size[0],
            lake.size[1],
            if lake.truncated { " (truncated)" } else { "" }
        );
    }
    if let Some(ocean) = island.ocean {
        println!("Ocean plane at height {:.1}, size {:.0}", ocean.height, ocean.size);
    }

    std::fs::create_dir_all(&args.output_dir)?;
    let water_level = generator.config().lakes.water_level;

    let height_path = args.output_dir.join("heightmap.png");
    export::export_height_map(&island.height_map, &height_path)?;
    println!("Saved {}", height_path.display());

    let overlay_path = args.output_dir.join("lakes.png");
    export::export_lake_overlay(&island.height_map, &island.water_bodies, water_level, &overlay_path)?;
    println!("Saved {}", overlay_path.display());

    let json_path = args.output_dir.join("lakes.json");
    export::export_water_bodies_json(&island.water_bodies, &json_path)?;
    println!("Saved {}", json_path.display());

    if args.export_falloff {
        let falloff_path = args.output_dir.join("falloff.png");
        export::export_falloff_map(&island.falloff_preview()?, &falloff_path)?;
        println!("Saved {}", falloff_path.display());
    }

    Ok(())
}

/// Config file (or defaults with a random seed) with the flags applied on top.
fn load_config(args: &Args) -> Result<IslandConfig> {
    let mut config = match &args.config {
        Some(path) => IslandConfig::from_json_file(path)?,
        None => {
            let mut config = IslandConfig::default();
            if let Some(height_map) = config.height_map.as_mut() {
                height_map.noise.seed = rand::random();
            }
            config
        }
    };
    apply_overrides(&mut config, args);
    Ok(config)
}

/// Command-line flags win over the config file.
fn apply_overrides(config: &mut IslandConfig, args: &Args) {
    if let Some(height_map) = config.height_map.as_mut() {
        if let Some(seed) = args.seed {
            height_map.noise.seed = seed;
        }
        if let Some(metric) = args.falloff_metric {
            height_map.falloff_metric = metric;
        }
        if args.no_falloff {
            height_map.use_falloff = false;
        }
    }
    if let (Some(mesh), Some(index)) = (config.mesh.as_mut(), args.chunk_size_index) {
        mesh.chunk_size_index = index;
    }
    if let Some(level) = args.water_level {
        config.lakes.water_level = level;
    }
    if let Some(size) = args.min_lake_size {
        config.lakes.min_lake_size = size;
    }
    if let Some(stride) = args.stride {
        config.lakes.grid_resolution = stride;
    }
    if args.no_lakes {
        config.lakes.generate = false;
    }
    config.validate_values();
}
