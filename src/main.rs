//! penning-cell: build Penning-trap electrode geometry and post-process
//! the solved potential into comet-formation estimates

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use penning_cell::explode::DEFAULT_EXPAND_FRACTION;
use penning_cell::sampler::{default_theta_samples, AVERAGED_AREA_LENGTH, DEFAULT_MAP_SAMPLES};
use penning_cell::segment::MIN_COMPONENT_SIZE;
use penning_cell::solver::FieldStage;
use penning_cell::traps::{
    build_geometry, grid_for, CubicTrap, CylindricalTrap, HyperbolicTrap, TrapVariant,
};
use penning_cell::{
    comet_formation_time, find_components, frequency_spread, CloudRegion, FieldSampler, Harmonics,
    IonParams, PotentialArray, Solver,
};

#[derive(Parser, Debug)]
#[command(name = "penning-cell")]
#[command(about = "Penning trap electrode geometry and field post-processing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Voxelize the trap electrodes and write the unrefined array
    Generate {
        #[command(flatten)]
        trap: TrapArgs,
        /// Base path for solver files, written as `{base}.pa#`
        #[arg(short, long)]
        base: PathBuf,
    },
    /// Run the solver's field relaxation on `{base}.pa#`
    Refine {
        #[command(flatten)]
        solver: SolverArgs,
        #[arg(short, long)]
        base: PathBuf,
    },
    /// Rescale the refined field to the trap's electrode voltages
    Adjust {
        #[command(flatten)]
        trap: TrapArgs,
        #[command(flatten)]
        solver: SolverArgs,
        #[arg(short, long)]
        base: PathBuf,
    },
    /// Fit harmonics to `{base}.pa0` and estimate the comet formation time
    Analyze {
        #[command(flatten)]
        trap: TrapArgs,
        #[arg(short, long)]
        base: PathBuf,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Radially separate the electrode assembly for inspection renders
    Explode {
        #[arg(short, long)]
        base: PathBuf,
        /// Radial shift as a fraction of each electrode's center distance
        #[arg(long, default_value_t = DEFAULT_EXPAND_FRACTION)]
        fraction: f64,
    },
    /// Full pipeline: generate, refine, adjust, analyze
    Run {
        #[command(flatten)]
        trap: TrapArgs,
        #[command(flatten)]
        solver: SolverArgs,
        #[arg(short, long)]
        base: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TrapKind {
    Cubic,
    Cylindrical,
    Hyperbolic,
}

#[derive(Args, Debug)]
struct TrapArgs {
    /// Trap variant
    #[arg(long, value_enum, default_value_t = TrapKind::Cubic)]
    trap: TrapKind,

    /// Cube half-size / ring radius `a`, meters
    #[arg(long, default_value_t = 20e-3)]
    size: f64,

    /// Endcap distance `z0`, meters (cylindrical and hyperbolic traps)
    #[arg(long, default_value_t = 20e-3)]
    z0: f64,

    /// Grid points across the trap half-width
    #[arg(long, default_value_t = 120)]
    pts: usize,
}

impl TrapArgs {
    fn build(&self) -> Box<dyn TrapVariant> {
        match self.trap {
            TrapKind::Cubic => Box::new(CubicTrap::new(self.size)),
            TrapKind::Cylindrical => Box::new(CylindricalTrap::new(self.z0, self.size)),
            TrapKind::Hyperbolic => Box::new(HyperbolicTrap::new(self.z0, self.size)),
        }
    }
}

#[derive(Args, Debug)]
struct SolverArgs {
    /// Path to the external field solver executable
    #[arg(long)]
    solver: PathBuf,
}

#[derive(Debug, Serialize)]
struct Report {
    generated_at: String,
    trap: String,
    characteristic_d: f64,
    harmonics: Harmonics,
    ion: IonParams,
    cloud: CloudRegion,
    frequency_min: f64,
    frequency_max: f64,
    comet_formation_time: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate { trap, base } => {
            generate(trap.build().as_ref(), trap.pts, &base)?;
        }
        Command::Refine { solver, base } => {
            let solver = Solver::new(&solver.solver)?;
            let out = solver.refine(&base).context("solver refine failed")?;
            eprintln!("Refined field: {}", out.display());
        }
        Command::Adjust { trap, solver, base } => {
            adjust(trap.build().as_ref(), &Solver::new(&solver.solver)?, &base)?;
        }
        Command::Analyze { trap, base, output } => {
            let report = analyze(trap.build().as_ref(), trap.pts, &base)?;
            emit_report(&report, output.as_deref())?;
        }
        Command::Explode { base, fraction } => {
            explode_assembly(&base, fraction)?;
        }
        Command::Run {
            trap,
            solver,
            base,
            output,
        } => {
            let variant = trap.build();
            let solver = Solver::new(&solver.solver)?;
            generate(variant.as_ref(), trap.pts, &base)?;
            solver.refine(&base).context("solver refine failed")?;
            adjust(variant.as_ref(), &solver, &base)?;
            let report = analyze(variant.as_ref(), trap.pts, &base)?;
            emit_report(&report, output.as_deref())?;
        }
    }

    Ok(())
}

fn generate(trap: &dyn TrapVariant, pts: usize, base: &Path) -> Result<()> {
    let grid = grid_for(trap, pts)?;
    let pa = build_geometry(trap, &grid);
    let path = FieldStage::Unrefined.path_for(base);
    pa.save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!(
        "Wrote {} ({} electrode voxels)",
        path.display(),
        pa.electrode_count()
    );
    Ok(())
}

fn adjust(trap: &dyn TrapVariant, solver: &Solver, base: &Path) -> Result<()> {
    let assignments = trap
        .channels()
        .adjust_assignments(|ch| trap.adjust_voltage(ch));
    let out = solver
        .fast_adjust(base, &assignments)
        .context("solver fast-adjust failed")?;
    eprintln!("Adjusted field: {} ({})", out.display(), assignments);
    Ok(())
}

fn analyze(trap: &dyn TrapVariant, pts: usize, base: &Path) -> Result<Report> {
    let path = FieldStage::Adjusted.path_for(base);
    let pa = PotentialArray::load(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let grid = grid_for(trap, pts)?;
    let d = grid.characteristic_d();

    let sampler = FieldSampler::new(&pa);
    let map = sampler.averaged_map(
        DEFAULT_MAP_SAMPLES,
        DEFAULT_MAP_SAMPLES,
        AVERAGED_AREA_LENGTH,
        AVERAGED_AREA_LENGTH,
        default_theta_samples(pts),
    )?;
    let harmonics = Harmonics::fit(&map, d)?;

    let ion = IonParams::default();
    let cloud = CloudRegion::default();
    let spread = frequency_spread(&harmonics, &ion, &cloud, d)?;

    Ok(Report {
        generated_at: Utc::now().to_rfc3339(),
        trap: trap.name().to_string(),
        characteristic_d: d,
        harmonics,
        ion,
        cloud,
        frequency_min: spread.min,
        frequency_max: spread.max,
        comet_formation_time: comet_formation_time(&spread),
    })
}

fn emit_report(report: &Report, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("Report: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn explode_assembly(base: &Path, fraction: f64) -> Result<()> {
    let path = FieldStage::Unrefined.path_for(base);
    let pa = PotentialArray::load(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let components = find_components(&pa, MIN_COMPONENT_SIZE, true);
    let exploded = penning_cell::explode(&pa, &components, |_| Some(fraction));

    let mut name = base
        .file_name()
        .unwrap_or_default()
        .to_os_string();
    name.push("_expanded");
    let out = FieldStage::Unrefined.path_for(&base.with_file_name(name));
    exploded
        .save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    eprintln!(
        "Wrote {} ({} electrode components)",
        out.display(),
        components.len()
    );
    Ok(())
}
