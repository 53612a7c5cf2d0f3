use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use surface_runoff::flow::{
    build_inflow_graph_with, octant_indicator_masked, BuildParams, BuildStrategy, DomainMask,
    FlowDirectionRaster, InflowGraph, OCTANT_TABLE,
};
use surface_runoff::logging::init_logging;
use surface_runoff::raster_io;
use surface_runoff::FlowResult;

#[derive(Parser, Debug)]
#[command(name = "surface_runoff")]
#[command(about = "Build the D8 inflow graph used by the surface runoff solver")]
struct Args {
    /// JSON flow-direction raster (rows, cols, codes, optional no_data and mask)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Rows of the synthetic slope used when no input is given
    #[arg(short, long, default_value = "10")]
    rows: usize,

    /// Columns of the synthetic slope
    #[arg(short, long, default_value = "1")]
    cols: usize,

    /// D8 code shared by every cell of the synthetic slope (4 = south)
    #[arg(long, default_value = "4")]
    code: i32,

    /// Exclude no-data cells from the computational domain
    #[arg(long)]
    mask_no_data: bool,

    /// Build strategy
    #[arg(long, value_enum, default_value_t = BuildStrategy::Auto)]
    strategy: BuildStrategy,

    /// Write the inflow graph as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the inflows of one cell, as ROW,COL
    #[arg(long, value_parser = parse_cell)]
    cell: Option<(usize, usize)>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_cell(s: &str) -> Result<(usize, usize), String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{}'", s))?;
    let row = row.trim().parse().map_err(|e| format!("bad row '{}': {}", row, e))?;
    let col = col.trim().parse().map_err(|e| format!("bad col '{}': {}", col, e))?;
    Ok((row, col))
}

fn load(args: &Args) -> FlowResult<(FlowDirectionRaster, Option<DomainMask>)> {
    match &args.input {
        Some(path) => {
            info!("Loading flow directions from {}", path.display());
            let loaded = raster_io::load_raster(path)?;
            Ok((loaded.raster, loaded.mask))
        }
        None => {
            info!("No input given, using a {}x{} slope with code {}", args.rows, args.cols, args.code);
            Ok((FlowDirectionRaster::uniform(args.rows, args.cols, args.code)?, None))
        }
    }
}

fn print_cell(graph: &InflowGraph, raster: &FlowDirectionRaster, mask: &DomainMask, row: usize, col: usize) -> FlowResult<()> {
    println!("\n=== Cell ({}, {}) ===", row, col);
    match graph.inflows(row, col) {
        Some(sources) => {
            println!("Inflow mask: {}", graph.inflow_mask(row, col).unwrap_or(0));
            println!("Sources ({}): {:?}", sources.len(), sources);
            println!("Upstream cells: {:?}", graph.upstream_cells(row, col));
        }
        None => println!("Not part of the computational domain"),
    }

    let indicator = octant_indicator_masked(raster, mask, row, col)?;
    let slots: Vec<String> = OCTANT_TABLE
        .iter()
        .zip(indicator.as_f64())
        .map(|(e, v)| format!("{}={}", e.position, v))
        .collect();
    println!("Indicator: [{}]", slots.join(", "));
    Ok(())
}

fn run(args: &Args) -> FlowResult<()> {
    let (raster, file_mask) = load(args)?;
    println!("Raster size: {}x{}", raster.rows(), raster.cols());

    let mask = match file_mask {
        Some(mask) => mask,
        None if args.mask_no_data => DomainMask::from_no_data(&raster),
        None => DomainMask::full(raster.rows(), raster.cols()),
    };

    let params = BuildParams {
        strategy: args.strategy,
        ..Default::default()
    };

    let start = Instant::now();
    let graph = build_inflow_graph_with(&raster, Some(&mask), &params)?;
    let elapsed = start.elapsed();

    let summary = graph.summary();
    println!("Inflow graph built in {:?} ({})", elapsed, params.strategy.description());
    println!("  Domain cells:     {}/{}", summary.domain_cells, summary.cells);
    println!("  Inflow links:     {}", summary.edges);
    println!("  Without inflow:   {}", summary.without_inflow);
    println!("  Max in-degree:    {}", summary.max_inflow);

    if let Some((row, col)) = args.cell {
        print_cell(&graph, &raster, &mask, row, col)?;
    }

    if let Some(path) = &args.output {
        raster_io::write_graph(&graph, path)?;
        println!("Graph written to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
