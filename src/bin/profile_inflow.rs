//! Profiling tool comparing serial and parallel inflow graph builds

use std::time::Instant;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use surface_runoff::flow::{
    build_inflow_graph_with, BuildParams, DomainMask, FlowDirectionRaster, DECODE_PRIORITY, NO_DATA,
};

fn random_raster(rows: usize, cols: usize, rng: &mut ChaCha8Rng) -> FlowDirectionRaster {
    let codes = (0..rows * cols)
        .map(|_| {
            if rng.gen_bool(0.05) {
                NO_DATA
            } else {
                DECODE_PRIORITY[rng.gen_range(0..8)] as i32
            }
        })
        .collect();
    match FlowDirectionRaster::from_codes(rows, cols, codes, NO_DATA) {
        Ok(raster) => raster,
        Err(e) => panic!("generated raster is invalid: {}", e),
    }
}

fn main() {
    let rows = 2048;
    let cols = 2048;
    let seed = 1337u64;

    println!("=== Inflow Graph Profiling ===");
    println!("Raster size: {}x{} ({} cells)", rows, cols, rows * cols);
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let start = Instant::now();
    let raster = random_raster(rows, cols, &mut rng);
    let mask = DomainMask::from_no_data(&raster);
    let gen_time = start.elapsed();
    println!("Raster generation: {:?}", gen_time);

    let start = Instant::now();
    let serial = match build_inflow_graph_with(&raster, Some(&mask), &BuildParams::serial()) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Serial build failed: {}", e);
            return;
        }
    };
    let serial_time = start.elapsed();
    println!("Serial build:      {:?}", serial_time);

    let start = Instant::now();
    let parallel = match build_inflow_graph_with(&raster, Some(&mask), &BuildParams::parallel()) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Parallel build failed: {}", e);
            return;
        }
    };
    let parallel_time = start.elapsed();
    println!("Parallel build:    {:?}", parallel_time);

    println!("\n=== Summary ===");
    println!("{}", serial.summary());
    println!("Speedup: {:.2}x", serial_time.as_secs_f64() / parallel_time.as_secs_f64().max(1e-9));
    if serial == parallel {
        println!("  ✓ Serial and parallel graphs are identical");
    } else {
        println!("  ⚠ Serial and parallel graphs differ");
    }
}
