//! Example: Generate a tectonic planet
//!
//! Runs the full pipeline and prints a summary of the result.

use tectonic_planet::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("Tectonic Planet Generation");
    println!("==========================\n");

    let config = PlanetConfigBuilder::new()
        .seed(42)
        .preset(PlanetPreset::Tiny)
        .continent_count(10)?
        .deformation(4, 200)?
        .build()?;

    println!("Seed: {}", config.seed);
    println!(
        "Preset: {} (radius {}, subdivisions {:?})",
        config.preset.name(),
        config.radius(),
        config.subdivisions()
    );

    println!("\nGenerating...");
    let planet = TectonicPlanet::generate(config)?;
    let report = planet.report();

    println!("  Base points:    {}", report.base_points);
    println!("  Triangles:      {}", report.triangles);
    println!("  Voronoi cells:  {}", report.cells);
    println!(
        "  Deformation:    {} of {} attempts flipped",
        report.deformation.flipped, report.deformation.attempted
    );
    println!("  Boundary edges: {}", report.boundary_edges);
    if report.skipped_sites > 0 {
        println!("  Skipped sites:  {}", report.skipped_sites);
    }

    println!("\nContinents:");
    for continent in planet.continents() {
        println!(
            "  #{:<2} {:?} crust, {} cells, base height {:+.2}",
            continent.id,
            continent.crust,
            continent.cells.len(),
            continent.base_height
        );
    }

    println!("\nBiome distribution:");
    let mut counts = std::collections::HashMap::new();
    for cell in planet.cells() {
        if let Some(biome) = cell.biome {
            *counts.entry(biome).or_insert(0usize) += 1;
        }
    }
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by_key(|(biome, _)| format!("{:?}", biome));
    for (biome, count) in sorted {
        let pct = (*count as f32 / planet.cell_count() as f32) * 100.0;
        println!("  {:?}: {} ({:.1}%)", biome, count, pct);
    }

    #[cfg(feature = "spatial-index")]
    {
        let position = Vec3::new(planet.radius(), 0.0, 0.0);
        let cell_id = planet.find_cell_at(position);
        let cell = planet.get_cell(cell_id).unwrap();
        println!(
            "\nCell at {:?}: #{} on continent {:?}, {:?}",
            position, cell_id, cell.continent, cell.biome
        );
    }

    Ok(())
}
