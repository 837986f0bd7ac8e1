//! Colours the Australia map and prints every solution.

use necto::{
    problems::map_colouring::MapColouring, Pruning, SolverConfig, VariableOrdering,
};

fn main() {
    tracing_subscriber::fmt::init();
    println!("Solving the map colouring problem...");

    let map = MapColouring::australia();
    let config = SolverConfig {
        pruning: Pruning::ForwardChecking,
        ordering: VariableOrdering::Static,
        max_solutions: usize::MAX,
        use_gac_alldiff: false,
        cancel: None,
    };
    let mut problem = map.problem(config).expect("valid problem");
    let outcome = problem.solve().expect("solve");

    println!("{} colourings found", outcome.solutions.len());
    for (index, solution) in outcome.solutions.iter().enumerate() {
        println!("--- solution {} ---", index + 1);
        for (region, colour) in map.decode(solution) {
            println!("{region}: {colour}");
        }
    }
}
