use grid_pathfinding_visualizer::{
    LogNotifier, MemoryStore, PlaybackConfig, PlaybackOutcome, ProgressEvent, Renderer,
    RunSummary, Speed, Visualizer, VisualizerConfig,
};
use rand::prelude::*;

// In this example a random 12x12 maze is generated and the search is replayed in the
// terminal, one line per event, followed by the grid with
// - # marking walls
// - S and E marking the start and the end
// - + marking explored cells and o marking the shortest path

struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Explored(cell) => println!("explored {}", cell.position),
            ProgressEvent::Path(cell) => println!("path     {}", cell.position),
        }
    }

    fn finished(&mut self, summary: &RunSummary) {
        println!(
            "Explored {} cells, path length {}",
            summary.nodes_explored, summary.path_length
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = VisualizerConfig {
        grid_size: 12,
        speed: Speed::Fast,
        playback: PlaybackConfig {
            fast_delay_ms: 5,
            ..PlaybackConfig::default()
        },
        ..VisualizerConfig::default()
    };
    let mut visualizer = Visualizer::new(config, MemoryStore::new(), LogNotifier).unwrap();
    visualizer.generate_maze(&mut StdRng::seed_from_u64(42));
    println!("{}", visualizer.grid());

    match visualizer.find_path(&mut TerminalRenderer).await {
        Ok(PlaybackOutcome::Completed(_)) => println!("{}", visualizer.grid()),
        Ok(PlaybackOutcome::Stopped { .. }) => println!("Replay stopped"),
        Err(err) => println!("Search failed: {err}"),
    }
}
