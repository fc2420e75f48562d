use model_store::ModelStore;
use std::path::Path;
use std::time::Instant;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info,model_store=debug")
        .init();

    let model_dir = Path::new("data/news");

    println!("Loading model artifacts...\n");

    let start = Instant::now();
    let store = ModelStore::load(model_dir).expect("Failed to load model store");
    let elapsed = start.elapsed();

    let (users, articles, interactions) = store.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Articles: {}", articles);
    println!("Interactions: {} ({:?})", interactions, store.matrix_kind());
    println!("Embedding dimension: {}", store.embedding_dim());
    println!(
        "\nPerformance: {:.0} interactions/second",
        interactions as f64 / elapsed.as_secs_f64()
    );
}
