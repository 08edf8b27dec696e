use anyhow::Result;
use ndarray::array;
use st_oracles::BraninHoo;
use st_pools::sampling::seeded_rng;
use st_pools::{MultitaskPool, OraclePool, Pool};
use st_types::OraclePoolConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("SafeTL multitask pool example");

    // Two source tasks with random Branin-Hoo constants, one standard target
    let mut rng = seeded_rng(7);
    let mut pools: Vec<Box<dyn Pool>> = Vec::new();
    for seed in 0..2 {
        let oracle = BraninHoo::random_task(0.01, &mut rng).normalized();
        let config = OraclePoolConfig::default().with_seed(seed).with_candidates(500);
        pools.push(Box::new(OraclePool::from_oracle(oracle, config)?));
    }
    let target = BraninHoo::new(0.01).normalized();
    pools.push(Box::new(OraclePool::from_oracle(
        target,
        OraclePoolConfig::default().with_seed(42),
    )?));

    let mut pool = MultitaskPool::new(pools)?.with_target_box(0.0, 0.3);
    println!(
        "Created pool with {} tasks, target task is {}",
        pool.output_dimension(),
        pool.task_index()
    );

    for task in 0..pool.output_dimension() - 1 {
        pool.set_task_mode(task)?;
        let data = pool.get_random_data(20, true)?;
        println!(
            "Task {}: {} source points, input columns {}",
            task,
            data.len(),
            data.x.ncols()
        );
    }

    let initial = pool.get_initial_target_data(5)?;
    println!("Target task: {} initial points in the safe box", initial.len());

    let result = pool.query(array![0.5, 0.5, 2.0].view(), true)?;
    println!("Query at (0.5, 0.5): {:.4}", result.value);
    println!("Target maximum: {:.4}", pool.get_max()?);

    Ok(())
}
