use quadcopter_task::{QuadcopterTaskConfig, Result, SimulatorConfig, Task};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => QuadcopterTaskConfig::from_yaml_file(path)?,
        None => QuadcopterTaskConfig {
            simulator: SimulatorConfig {
                trajectory: vec!["x".into(), "y".into(), "z - u / 1000".into()],
                lower_bounds: Some([-150.0, -150.0, 0.0]),
                upper_bounds: Some([150.0, 150.0, 300.0]),
                ..SimulatorConfig::default()
            },
            ..QuadcopterTaskConfig::default()
        },
    };

    info!("Initializing quadcopter task...");
    let mut task = Task::from_config(&config)?;

    let observation = task.reset()?;
    info!(state_size = observation.len(), "initial observation: {:?}", observation.as_slice());

    let mut total_reward = 0.0;
    let mut steps = 0;
    loop {
        let transition = task.step(&[450.0; 4])?;
        total_reward += transition.reward;
        steps += 1;
        if transition.done {
            break;
        }
    }

    let information = task.get_information();
    info!(
        steps,
        total_reward,
        vdist = information.metrics.vdist,
        proximity = information.proximity,
        "episode finished"
    );
    Ok(())
}
