use std::time::Instant;

use rust_policy_nn::{Init, ParallelAgent, PolicyAgent, Sequential, State, policy_network};

fn main() -> rust_policy_nn::Result<()> {
    let net = policy_network(&[64, 32], Init::HeUniform, 0)?;
    let model = Sequential::from_layers(net.into_layers());

    let states: Vec<State> = (0..10_000)
        .map(|i| {
            let t = i as f32 / 10_000.0;
            State::new(t, (t * 13.0).fract(), 0.5)
        })
        .collect();

    let inline = PolicyAgent::new(model.clone());
    let start = Instant::now();
    let expected = states
        .iter()
        .map(|s| inline.act(s))
        .collect::<rust_policy_nn::Result<Vec<_>>>()?;
    println!("inline:   {:?}", start.elapsed());

    let mut pooled = ParallelAgent::new(model, 4)?;
    let start = Instant::now();
    let actions = pooled.act_batch(&states)?;
    println!("4 workers: {:?}", start.elapsed());
    println!("identical actions: {}", actions == expected);

    pooled.shutdown();
    Ok(())
}
