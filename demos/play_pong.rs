use rust_policy_nn::{PongEnv, heuristic_action};

// Plays the labeling heuristic directly, as a baseline for trained policies.
fn main() {
    let mut env = PongEnv::with_seed(7);
    for episode in 0..3 {
        let mut state = env.reset();
        let mut total = 0.0;
        let mut steps = 0;
        for _ in 0..2_000 {
            let step = env.step(heuristic_action(&state));
            total += step.reward;
            state = step.state;
            steps += 1;
            if step.done {
                break;
            }
        }
        println!("episode {episode}: reward {total} in {steps} steps");
    }
}
