use rust_policy_nn::params_io::{load_params, save_params};
use rust_policy_nn::{Init, Matrix, Params, policy_network};

fn main() -> rust_policy_nn::Result<()> {
    let path = std::env::temp_dir().join("policy_params_demo.txt");

    let net = policy_network(&[64, 32], Init::HeUniform, 0)?;
    save_params(&net, &path)?;
    println!("saved {} parameters to {}", net.num_params(), path.display());

    // Same architecture, different initial weights.
    let mut restored = policy_network(&[64, 32], Init::HeUniform, 1)?;
    load_params(&mut restored, &path)?;

    let x = Matrix::from_rows(&[vec![0.5, 0.8, 0.5], vec![0.5, 0.2, 0.5]])?;
    let a = net.predict(&x)?;
    let b = restored.predict(&x)?;
    println!("predictions match: {}", a == b);

    std::fs::remove_file(&path)?;
    Ok(())
}
